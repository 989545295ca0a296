//! File classification
//!
//! Splits a batch of candidate files into accepted files and rejections.
//! Each file is checked on its own first (type, size, custom validator);
//! the count limit is then applied to the files that passed, all or
//! nothing.

use std::fmt;
use std::rc::Rc;

use fos_dom::FileEntry;

use crate::{accept, size, AcceptSpec, FileError};

/// Result of a caller-supplied validator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Validation {
    #[default]
    Valid,
    Invalid(Vec<FileError>),
}

impl Validation {
    fn into_errors(self) -> Vec<FileError> {
        match self {
            Validation::Valid => Vec::new(),
            Validation::Invalid(errors) => errors,
        }
    }
}

impl From<Option<FileError>> for Validation {
    fn from(error: Option<FileError>) -> Self {
        error.map_or(Validation::Valid, Validation::from)
    }
}

impl From<FileError> for Validation {
    fn from(error: FileError) -> Self {
        Validation::Invalid(vec![error])
    }
}

impl From<Vec<FileError>> for Validation {
    fn from(errors: Vec<FileError>) -> Self {
        if errors.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid(errors)
        }
    }
}

/// Caller-supplied per-file check
pub type CustomValidator = Rc<dyn Fn(&FileEntry) -> Validation>;

/// Wrap a closure returning anything convertible to `Validation`
pub fn validator<F, V>(f: F) -> CustomValidator
where
    F: Fn(&FileEntry) -> V + 'static,
    V: Into<Validation>,
{
    Rc::new(move |file| f(file).into())
}

/// Rules a batch is classified against
#[derive(Clone)]
pub struct Policy {
    pub accept: Option<AcceptSpec>,
    pub min_size: u64,
    /// `None` is unbounded
    pub max_size: Option<u64>,
    pub multiple: bool,
    /// 0 is unlimited; only consulted when `multiple` is set
    pub max_files: usize,
    pub validator: Option<CustomValidator>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            accept: None,
            min_size: 0,
            max_size: None,
            multiple: true,
            max_files: 0,
            validator: None,
        }
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("accept", &self.accept)
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("multiple", &self.multiple)
            .field("max_files", &self.max_files)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl Policy {
    /// Whether `count` files exceed the count limit
    pub fn exceeds_count(&self, count: usize) -> bool {
        if self.multiple {
            self.max_files >= 1 && count > self.max_files
        } else {
            count > 1
        }
    }

    /// Per-file errors in type, size, custom order
    fn file_errors(&self, file: &FileEntry, accept_attr: &str) -> Vec<FileError> {
        let mut errors = Vec::new();
        if !accept::matches(file, self.accept.as_ref()) {
            errors.push(FileError::invalid_type(accept_attr));
        }
        if let Some(err) = size::check(file, self.min_size, self.max_size) {
            errors.push(err);
        }
        if let Some(validate) = &self.validator {
            errors.extend(validate(file).into_errors());
        }
        errors
    }

    /// Speculative check used for drag previews: true when the batch would be
    /// accepted as a whole
    pub fn all_accepted(&self, files: &[FileEntry]) -> bool {
        if self.exceeds_count(files.len()) {
            return false;
        }
        let attr = self.accept_attr();
        files.iter().all(|file| self.file_errors(file, &attr).is_empty())
    }

    fn accept_attr(&self) -> String {
        self.accept
            .as_ref()
            .map(AcceptSpec::to_accept_attr)
            .unwrap_or_default()
    }
}

/// A rejected file with every reason that applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejection {
    pub file: FileEntry,
    pub errors: Vec<FileError>,
}

/// Accepted files and rejections of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    pub accepted: Vec<FileEntry>,
    pub rejected: Vec<FileRejection>,
}

/// Classify `files` against `policy`.
///
/// Both sequences keep input order. When the count limit is exceeded every
/// provisionally accepted file is rejected with a single `TooManyFiles`
/// error, in its input position; files already rejected never get it.
pub fn classify(files: &[FileEntry], policy: &Policy) -> ClassificationResult {
    let attr = policy.accept_attr();
    let verdicts: Vec<Vec<FileError>> = files
        .iter()
        .map(|file| policy.file_errors(file, &attr))
        .collect();

    let provisional = verdicts.iter().filter(|errors| errors.is_empty()).count();
    let demote = policy.exceeds_count(provisional);
    if demote {
        tracing::debug!(
            "rejecting {provisional} files over the count limit (multiple: {}, max_files: {})",
            policy.multiple,
            policy.max_files
        );
    }

    let mut result = ClassificationResult::default();
    for (file, errors) in files.iter().zip(verdicts) {
        if !errors.is_empty() {
            result.rejected.push(FileRejection {
                file: file.clone(),
                errors,
            });
        } else if demote {
            result.rejected.push(FileRejection {
                file: file.clone(),
                errors: vec![FileError::too_many_files()],
            });
        } else {
            result.accepted.push(file.clone());
        }
    }
    result
}
