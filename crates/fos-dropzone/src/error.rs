//! Validation and operational errors
//!
//! Validation outcomes (`FileError`) are data handed back to the caller
//! inside a `FileRejection`. `DropzoneError` is the operational failure
//! channel: extraction and picker failures that abandon an interaction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rejection reason code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    FileInvalidType,
    FileTooLarge,
    FileTooSmall,
    TooManyFiles,
    /// Code produced by a caller-supplied validator
    Custom(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::FileInvalidType => "file-invalid-type",
            ErrorCode::FileTooLarge => "file-too-large",
            ErrorCode::FileTooSmall => "file-too-small",
            ErrorCode::TooManyFiles => "too-many-files",
            ErrorCode::Custom(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "file-invalid-type" => ErrorCode::FileInvalidType,
            "file-too-large" => ErrorCode::FileTooLarge,
            "file-too-small" => ErrorCode::FileTooSmall,
            "too-many-files" => ErrorCode::TooManyFiles,
            other => ErrorCode::Custom(other.to_string()),
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        ErrorCode::from(code.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

/// A single reason a file was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub code: ErrorCode,
    pub message: String,
}

impl FileError {
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_type(accept_attr: &str) -> Self {
        Self::new(ErrorCode::FileInvalidType, format!("File type must be {accept_attr}"))
    }

    pub fn too_large(max_size: u64) -> Self {
        Self::new(ErrorCode::FileTooLarge, format!("File is larger than {max_size} bytes"))
    }

    pub fn too_small(min_size: u64) -> Self {
        Self::new(ErrorCode::FileTooSmall, format!("File is smaller than {min_size} bytes"))
    }

    pub fn too_many_files() -> Self {
        Self::new(ErrorCode::TooManyFiles, "Too many files")
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Failure reported by a native file picker
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PickerError {
    /// The user dismissed the picker
    #[error("The user aborted a request")]
    Abort,

    /// The picker may not be used from this context (cross-origin frame,
    /// missing permission)
    #[error("Security error: {0}")]
    Security(String),

    #[error("Picker failed: {0}")]
    Other(String),
}

/// Operational error surfaced through `on_error`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropzoneError {
    #[error("Failed to read files from event: {0}")]
    Extraction(String),

    #[error(transparent)]
    Picker(#[from] PickerError),

    #[error(
        "Cannot open the file picker because the File System Access API is not supported and no <input> was provided."
    )]
    NoFileInput,

    #[error(transparent)]
    Dom(#[from] fos_dom::DomError),
}

pub type Result<T> = std::result::Result<T, DropzoneError>;
