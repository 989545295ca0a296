//! Accept specification and type matching
//!
//! An `AcceptSpec` maps MIME types (or `type/*` families) to the file
//! extensions allowed alongside them. For matching, keys and extensions are
//! flattened into one token list, the same list rendered into the `accept`
//! attribute of the file input.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use fos_dom::FileEntry;

/// Firefox reports this placeholder type for every file during drag preview
pub const MOZ_FILE_MIME: &str = "application/x-moz-file";

/// Description used for every native picker type group
const PICKER_DESCRIPTION: &str = "Files";

/// Accepted MIME types and extensions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, Vec<String>>", into = "IndexMap<String, Vec<String>>")]
pub struct AcceptSpec {
    entries: IndexMap<String, Vec<String>>,
}

impl AcceptSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a MIME type with its extensions.
    ///
    /// Extensions must start with `.`; others are dropped with a warning.
    pub fn with(mut self, mime: &str, extensions: &[&str]) -> Self {
        self.insert(mime, extensions.iter().map(|e| e.to_string()).collect());
        self
    }

    pub fn insert(&mut self, mime: &str, extensions: Vec<String>) {
        let mime = mime.trim();
        if !is_mime_type(mime) && !mime.starts_with('.') {
            tracing::warn!("accept key {mime:?} is not a MIME type");
        }
        let extensions = extensions
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| {
                let ok = is_extension(e);
                if !ok {
                    tracing::warn!("skipping accept extension {e:?} for {mime:?}: must start with '.'");
                }
                ok
            })
            .collect();
        self.entries.insert(mime.to_string(), extensions);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Keys followed by their extensions, in insertion order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|(mime, exts)| std::iter::once(mime.as_str()).chain(exts.iter().map(String::as_str)))
    }

    /// Value of the file input's `accept` attribute
    pub fn to_accept_attr(&self) -> String {
        self.tokens().collect::<Vec<_>>().join(",")
    }

    /// Native picker type groups, one per key
    pub fn picker_types(&self) -> Vec<PickerType> {
        self.entries
            .iter()
            .map(|(mime, exts)| PickerType {
                description: PICKER_DESCRIPTION.to_string(),
                accept: IndexMap::from([(mime.clone(), exts.clone())]),
            })
            .collect()
    }

    /// Whether `file` satisfies any accept token
    pub fn accepts(&self, file: &FileEntry) -> bool {
        if self.is_empty() {
            return true;
        }
        let name = file.name.to_lowercase();
        let mime = file.mime_type.to_lowercase();
        let base = base_type(&mime);

        self.tokens().any(|token| {
            let token = token.trim().to_lowercase();
            if token.is_empty() {
                false
            } else if token.starts_with('.') {
                name.ends_with(&token)
            } else if token.ends_with("/*") {
                base == base_type(&token)
            } else {
                mime == token
            }
        })
    }
}

impl From<IndexMap<String, Vec<String>>> for AcceptSpec {
    fn from(map: IndexMap<String, Vec<String>>) -> Self {
        let mut spec = Self::new();
        for (mime, exts) in map {
            spec.insert(&mime, exts);
        }
        spec
    }
}

impl From<AcceptSpec> for IndexMap<String, Vec<String>> {
    fn from(spec: AcceptSpec) -> Self {
        spec.entries
    }
}

/// Type group passed to the native picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerType {
    pub description: String,
    pub accept: IndexMap<String, Vec<String>>,
}

/// Check a file's type against an optional spec.
///
/// No spec accepts everything, as does the drag-preview placeholder type.
pub fn matches(file: &FileEntry, accept: Option<&AcceptSpec>) -> bool {
    file.mime_type == MOZ_FILE_MIME || accept.is_none_or(|spec| spec.accepts(file))
}

fn base_type(mime: &str) -> &str {
    mime.split_once('/').map_or(mime, |(base, _)| base)
}

fn is_mime_type(s: &str) -> bool {
    matches!(s.split_once('/'), Some((a, b)) if !a.is_empty() && !b.is_empty())
}

fn is_extension(s: &str) -> bool {
    s.len() > 1 && s.starts_with('.')
}
