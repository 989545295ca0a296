//! Data Transfer
//!
//! Files and typed items carried by drag events and file inputs.

use std::cell::Cell;

use crate::{DomError, Result};

/// Drop effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropEffect {
    #[default]
    None,
    Copy,
    Link,
    Move,
}

/// A file offered by the platform.
///
/// Only metadata is held here; contents are never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    /// MIME type as reported by the platform (may be empty or wrong)
    pub mime_type: String,
    /// Size in bytes, absent for entries that are not real files
    pub size: Option<u64>,
    pub last_modified: u64,
    /// Informational label assigned during extraction
    pub path: Option<String>,
}

impl FileEntry {
    pub fn new(name: &str, size: u64, mime_type: &str) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: Some(size),
            last_modified: 0,
            path: None,
        }
    }

    /// Entry without a known size
    pub fn without_size(name: &str, mime_type: &str) -> Self {
        Self {
            size: None,
            ..Self::new(name, 0, mime_type)
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// File list from an input or a transfer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    pub files: Vec<FileEntry>,
}

impl FileList {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.files.len() }
    pub fn is_empty(&self) -> bool { self.files.is_empty() }
    pub fn get(&self, index: usize) -> Option<&FileEntry> { self.files.get(index) }
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> { self.files.iter() }
    pub fn clear(&mut self) { self.files.clear(); }
}

impl FromIterator<FileEntry> for FileList {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        Self { files: iter.into_iter().collect() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTransferKind {
    String,
    File,
}

/// Single transfer item
#[derive(Debug, Clone)]
pub struct DataTransferItem {
    pub kind: DataTransferKind,
    pub mime_type: String,
    file: Option<FileEntry>,
}

impl DataTransferItem {
    pub fn file(file: FileEntry) -> Self {
        Self {
            kind: DataTransferKind::File,
            mime_type: file.mime_type.clone(),
            file: Some(file),
        }
    }

    /// File item whose contents the platform has not released yet, as
    /// during `dragenter`/`dragover`
    pub fn withheld(mime_type: &str) -> Self {
        Self {
            kind: DataTransferKind::File,
            mime_type: mime_type.to_string(),
            file: None,
        }
    }

    pub fn string(mime_type: &str) -> Self {
        Self {
            kind: DataTransferKind::String,
            mime_type: mime_type.to_string(),
            file: None,
        }
    }

    /// The file behind a `File` item; `None` while the platform withholds it
    pub fn get_as_file(&self) -> Option<FileEntry> {
        self.file.clone()
    }
}

/// Data transfer for drag operations
#[derive(Debug, Clone, Default)]
pub struct DataTransfer {
    /// Advertised formats (`"Files"` when files are dragged)
    pub types: Vec<String>,
    /// Item list; `None` on platforms without `DataTransferItemList`
    pub items: Option<Vec<DataTransferItem>>,
    /// Flat file list
    pub files: FileList,
    drop_effect: Cell<DropEffect>,
    /// Some platforms refuse `dropEffect` writes during protected phases
    read_only: bool,
}

impl DataTransfer {
    /// Create empty data transfer
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfer carrying files, as produced by an OS file drag
    pub fn with_files(files: impl IntoIterator<Item = FileEntry>) -> Self {
        let files: FileList = files.into_iter().collect();
        Self {
            types: vec!["Files".to_string()],
            items: Some(files.iter().cloned().map(DataTransferItem::file).collect()),
            files,
            ..Self::default()
        }
    }

    /// Drop the item list, leaving only `files`
    pub fn without_items(mut self) -> Self {
        self.items = None;
        self
    }

    /// Reject later `dropEffect` writes
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Add an advertised format
    pub fn with_type(mut self, format: &str) -> Self {
        self.types.push(format.to_string());
        self
    }

    pub fn drop_effect(&self) -> DropEffect {
        self.drop_effect.get()
    }

    pub fn set_drop_effect(&self, effect: DropEffect) -> Result<()> {
        if self.read_only {
            return Err(DomError::ReadOnly("dropEffect"));
        }
        self.drop_effect.set(effect);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_files_populates_items() {
        let dt = DataTransfer::with_files([
            FileEntry::new("a.txt", 1, "text/plain"),
            FileEntry::new("b.png", 2, "image/png"),
        ]);
        assert_eq!(dt.types, vec!["Files"]);
        assert_eq!(dt.items.as_ref().map(Vec::len), Some(2));
        assert_eq!(dt.files.len(), 2);
    }

    #[test]
    fn test_read_only_drop_effect() {
        let dt = DataTransfer::new().read_only();
        assert_eq!(dt.set_drop_effect(DropEffect::Copy), Err(DomError::ReadOnly("dropEffect")));
        assert_eq!(dt.drop_effect(), DropEffect::None);

        let dt = DataTransfer::new();
        dt.set_drop_effect(DropEffect::Copy).unwrap();
        assert_eq!(dt.drop_effect(), DropEffect::Copy);
    }
}
