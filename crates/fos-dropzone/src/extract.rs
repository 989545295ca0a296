//! Event-to-file extraction
//!
//! Normalises the three ways files reach a dropzone (drag events, file
//! input `change`, native picker handles) into one ordered list. Every
//! produced entry is labelled with a `path` taken from its name.

use std::rc::Rc;

use async_trait::async_trait;
use fos_dom::{DataTransfer, DataTransferKind, DomEvent, EventPayload, EventType, FileEntry};

use crate::accept::MOZ_FILE_MIME;
use crate::Result;

/// Transfer type advertised when files are dragged
const FILES_TYPE: &str = "Files";

/// A file reference returned by the native picker
#[async_trait(?Send)]
pub trait FileHandle {
    fn name(&self) -> &str;

    /// Resolve the handle to file metadata
    async fn get_file(&self) -> Result<FileEntry>;
}

/// Where candidate files come from
#[derive(Clone)]
pub enum DropSource {
    /// Drag event or file input `change`
    Event(DomEvent),
    /// Native picker selection
    Handles(Vec<Rc<dyn FileHandle>>),
}

impl std::fmt::Debug for DropSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropSource::Event(event) => f.debug_tuple("Event").field(&event.event_type()).finish(),
            DropSource::Handles(handles) => f.debug_tuple("Handles").field(&handles.len()).finish(),
        }
    }
}

/// Turns a source into candidate files
#[async_trait(?Send)]
pub trait FileExtractor {
    async fn extract(&self, source: &DropSource) -> Result<Vec<FileEntry>>;
}

/// Standard extraction rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExtractor;

#[async_trait(?Send)]
impl FileExtractor for DefaultExtractor {
    async fn extract(&self, source: &DropSource) -> Result<Vec<FileEntry>> {
        match source {
            DropSource::Handles(handles) => {
                let mut files = Vec::with_capacity(handles.len());
                for handle in handles {
                    let file = handle.get_file().await?;
                    files.push(file.with_path(handle.name()));
                }
                Ok(files)
            }
            DropSource::Event(event) => Ok(files_from_event(event)),
        }
    }
}

fn files_from_event(event: &DomEvent) -> Vec<FileEntry> {
    match event.payload() {
        EventPayload::Drag(Some(dt)) => {
            files_from_transfer(dt, event.event_type() == EventType::Drop)
        }
        EventPayload::Files(list) => list.iter().cloned().map(labelled).collect(),
        _ => Vec::new(),
    }
}

/// Files of a transfer. Before the drop the platform withholds file
/// objects, so `File` items are described by their type alone.
fn files_from_transfer(dt: &DataTransfer, dropped: bool) -> Vec<FileEntry> {
    let Some(items) = &dt.items else {
        return dt.files.iter().cloned().map(labelled).collect();
    };
    items
        .iter()
        .filter(|item| item.kind == DataTransferKind::File)
        .filter_map(|item| match item.get_as_file() {
            Some(file) => Some(labelled(file)),
            None if !dropped => Some(FileEntry::without_size("", &item.mime_type)),
            None => None,
        })
        .collect()
}

fn labelled(file: FileEntry) -> FileEntry {
    let path = file.name.clone();
    file.with_path(path)
}

/// Whether an event carries files at all
pub fn has_files(event: &DomEvent) -> bool {
    match event.payload() {
        EventPayload::Drag(Some(dt)) => dt
            .types
            .iter()
            .any(|t| t == FILES_TYPE || t == MOZ_FILE_MIME),
        EventPayload::Files(_) => true,
        _ => false,
    }
}
