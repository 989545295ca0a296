//! fOS Dropzone
//!
//! File intake for drag-and-drop regions and file dialogs: accept and size
//! validation, batch classification, drag state tracking and the native or
//! hidden-input file dialog.
//!
//! Everything runs on one thread. Async work (reading dropped files,
//! awaiting the picker) is spawned on a `smol::LocalExecutor` owned by the
//! host.

pub mod accept;
pub mod size;
pub mod classify;
pub mod extract;
pub mod drag;
pub mod dialog;
pub mod state;
pub mod props;
mod config;
mod dropzone;
mod error;

pub use accept::{AcceptSpec, PickerType, MOZ_FILE_MIME};
pub use classify::{classify, validator, ClassificationResult, CustomValidator, FileRejection, Policy, Validation};
pub use config::{
    AcceptedCallback, DropCallback, DropzoneConfig, DropzoneOptions, ErrorCallback, EventCallback,
    NotifyCallback, RejectedCallback, DEFAULT_CANCEL_GRACE_MS,
};
pub use dialog::{
    BackendKind, CancelDetection, DialogBackend, DialogOutcome, DialogState, FileDialogController,
    FilePicker, HiddenInputBackend, NativePickerBackend, PickerOptions,
};
pub use drag::{DragPhase, DragTracker};
pub use dropzone::{Dropzone, DropzoneState};
pub use error::{DropzoneError, ErrorCode, FileError, PickerError, Result};
pub use extract::{has_files, DefaultExtractor, DropSource, FileExtractor, FileHandle};
pub use props::{compose_handlers, Detach, Handler, InputProps, PropsArgs, RootProps};
pub use state::{Observable, Subscription};

pub use fos_dom::{FileEntry, FileList};
