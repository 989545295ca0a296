//! File dialog controller
//!
//! Two backends can prompt the user for files:
//!
//! - the native picker, an async platform surface that reports user
//!   aborts explicitly;
//! - a hidden `<input type="file">`, clicked programmatically. Its files
//!   arrive later through the input's `change` event, and cancellation is
//!   only inferred: when the window regains focus while the dialog is open
//!   and the input is still empty after a grace delay. That inference is
//!   approximate; a slow `change` event can be mistaken for a cancel and
//!   a very fast refocus can miss one.
//!
//! The active backend is chosen once. A native picker that fails with a
//! security error is replaced by the hidden input for good.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use fos_dom::{Document, NodeId};
use smol::future::BoxedLocal;
use smol::Timer;

use crate::accept::PickerType;
use crate::extract::FileHandle;
use crate::state::Observable;
use crate::{DropzoneError, PickerError, Result};

/// Dialog lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Idle,
    Opening,
    Active,
    /// Files were chosen and are being classified
    Resolving,
}

/// Options passed to the native picker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerOptions {
    pub multiple: bool,
    /// One group per accept key; `None` allows any file
    pub types: Option<Vec<PickerType>>,
}

/// Platform file picker (`showOpenFilePicker`)
#[async_trait(?Send)]
pub trait FilePicker {
    async fn show_open_file_picker(
        &self,
        options: &PickerOptions,
    ) -> std::result::Result<Vec<Rc<dyn FileHandle>>, PickerError>;
}

pub type PickerFuture = BoxedLocal<std::result::Result<Vec<Rc<dyn FileHandle>>, PickerError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    NativePicker,
    HiddenInput,
}

/// How a backend learns the user gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelDetection {
    /// The picker reports an abort
    PickerAbort,
    /// Window focus followed by an empty selection after a grace delay
    FocusTimer,
}

/// What a backend did when asked to open
pub enum Launch {
    /// Await the picker's answer
    Picker(PickerFuture),
    /// The input was clicked; files arrive with its `change` event
    AwaitingInput,
}

/// File selection surface
pub trait DialogBackend {
    fn kind(&self) -> BackendKind;

    fn cancel_detection(&self) -> CancelDetection;

    /// Show the selection UI
    fn launch(&self, options: &PickerOptions) -> Result<Launch>;

    /// Whether a selection is currently held (hidden input only)
    fn has_selection(&self) -> bool {
        false
    }
}

/// Backend over the platform picker
pub struct NativePickerBackend {
    picker: Rc<dyn FilePicker>,
}

impl NativePickerBackend {
    pub fn new(picker: Rc<dyn FilePicker>) -> Self {
        Self { picker }
    }
}

impl DialogBackend for NativePickerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::NativePicker
    }

    fn cancel_detection(&self) -> CancelDetection {
        CancelDetection::PickerAbort
    }

    fn launch(&self, options: &PickerOptions) -> Result<Launch> {
        let picker = Rc::clone(&self.picker);
        let options = options.clone();
        Ok(Launch::Picker(Box::pin(async move {
            picker.show_open_file_picker(&options).await
        })))
    }
}

/// Backend over a hidden file input
pub struct HiddenInputBackend {
    document: Rc<Document>,
    input: NodeId,
}

impl HiddenInputBackend {
    pub fn new(document: Rc<Document>, input: NodeId) -> Self {
        Self { document, input }
    }
}

impl DialogBackend for HiddenInputBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::HiddenInput
    }

    fn cancel_detection(&self) -> CancelDetection {
        CancelDetection::FocusTimer
    }

    fn launch(&self, _options: &PickerOptions) -> Result<Launch> {
        // Clear first so picking the same file again still fires `change`
        self.document.clear_input_files(self.input)?;
        self.document.click(self.input);
        Ok(Launch::AwaitingInput)
    }

    fn has_selection(&self) -> bool {
        self.document
            .input_files(self.input)
            .is_ok_and(|files| !files.is_empty())
    }
}

/// Outcome of awaiting the picker
pub enum DialogOutcome {
    Selected(Vec<Rc<dyn FileHandle>>),
    Cancelled,
    /// Fell back to the hidden input, which is now waiting
    AwaitingInput,
}

/// Tracks dialog state and the active backend for one dropzone
pub struct FileDialogController {
    backend: RefCell<Option<Rc<dyn DialogBackend>>>,
    fallback: RefCell<Option<Rc<dyn DialogBackend>>>,
    state: Observable<DialogState>,
    explicit_open: Cell<bool>,
}

impl Default for FileDialogController {
    fn default() -> Self {
        Self::new()
    }
}

impl FileDialogController {
    pub fn new() -> Self {
        Self {
            backend: RefCell::new(None),
            fallback: RefCell::new(None),
            state: Observable::new(DialogState::Idle),
            explicit_open: Cell::new(false),
        }
    }

    /// Install the primary backend
    pub fn set_backend(&self, backend: Rc<dyn DialogBackend>) {
        tracing::debug!("file dialog backend: {:?}", backend.kind());
        *self.backend.borrow_mut() = Some(backend);
    }

    /// Install the hidden-input backend used after a native failure. It
    /// becomes the primary backend when there is no native one.
    pub fn set_fallback(&self, backend: Rc<dyn DialogBackend>) {
        let mut primary = self.backend.borrow_mut();
        if primary.as_ref().is_none_or(|b| b.kind() == BackendKind::HiddenInput) {
            tracing::debug!("file dialog backend: {:?}", backend.kind());
            *primary = Some(backend);
        } else {
            *self.fallback.borrow_mut() = Some(backend);
        }
    }

    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.borrow().as_ref().map(|b| b.kind())
    }

    fn current(&self) -> Option<Rc<dyn DialogBackend>> {
        self.backend.borrow().clone()
    }

    /// Replace the native backend with the fallback for good
    fn downgrade(&self) -> Option<Rc<dyn DialogBackend>> {
        let fallback = self.fallback.borrow_mut().take()?;
        tracing::debug!("native picker unavailable, switching to {:?}", fallback.kind());
        *self.backend.borrow_mut() = Some(Rc::clone(&fallback));
        Some(fallback)
    }

    pub fn state(&self) -> DialogState {
        self.state.get()
    }

    pub fn observe(&self) -> &Observable<DialogState> {
        &self.state
    }

    fn set_state(&self, state: DialogState) {
        tracing::trace!("file dialog {:?} -> {:?}", self.state.get(), state);
        self.state.set(state);
    }

    /// Open the dialog. `on_open` runs once the UI is about to show.
    ///
    /// Returns the picker future to await when the native backend is used.
    /// Without any backend this does nothing.
    pub fn open(&self, options: &PickerOptions, on_open: impl FnOnce()) -> Result<Option<PickerFuture>> {
        let Some(backend) = self.current() else {
            tracing::debug!("no file dialog backend, ignoring open");
            return Ok(None);
        };

        self.set_state(DialogState::Opening);
        on_open();
        match backend.launch(options) {
            Ok(Launch::Picker(pending)) => {
                self.set_state(DialogState::Active);
                Ok(Some(pending))
            }
            Ok(Launch::AwaitingInput) => {
                self.set_state(DialogState::Active);
                Ok(None)
            }
            Err(err) => {
                self.set_state(DialogState::Idle);
                Err(err)
            }
        }
    }

    /// Await a picker opened by `open`, downgrading and retrying through the
    /// hidden input on security errors.
    pub async fn resolve(&self, mut pending: PickerFuture, options: &PickerOptions) -> Result<DialogOutcome> {
        loop {
            match pending.await {
                Ok(handles) => {
                    self.set_state(DialogState::Resolving);
                    return Ok(DialogOutcome::Selected(handles));
                }
                Err(PickerError::Abort) => {
                    self.set_state(DialogState::Idle);
                    return Ok(DialogOutcome::Cancelled);
                }
                Err(PickerError::Security(reason)) => {
                    tracing::debug!("native picker refused: {reason}");
                    let Some(fallback) = self.downgrade() else {
                        self.set_state(DialogState::Idle);
                        return Err(DropzoneError::NoFileInput);
                    };
                    match fallback.launch(options) {
                        Ok(Launch::AwaitingInput) => return Ok(DialogOutcome::AwaitingInput),
                        Ok(Launch::Picker(next)) => pending = next,
                        Err(err) => {
                            self.set_state(DialogState::Idle);
                            return Err(err);
                        }
                    }
                }
                Err(err) => {
                    self.set_state(DialogState::Idle);
                    return Err(err.into());
                }
            }
        }
    }

    /// Input `change` arrived; returns true if it answered an open dialog
    pub fn begin_resolve(&self) -> bool {
        if self.state() == DialogState::Active {
            self.set_state(DialogState::Resolving);
            true
        } else {
            false
        }
    }

    /// Classification done (or abandoned)
    pub fn finish(&self) {
        self.set_state(DialogState::Idle);
    }

    /// Window focus came back. For the hidden input, wait `grace` and report
    /// a cancel if the dialog is still open with nothing selected.
    pub async fn detect_focus_cancel(&self, grace: Duration) -> bool {
        let waiting = |this: &Self| {
            this.state() == DialogState::Active
                && this
                    .current()
                    .is_some_and(|b| b.cancel_detection() == CancelDetection::FocusTimer)
        };
        if !waiting(self) {
            return false;
        }
        Timer::after(grace).await;
        if !waiting(self) || self.current().is_some_and(|b| b.has_selection()) {
            return false;
        }
        self.set_state(DialogState::Idle);
        true
    }

    /// Mark an explicit `open()` for the current turn
    pub fn mark_explicit_open(&self) {
        self.explicit_open.set(true);
    }

    pub fn clear_explicit_open(&self) {
        self.explicit_open.set(false);
    }

    /// An explicit `open()` already ran this turn
    pub fn explicit_open_pending(&self) -> bool {
        self.explicit_open.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::FileEntry;

    struct Handle(FileEntry);

    #[async_trait(?Send)]
    impl FileHandle for Handle {
        fn name(&self) -> &str {
            &self.0.name
        }

        async fn get_file(&self) -> Result<FileEntry> {
            Ok(self.0.clone())
        }
    }

    struct ScriptedPicker(RefCell<Vec<std::result::Result<Vec<Rc<dyn FileHandle>>, PickerError>>>);

    #[async_trait(?Send)]
    impl FilePicker for ScriptedPicker {
        async fn show_open_file_picker(
            &self,
            _options: &PickerOptions,
        ) -> std::result::Result<Vec<Rc<dyn FileHandle>>, PickerError> {
            self.0.borrow_mut().remove(0)
        }
    }

    fn native(answers: Vec<std::result::Result<Vec<Rc<dyn FileHandle>>, PickerError>>) -> Rc<dyn DialogBackend> {
        Rc::new(NativePickerBackend::new(Rc::new(ScriptedPicker(RefCell::new(answers)))))
    }

    fn open_and_resolve(ctrl: &FileDialogController) -> Result<DialogOutcome> {
        let options = PickerOptions::default();
        let pending = ctrl.open(&options, || {})?.expect("native picker pending");
        smol::block_on(ctrl.resolve(pending, &options))
    }

    #[test]
    fn test_native_selection() {
        let ctrl = FileDialogController::new();
        let handle: Rc<dyn FileHandle> = Rc::new(Handle(FileEntry::new("a.txt", 1, "text/plain")));
        ctrl.set_backend(native(vec![Ok(vec![handle])]));

        let outcome = open_and_resolve(&ctrl).unwrap();
        assert!(matches!(outcome, DialogOutcome::Selected(ref h) if h.len() == 1));
        assert_eq!(ctrl.state(), DialogState::Resolving);
        ctrl.finish();
        assert_eq!(ctrl.state(), DialogState::Idle);
    }

    #[test]
    fn test_native_abort_is_cancel() {
        let ctrl = FileDialogController::new();
        ctrl.set_backend(native(vec![Err(PickerError::Abort)]));

        assert!(matches!(open_and_resolve(&ctrl).unwrap(), DialogOutcome::Cancelled));
        assert_eq!(ctrl.state(), DialogState::Idle);
    }

    #[test]
    fn test_security_error_without_input() {
        let ctrl = FileDialogController::new();
        ctrl.set_backend(native(vec![Err(PickerError::Security("cross-origin".into()))]));

        assert!(matches!(open_and_resolve(&ctrl), Err(DropzoneError::NoFileInput)));
        assert_eq!(ctrl.state(), DialogState::Idle);
    }

    #[test]
    fn test_security_error_downgrades_for_good() {
        let doc = Rc::new(Document::new());
        let input = doc.create_file_input(NodeId::ROOT).unwrap();
        let ctrl = FileDialogController::new();
        ctrl.set_backend(native(vec![Err(PickerError::Security("denied".into()))]));
        ctrl.set_fallback(Rc::new(HiddenInputBackend::new(Rc::clone(&doc), input)));

        assert!(matches!(open_and_resolve(&ctrl).unwrap(), DialogOutcome::AwaitingInput));
        assert_eq!(ctrl.backend_kind(), Some(BackendKind::HiddenInput));
        assert_eq!(ctrl.state(), DialogState::Active);

        ctrl.finish();
        let next = ctrl.open(&PickerOptions::default(), || {}).unwrap();
        assert!(next.is_none());
    }

    #[test]
    fn test_other_picker_error_surfaces() {
        let ctrl = FileDialogController::new();
        ctrl.set_backend(native(vec![Err(PickerError::Other("boom".into()))]));

        let err = open_and_resolve(&ctrl).err().unwrap();
        assert_eq!(err, DropzoneError::Picker(PickerError::Other("boom".into())));
        assert_eq!(ctrl.state(), DialogState::Idle);
    }

    #[test]
    fn test_no_backend_is_noop() {
        let ctrl = FileDialogController::new();
        let opened = Cell::new(false);
        assert!(ctrl.open(&PickerOptions::default(), || opened.set(true)).unwrap().is_none());
        assert!(!opened.get());
        assert_eq!(ctrl.state(), DialogState::Idle);
    }

    #[test]
    fn test_focus_cancel_with_empty_input() {
        let doc = Rc::new(Document::new());
        let input = doc.create_file_input(NodeId::ROOT).unwrap();
        let ctrl = FileDialogController::new();
        ctrl.set_fallback(Rc::new(HiddenInputBackend::new(Rc::clone(&doc), input)));

        ctrl.open(&PickerOptions::default(), || {}).unwrap();
        assert_eq!(ctrl.state(), DialogState::Active);
        assert!(smol::block_on(ctrl.detect_focus_cancel(Duration::from_millis(5))));
        assert_eq!(ctrl.state(), DialogState::Idle);
    }

    #[test]
    fn test_focus_with_selection_is_not_cancel() {
        let doc = Rc::new(Document::new());
        let input = doc.create_file_input(NodeId::ROOT).unwrap();
        let ctrl = FileDialogController::new();
        ctrl.set_fallback(Rc::new(HiddenInputBackend::new(Rc::clone(&doc), input)));

        ctrl.open(&PickerOptions::default(), || {}).unwrap();
        let files = [FileEntry::new("a.txt", 1, "text/plain")].into_iter().collect();
        doc.select_files(input, files).unwrap();
        assert!(!smol::block_on(ctrl.detect_focus_cancel(Duration::from_millis(5))));
        assert_eq!(ctrl.state(), DialogState::Active);
    }
}
