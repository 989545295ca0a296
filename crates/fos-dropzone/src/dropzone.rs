//! Dropzone
//!
//! Ties the pieces together for one interactive region: drag tracking,
//! classification, the file dialog and the observable state a host renders
//! from. Handlers run synchronously during DOM dispatch; anything that has
//! to extract files is spawned on the host's local executor as one task, so
//! a drop's callbacks fire only after its files are fully classified.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use fos_dom::{Document, DomEvent, DropEffect, EventTarget, EventType, FileEntry, NodeId};
use smol::LocalExecutor;

use crate::classify::{classify, FileRejection};
use crate::config::DropzoneOptions;
use crate::dialog::{
    DialogOutcome, DialogState, FileDialogController, HiddenInputBackend, NativePickerBackend,
};
use crate::drag::{DragPhase, DragTracker};
use crate::extract::{has_files, DefaultExtractor, DropSource, FileExtractor};
use crate::props::{compose_handlers, Detach, Handler, InputProps, PropsArgs, RootProps};
use crate::state::{Observable, Subscription};
use crate::{DropzoneError, Result};

const KEY_SPACE: u32 = 32;
const KEY_ENTER: u32 = 13;

/// Observable dropzone state
#[derive(Debug, Clone, Default)]
pub struct DropzoneState {
    pub focused: Observable<bool>,
    pub drag_active: Observable<bool>,
    pub drag_accept: Observable<bool>,
    pub drag_reject: Observable<bool>,
    pub accepted_files: Observable<Vec<FileEntry>>,
    pub file_rejections: Observable<Vec<FileRejection>>,
    pub file_dialog_active: Observable<bool>,
}

impl DropzoneState {
    fn publish(&self, phase: DragPhase) {
        self.drag_active.set(phase.is_active());
        self.drag_accept.set(phase.accept());
        self.drag_reject.set(phase.reject());
    }
}

/// Which handler group a core handler belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Always,
    Keyboard,
    Drag,
}

struct Inner {
    options: RefCell<Rc<DropzoneOptions>>,
    executor: Rc<LocalExecutor<'static>>,
    document: Rc<Document>,
    root: Cell<Option<NodeId>>,
    input: Cell<Option<NodeId>>,
    drag: RefCell<DragTracker>,
    dialog: FileDialogController,
    state: DropzoneState,
    _dialog_sub: Subscription,
}

/// A drag-and-drop region with an attached file dialog
#[derive(Clone)]
pub struct Dropzone {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for Dropzone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dropzone")
            .field("root", &self.inner.root.get())
            .field("input", &self.inner.input.get())
            .field("drag", &self.inner.drag.borrow())
            .field("dialog", &self.inner.dialog.state())
            .finish_non_exhaustive()
    }
}

impl Dropzone {
    /// Create a dropzone on `document`, running async work on `executor`.
    ///
    /// The native picker is used when `use_fs_access_api` is set, a picker
    /// was supplied and the document is a secure context.
    pub fn new(
        document: Rc<Document>,
        executor: Rc<LocalExecutor<'static>>,
        options: DropzoneOptions,
    ) -> Self {
        let dialog = FileDialogController::new();
        if options.config.use_fs_access_api && document.is_secure_context() {
            if let Some(picker) = &options.file_picker {
                dialog.set_backend(Rc::new(NativePickerBackend::new(Rc::clone(picker))));
            }
        }

        let state = DropzoneState::default();
        let active = state.file_dialog_active.clone();
        let dialog_sub = dialog
            .observe()
            .subscribe(move |s| active.set(*s != DialogState::Idle));

        Self {
            inner: Rc::new(Inner {
                options: RefCell::new(Rc::new(options)),
                executor,
                document,
                root: Cell::new(None),
                input: Cell::new(None),
                drag: RefCell::new(DragTracker::new()),
                dialog,
                state,
                _dialog_sub: dialog_sub,
            }),
        }
    }

    /// Replace options; handlers read the new values on their next run
    pub fn set_options(&self, options: DropzoneOptions) {
        *self.inner.options.borrow_mut() = Rc::new(options);
    }

    pub fn options(&self) -> Rc<DropzoneOptions> {
        self.inner.options()
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.inner.document
    }

    pub fn set_root(&self, root: NodeId) {
        self.inner.root.set(Some(root));
    }

    /// Register the file input used as the dialog fallback
    pub fn set_input(&self, input: NodeId) {
        self.inner.input.set(Some(input));
        self.inner.dialog.set_fallback(Rc::new(HiddenInputBackend::new(
            Rc::clone(&self.inner.document),
            input,
        )));
    }

    pub fn root(&self) -> Option<NodeId> {
        self.inner.root.get()
    }

    pub fn input(&self) -> Option<NodeId> {
        self.inner.input.get()
    }

    pub fn state(&self) -> &DropzoneState {
        &self.inner.state
    }

    /// Focused, and not disabled
    pub fn focused(&self) -> bool {
        self.inner.state.focused.get() && !self.options().config.disabled
    }

    pub fn drag_active(&self) -> bool {
        self.inner.state.drag_active.get()
    }

    pub fn drag_accept(&self) -> bool {
        self.inner.state.drag_accept.get()
    }

    pub fn drag_reject(&self) -> bool {
        self.inner.state.drag_reject.get()
    }

    pub fn accepted_files(&self) -> Vec<FileEntry> {
        self.inner.state.accepted_files.get()
    }

    pub fn file_rejections(&self) -> Vec<FileRejection> {
        self.inner.state.file_rejections.get()
    }

    pub fn file_dialog_active(&self) -> bool {
        self.inner.state.file_dialog_active.get()
    }

    pub fn dialog(&self) -> &FileDialogController {
        &self.inner.dialog
    }

    /// Open the file dialog. Does nothing while disabled; a root click in
    /// the same turn will not open it a second time.
    pub fn open(&self) {
        let inner = &self.inner;
        if inner.options().config.disabled {
            return;
        }
        inner.dialog.mark_explicit_open();
        inner.open_file_dialog();

        let this = Rc::clone(inner);
        inner.spawn(async move {
            smol::future::yield_now().await;
            this.dialog.clear_explicit_open();
        });
    }

    /// Props for the root element
    pub fn root_props(&self, mut args: PropsArgs) -> RootProps {
        let options = self.options();
        let config = &options.config;
        let tab_index = (!config.disabled && !config.no_keyboard).then_some(0);
        let mut props = RootProps::new(args.role.take(), tab_index);

        let core: [(EventType, Gate, fn(&Rc<Inner>, &DomEvent)); 8] = [
            (EventType::KeyDown, Gate::Keyboard, Inner::on_key_down),
            (EventType::Focus, Gate::Keyboard, Inner::on_focus),
            (EventType::Blur, Gate::Keyboard, Inner::on_blur),
            (EventType::Click, Gate::Always, Inner::on_click),
            (EventType::DragEnter, Gate::Drag, Inner::on_drag_enter),
            (EventType::DragOver, Gate::Drag, Inner::on_drag_over),
            (EventType::DragLeave, Gate::Drag, Inner::on_drag_leave),
            (EventType::Drop, Gate::Drag, Inner::on_drop),
        ];
        for (event_type, gate, f) in core {
            let caller = args.take_handler(event_type);
            if !self.inner.gate_open(gate) {
                continue;
            }
            let handler = compose_handlers(caller, self.core_handler(gate, f));
            props.handlers.push((event_type, handler));
        }
        props.handlers.append(&mut args.handlers);
        props.attrs = args.attrs;
        props
    }

    /// Props for the hidden file input
    pub fn input_props(&self, mut args: PropsArgs) -> InputProps {
        let options = self.options();
        let config = &options.config;
        let mut props = InputProps::new(config.accept_attr(), config.multiple);

        let core: [(EventType, fn(&Rc<Inner>, &DomEvent)); 2] = [
            (EventType::Change, Inner::on_drop),
            (EventType::Click, Inner::on_input_click),
        ];
        for (event_type, f) in core {
            let caller = args.take_handler(event_type);
            if !self.inner.gate_open(Gate::Always) {
                continue;
            }
            let handler = compose_handlers(caller, self.core_handler(Gate::Always, f));
            props.handlers.push((event_type, handler));
        }
        props.handlers.append(&mut args.handlers);
        props.attrs = args.attrs;
        props
    }

    fn core_handler(&self, gate: Gate, f: fn(&Rc<Inner>, &DomEvent)) -> Handler {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        Rc::new(move |event: &DomEvent| {
            if let Some(inner) = weak.upgrade() {
                if inner.gate_open(gate) {
                    f(&inner, event);
                }
            }
        })
    }

    /// Install window and document listeners: window focus for dialog
    /// cancel detection, and drop prevention outside the root when
    /// `prevent_drop_on_document` is set.
    pub fn attach(&self) -> Detach {
        let document = &self.inner.document;
        let mut guard = Detach::new(document);

        let weak = Rc::downgrade(&self.inner);
        guard.push(
            EventTarget::Window,
            EventType::Focus,
            Rc::new(move |_: &DomEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_window_focus();
                }
            }),
        );

        let weak = Rc::downgrade(&self.inner);
        guard.push(
            EventTarget::Document,
            EventType::DragOver,
            Rc::new(move |event: &DomEvent| {
                if let Some(inner) = weak.upgrade() {
                    if inner.options().config.prevent_drop_on_document {
                        event.prevent_default();
                    }
                }
            }),
        );
        let weak = Rc::downgrade(&self.inner);
        guard.push(
            EventTarget::Document,
            EventType::Drop,
            Rc::new(move |event: &DomEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_document_drop(event);
                }
            }),
        );
        guard
    }

    /// Bind default props to `root` (and `input`), attach window and
    /// document listeners, and apply `auto_focus`. Dropping the guard
    /// removes every listener installed here.
    pub fn mount(&self, root: NodeId, input: Option<NodeId>) -> Result<Detach> {
        let document = Rc::clone(&self.inner.document);
        self.set_root(root);
        let mut guard = self.root_props(PropsArgs::new()).bind(&document, root)?;
        if let Some(input) = input {
            self.set_input(input);
            guard.merge(self.input_props(PropsArgs::new()).bind(&document, input)?);
        }
        guard.merge(self.attach());

        let options = self.options();
        let config = &options.config;
        if config.auto_focus && !config.disabled {
            document.focus(root)?;
        }
        tracing::debug!("dropzone mounted on {root:?} ({} listeners)", guard.len());
        Ok(guard)
    }
}

impl Inner {
    fn options(&self) -> Rc<DropzoneOptions> {
        Rc::clone(&self.options.borrow())
    }

    fn gate_open(&self, gate: Gate) -> bool {
        let options = self.options();
        let config = &options.config;
        !config.disabled
            && match gate {
                Gate::Always => true,
                Gate::Keyboard => !config.no_keyboard,
                Gate::Drag => !config.no_drag,
            }
    }

    fn spawn(&self, future: impl std::future::Future<Output = ()> + 'static) {
        self.executor.spawn(future).detach();
    }

    fn report(&self, err: DropzoneError) {
        match &self.options().on_error {
            Some(on_error) => on_error(&err),
            None => tracing::error!("dropzone: {err}"),
        }
    }

    async fn extract(&self, source: &DropSource) -> Result<Vec<FileEntry>> {
        let extractor: Rc<dyn FileExtractor> = match &self.options().extractor {
            Some(extractor) => Rc::clone(extractor),
            None => Rc::new(DefaultExtractor),
        };
        extractor.extract(source).await
    }

    /// Keep drag events away from enclosing dropzones when configured
    fn isolate(&self, event: &DomEvent) {
        if self.options().config.no_drag_events_bubbling {
            event.stop_propagation();
        }
    }

    /// Someone else stopped the event while it was being extracted
    fn is_stale(&self, event: &DomEvent) -> bool {
        event.is_propagation_stopped() && !self.options().config.no_drag_events_bubbling
    }

    fn on_drag_enter(self: &Rc<Self>, event: &DomEvent) {
        event.prevent_default();
        self.isolate(event);

        let Some(target) = event.target_node() else {
            return;
        };
        self.drag.borrow_mut().enter(target);
        if !has_files(event) {
            return;
        }

        let this = Rc::clone(self);
        let event = event.clone();
        self.spawn(async move {
            let files = match this.extract(&DropSource::Event(event.clone())).await {
                Ok(files) => files,
                Err(err) => return this.report(err),
            };
            if this.is_stale(&event) {
                return;
            }

            let options = this.options();
            let all_accepted = options.policy().all_accepted(&files);
            let phase = DragPhase::preview(files.len(), all_accepted);
            if !this.drag.borrow_mut().hover(phase) {
                return;
            }
            tracing::debug!("drag preview: {} files, {phase:?}", files.len());
            this.state.publish(phase);
            if let Some(on_drag_enter) = &options.on_drag_enter {
                on_drag_enter(&event);
            }
        });
    }

    fn on_drag_over(self: &Rc<Self>, event: &DomEvent) {
        event.prevent_default();
        self.isolate(event);

        if !has_files(event) {
            return;
        }
        if let Some(dt) = event.data_transfer() {
            if let Err(err) = dt.set_drop_effect(DropEffect::Copy) {
                tracing::trace!("ignoring drop effect failure: {err}");
            }
        }
        if let Some(on_drag_over) = &self.options().on_drag_over {
            on_drag_over(event);
        }
    }

    fn on_drag_leave(self: &Rc<Self>, event: &DomEvent) {
        event.prevent_default();
        self.isolate(event);

        let Some(target) = event.target_node() else {
            return;
        };
        let root = self.root.get();
        let left = self.drag.borrow_mut().leave(target, |node| {
            root.is_some_and(|root| self.document.contains(root, node))
        });
        if !left {
            return;
        }

        self.state.publish(DragPhase::Inactive);
        if has_files(event) {
            if let Some(on_drag_leave) = &self.options().on_drag_leave {
                on_drag_leave(event);
            }
        }
    }

    /// `drop` on the root, or `change` on the file input
    fn on_drop(self: &Rc<Self>, event: &DomEvent) {
        event.prevent_default();
        self.isolate(event);

        self.drag.borrow_mut().reset();
        let from_dialog = event.event_type() == EventType::Change && self.dialog.begin_resolve();

        if has_files(event) {
            let this = Rc::clone(self);
            let event = event.clone();
            self.spawn(async move {
                match this.extract(&DropSource::Event(event.clone())).await {
                    Ok(files) if !this.is_stale(&event) => this.set_files(files, Some(&event)),
                    Ok(_) => {}
                    Err(err) => this.report(err),
                }
                if from_dialog {
                    this.dialog.finish();
                }
            });
        } else if from_dialog {
            self.dialog.finish();
        }

        self.state.publish(DragPhase::Inactive);
    }

    /// Classify, publish and notify
    fn set_files(&self, files: Vec<FileEntry>, event: Option<&DomEvent>) {
        let options = self.options();
        let result = classify(&files, &options.policy());
        tracing::debug!(
            "classified {} files: {} accepted, {} rejected",
            files.len(),
            result.accepted.len(),
            result.rejected.len()
        );

        self.state.accepted_files.set(result.accepted.clone());
        self.state.file_rejections.set(result.rejected.clone());

        if let Some(on_drop) = &options.on_drop {
            on_drop(&result.accepted, &result.rejected, event);
        }
        if !result.rejected.is_empty() {
            if let Some(on_drop_rejected) = &options.on_drop_rejected {
                on_drop_rejected(&result.rejected, event);
            }
        }
        if !result.accepted.is_empty() {
            if let Some(on_drop_accepted) = &options.on_drop_accepted {
                on_drop_accepted(&result.accepted, event);
            }
        }
    }

    fn open_file_dialog(self: &Rc<Self>) {
        let options = self.options();
        let picker_options = options.config.picker_options();
        let on_open = || {
            if let Some(on_open) = &options.on_file_dialog_open {
                on_open();
            }
        };

        let pending = match self.dialog.open(&picker_options, on_open) {
            Ok(Some(pending)) => pending,
            Ok(None) => return,
            Err(err) => return self.report(err),
        };

        let this = Rc::clone(self);
        self.spawn(async move {
            match this.dialog.resolve(pending, &picker_options).await {
                Ok(DialogOutcome::Selected(handles)) => {
                    match this.extract(&DropSource::Handles(handles)).await {
                        Ok(files) => this.set_files(files, None),
                        Err(err) => this.report(err),
                    }
                    this.dialog.finish();
                }
                Ok(DialogOutcome::Cancelled) => this.notify_cancel(),
                Ok(DialogOutcome::AwaitingInput) => {}
                Err(err) => this.report(err),
            }
        });
    }

    fn notify_cancel(&self) {
        tracing::debug!("file dialog cancelled");
        if let Some(on_cancel) = &self.options().on_file_dialog_cancel {
            on_cancel();
        }
    }

    fn on_window_focus(self: &Rc<Self>) {
        if self.dialog.state() != DialogState::Active {
            return;
        }
        let grace = self.options().config.cancel_grace();
        let this = Rc::clone(self);
        self.spawn(async move {
            if this.dialog.detect_focus_cancel(grace).await {
                this.notify_cancel();
            }
        });
    }

    fn on_document_drop(&self, event: &DomEvent) {
        if !self.options().config.prevent_drop_on_document {
            return;
        }
        let inside = match (self.root.get(), event.target_node()) {
            (Some(root), Some(target)) => self.document.contains(root, target),
            _ => false,
        };
        if inside {
            return;
        }
        event.prevent_default();
        self.drag.borrow_mut().clear_targets();
    }

    fn on_key_down(self: &Rc<Self>, event: &DomEvent) {
        if self.root.get().is_none() || event.target_node() != self.root.get() {
            return;
        }
        let Some(key) = event.key() else {
            return;
        };
        let activates = key.key == " "
            || key.key == "Enter"
            || key.key_code == KEY_SPACE
            || key.key_code == KEY_ENTER;
        if activates {
            event.prevent_default();
            self.open_file_dialog();
        }
    }

    fn on_focus(self: &Rc<Self>, _event: &DomEvent) {
        self.state.focused.set(true);
    }

    fn on_blur(self: &Rc<Self>, _event: &DomEvent) {
        self.state.focused.set(false);
    }

    fn on_click(self: &Rc<Self>, _event: &DomEvent) {
        if self.options().config.no_click || self.dialog.explicit_open_pending() {
            return;
        }
        self.open_file_dialog();
    }

    /// Keep the input's own click from reaching the root and reopening
    fn on_input_click(self: &Rc<Self>, event: &DomEvent) {
        event.stop_propagation();
    }
}
