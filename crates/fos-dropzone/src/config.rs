//! Dropzone Configuration

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use fos_dom::{DomEvent, FileEntry};
use serde::Deserialize;

use crate::accept::AcceptSpec;
use crate::classify::{CustomValidator, FileRejection, Policy, Validation};
use crate::dialog::{FilePicker, PickerOptions};
use crate::extract::FileExtractor;
use crate::DropzoneError;

/// Default wait after window focus before a hidden-input dialog counts as
/// cancelled
pub const DEFAULT_CANCEL_GRACE_MS: u64 = 300;

/// Plain dropzone settings, loadable from JSON
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DropzoneConfig {
    /// Allowed types; `None` accepts any file
    pub accept: Option<AcceptSpec>,

    /// Disable every interaction
    pub disabled: bool,

    /// Maximum file size in bytes (`None` is unbounded)
    pub max_size: Option<u64>,

    /// Minimum file size in bytes
    pub min_size: u64,

    /// Allow more than one file per drop or selection
    pub multiple: bool,

    /// Upper bound on accepted files when `multiple` (0 is unlimited)
    pub max_files: usize,

    /// Stop the browser from opening files dropped outside the root
    pub prevent_drop_on_document: bool,

    pub no_click: bool,
    pub no_keyboard: bool,
    pub no_drag: bool,

    /// Stop drag events at this dropzone so enclosing dropzones never see them
    pub no_drag_events_bubbling: bool,

    /// Prefer the native file picker when one is available
    pub use_fs_access_api: bool,

    pub auto_focus: bool,

    /// Focus-cancel grace delay for the hidden input (ms)
    pub cancel_grace_ms: u64,
}

impl Default for DropzoneConfig {
    fn default() -> Self {
        Self {
            accept: None,
            disabled: false,
            max_size: None,
            min_size: 0,
            multiple: true,
            max_files: 0,
            prevent_drop_on_document: true,
            no_click: false,
            no_keyboard: false,
            no_drag: false,
            no_drag_events_bubbling: false,
            use_fs_access_api: false,
            auto_focus: false,
            cancel_grace_ms: DEFAULT_CANCEL_GRACE_MS,
        }
    }
}

impl DropzoneConfig {
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }

    /// `accept` attribute string for the file input
    pub fn accept_attr(&self) -> String {
        self.accept
            .as_ref()
            .map(AcceptSpec::to_accept_attr)
            .unwrap_or_default()
    }

    /// Options for the native picker
    pub fn picker_options(&self) -> PickerOptions {
        PickerOptions {
            multiple: self.multiple,
            types: self
                .accept
                .as_ref()
                .filter(|spec| !spec.is_empty())
                .map(AcceptSpec::picker_types),
        }
    }
}

pub type EventCallback = Rc<dyn Fn(&DomEvent)>;
pub type DropCallback = Rc<dyn Fn(&[FileEntry], &[FileRejection], Option<&DomEvent>)>;
pub type AcceptedCallback = Rc<dyn Fn(&[FileEntry], Option<&DomEvent>)>;
pub type RejectedCallback = Rc<dyn Fn(&[FileRejection], Option<&DomEvent>)>;
pub type NotifyCallback = Rc<dyn Fn()>;
pub type ErrorCallback = Rc<dyn Fn(&DropzoneError)>;

/// Config plus everything that is not plain data
#[derive(Clone, Default)]
pub struct DropzoneOptions {
    pub config: DropzoneConfig,
    pub validator: Option<CustomValidator>,
    /// Replaces the default event-to-file extraction
    pub extractor: Option<Rc<dyn FileExtractor>>,
    /// Native picker, used when `use_fs_access_api` is set in a secure context
    pub file_picker: Option<Rc<dyn FilePicker>>,

    pub on_drag_enter: Option<EventCallback>,
    pub on_drag_over: Option<EventCallback>,
    pub on_drag_leave: Option<EventCallback>,
    /// Every completed drop or selection; the event is `None` for picker results
    pub on_drop: Option<DropCallback>,
    pub on_drop_accepted: Option<AcceptedCallback>,
    pub on_drop_rejected: Option<RejectedCallback>,
    pub on_file_dialog_open: Option<NotifyCallback>,
    pub on_file_dialog_cancel: Option<NotifyCallback>,
    /// Operational errors; logged when unset
    pub on_error: Option<ErrorCallback>,
}

impl fmt::Debug for DropzoneOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropzoneOptions")
            .field("config", &self.config)
            .field("validator", &self.validator.is_some())
            .field("extractor", &self.extractor.is_some())
            .field("file_picker", &self.file_picker.is_some())
            .finish_non_exhaustive()
    }
}

impl From<DropzoneConfig> for DropzoneOptions {
    fn from(config: DropzoneConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

impl DropzoneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DropzoneConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_accept(mut self, accept: AcceptSpec) -> Self {
        self.config.accept = Some(accept);
        self
    }

    pub fn with_validator<V: Into<Validation>>(mut self, f: impl Fn(&FileEntry) -> V + 'static) -> Self {
        self.validator = Some(crate::classify::validator(f));
        self
    }

    pub fn with_extractor(mut self, extractor: impl FileExtractor + 'static) -> Self {
        self.extractor = Some(Rc::new(extractor));
        self
    }

    pub fn with_file_picker(mut self, picker: impl FilePicker + 'static) -> Self {
        self.file_picker = Some(Rc::new(picker));
        self
    }

    pub fn on_drag_enter(mut self, f: impl Fn(&DomEvent) + 'static) -> Self {
        self.on_drag_enter = Some(Rc::new(f));
        self
    }

    pub fn on_drag_over(mut self, f: impl Fn(&DomEvent) + 'static) -> Self {
        self.on_drag_over = Some(Rc::new(f));
        self
    }

    pub fn on_drag_leave(mut self, f: impl Fn(&DomEvent) + 'static) -> Self {
        self.on_drag_leave = Some(Rc::new(f));
        self
    }

    pub fn on_drop(
        mut self,
        f: impl Fn(&[FileEntry], &[FileRejection], Option<&DomEvent>) + 'static,
    ) -> Self {
        self.on_drop = Some(Rc::new(f));
        self
    }

    pub fn on_drop_accepted(mut self, f: impl Fn(&[FileEntry], Option<&DomEvent>) + 'static) -> Self {
        self.on_drop_accepted = Some(Rc::new(f));
        self
    }

    pub fn on_drop_rejected(mut self, f: impl Fn(&[FileRejection], Option<&DomEvent>) + 'static) -> Self {
        self.on_drop_rejected = Some(Rc::new(f));
        self
    }

    pub fn on_file_dialog_open(mut self, f: impl Fn() + 'static) -> Self {
        self.on_file_dialog_open = Some(Rc::new(f));
        self
    }

    pub fn on_file_dialog_cancel(mut self, f: impl Fn() + 'static) -> Self {
        self.on_file_dialog_cancel = Some(Rc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&DropzoneError) + 'static) -> Self {
        self.on_error = Some(Rc::new(f));
        self
    }

    /// Classification rules for the current settings
    pub fn policy(&self) -> Policy {
        Policy {
            accept: self.config.accept.clone(),
            min_size: self.config.min_size,
            max_size: self.config.max_size,
            multiple: self.config.multiple,
            max_files: self.config.max_files,
            validator: self.validator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DropzoneConfig::default();
        assert!(config.multiple);
        assert!(config.prevent_drop_on_document);
        assert!(!config.use_fs_access_api);
        assert_eq!(config.max_size, None);
        assert_eq!(config.cancel_grace(), Duration::from_millis(300));
    }

    #[test]
    fn test_picker_options() {
        let config = DropzoneConfig {
            accept: Some(AcceptSpec::new().with("image/png", &[".png"]).with("text/*", &[])),
            multiple: false,
            ..Default::default()
        };
        let opts = config.picker_options();
        assert!(!opts.multiple);
        let types = opts.types.unwrap();
        assert_eq!(types.len(), 2);
        assert!(types.iter().all(|t| t.description == "Files"));
        assert_eq!(types[0].accept["image/png"], vec![".png".to_string()]);

        let empty = DropzoneConfig {
            accept: Some(AcceptSpec::new()),
            ..Default::default()
        };
        assert_eq!(empty.picker_options().types, None);
    }

    #[test]
    fn test_policy_follows_config() {
        let options = DropzoneOptions::new()
            .with_config(DropzoneConfig {
                min_size: 10,
                max_size: Some(20),
                max_files: 3,
                ..Default::default()
            })
            .with_validator(|_| None::<crate::FileError>);
        let policy = options.policy();
        assert_eq!(policy.min_size, 10);
        assert_eq!(policy.max_size, Some(20));
        assert_eq!(policy.max_files, 3);
        assert!(policy.validator.is_some());
    }
}
