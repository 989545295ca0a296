//! Prop builders
//!
//! A dropzone exposes two sets of props, one for its interactive root and
//! one for the hidden file input. Each carries attributes plus handlers;
//! caller-supplied handlers run ahead of the dropzone's own.

use std::rc::Rc;

use fos_dom::{Document, DomEvent, EventTarget, EventType, ListenerId, NodeId};

use crate::Result;

/// DOM event handler
pub type Handler = Rc<dyn Fn(&DomEvent)>;

/// Inline style that hides the file input while keeping it clickable
pub const VISUALLY_HIDDEN_STYLE: &str = "border: 0px; clip: rect(0, 0, 0, 0); clip-path: inset(50%); \
height: 1px; margin: 0px -1px -1px 0px; overflow: hidden; padding: 0px; position: absolute; \
width: 1px; white-space: nowrap";

const DEFAULT_ROLE: &str = "presentation";

/// Chain a caller handler ahead of a core handler.
///
/// The core handler is skipped once the caller stopped propagation or
/// prevented the default action.
pub fn compose_handlers(caller: Option<Handler>, core: Handler) -> Handler {
    match caller {
        None => Rc::new(move |event: &DomEvent| {
            if !handled(event) {
                core(event);
            }
        }),
        Some(caller) => Rc::new(move |event: &DomEvent| {
            caller(event);
            if !handled(event) {
                core(event);
            }
        }),
    }
}

fn handled(event: &DomEvent) -> bool {
    event.is_default_prevented() || event.is_propagation_stopped()
}

/// Caller overrides for a prop set
#[derive(Clone, Default)]
pub struct PropsArgs {
    pub role: Option<String>,
    pub handlers: Vec<(EventType, Handler)>,
    /// Extra attributes, applied last
    pub attrs: Vec<(String, String)>,
}

impl PropsArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn on(mut self, event_type: EventType, f: impl Fn(&DomEvent) + 'static) -> Self {
        self.handlers.push((event_type, Rc::new(f)));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Remove and return the caller handler for `event_type`
    pub(crate) fn take_handler(&mut self, event_type: EventType) -> Option<Handler> {
        let idx = self.handlers.iter().position(|(t, _)| *t == event_type)?;
        Some(self.handlers.remove(idx).1)
    }
}

/// Props for the dropzone root
#[derive(Clone)]
pub struct RootProps {
    pub role: String,
    /// `None` when the root must not be focusable
    pub tab_index: Option<i32>,
    pub handlers: Vec<(EventType, Handler)>,
    pub attrs: Vec<(String, String)>,
}

impl RootProps {
    pub(crate) fn new(role: Option<String>, tab_index: Option<i32>) -> Self {
        Self {
            role: role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            tab_index,
            handlers: Vec::new(),
            attrs: Vec::new(),
        }
    }

    pub fn handler(&self, event_type: EventType) -> Option<&Handler> {
        find_handler(&self.handlers, event_type)
    }

    /// Apply the props to `node`; the returned guard removes the listeners
    pub fn bind(&self, document: &Rc<Document>, node: NodeId) -> Result<Detach> {
        document.set_attribute(node, "role", &self.role)?;
        match self.tab_index {
            Some(idx) => document.set_attribute(node, "tabindex", &idx.to_string())?,
            None => {
                document.remove_attribute(node, "tabindex");
            }
        }
        for (name, value) in &self.attrs {
            document.set_attribute(node, name, value)?;
        }
        Ok(Detach::listen(document, EventTarget::Node(node), &self.handlers))
    }
}

/// Props for the hidden file input
#[derive(Clone)]
pub struct InputProps {
    pub accept: String,
    pub multiple: bool,
    pub tab_index: i32,
    pub handlers: Vec<(EventType, Handler)>,
    pub attrs: Vec<(String, String)>,
}

impl InputProps {
    pub const INPUT_TYPE: &'static str = "file";
    pub const STYLE: &'static str = VISUALLY_HIDDEN_STYLE;

    pub(crate) fn new(accept: String, multiple: bool) -> Self {
        Self {
            accept,
            multiple,
            tab_index: -1,
            handlers: Vec::new(),
            attrs: Vec::new(),
        }
    }

    pub fn handler(&self, event_type: EventType) -> Option<&Handler> {
        find_handler(&self.handlers, event_type)
    }

    pub fn bind(&self, document: &Rc<Document>, node: NodeId) -> Result<Detach> {
        document.set_attribute(node, "type", Self::INPUT_TYPE)?;
        document.set_attribute(node, "accept", &self.accept)?;
        if self.multiple {
            document.set_attribute(node, "multiple", "")?;
        } else {
            document.remove_attribute(node, "multiple");
        }
        document.set_attribute(node, "style", Self::STYLE)?;
        document.set_attribute(node, "tabindex", &self.tab_index.to_string())?;
        for (name, value) in &self.attrs {
            document.set_attribute(node, name, value)?;
        }
        Ok(Detach::listen(document, EventTarget::Node(node), &self.handlers))
    }
}

fn find_handler(handlers: &[(EventType, Handler)], event_type: EventType) -> Option<&Handler> {
    handlers
        .iter()
        .find(|(t, _)| *t == event_type)
        .map(|(_, h)| h)
}

/// Listener guard; removes its listeners exactly once, on drop
#[must_use = "listeners are removed when the guard is dropped"]
pub struct Detach {
    document: Rc<Document>,
    ids: Vec<ListenerId>,
}

impl Detach {
    pub(crate) fn new(document: &Rc<Document>) -> Self {
        Self {
            document: Rc::clone(document),
            ids: Vec::new(),
        }
    }

    pub(crate) fn listen(
        document: &Rc<Document>,
        target: EventTarget,
        handlers: &[(EventType, Handler)],
    ) -> Self {
        let mut guard = Self::new(document);
        for (event_type, handler) in handlers {
            guard.push(target, *event_type, Rc::clone(handler));
        }
        guard
    }

    pub(crate) fn push(&mut self, target: EventTarget, event_type: EventType, handler: Handler) {
        self.ids.push(self.document.add_listener_rc(target, event_type, handler));
    }

    /// Take over another guard's listeners
    pub fn merge(&mut self, mut other: Detach) {
        self.ids.append(&mut other.ids);
    }

    /// Number of listeners held
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Remove the listeners now
    pub fn detach(self) {}
}

impl Drop for Detach {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            self.document.remove_event_listener(id);
        }
    }
}

impl std::fmt::Debug for Detach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detach").field("listeners", &self.ids.len()).finish()
    }
}
