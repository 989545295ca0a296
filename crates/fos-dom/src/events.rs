//! DOM Events
//!
//! Events are cheap to clone: clones share the same propagation and
//! default-prevented flags, so a handler that keeps an event past dispatch
//! still sees what later listeners did to it.

use std::cell::Cell;
use std::rc::Rc;

use crate::{DataTransfer, FileList, NodeId};

/// Event type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    KeyDown,
    Change,
    Focus,
    Blur,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
}

impl EventType {
    /// Check if this event type can bubble
    pub fn bubbles(&self) -> bool {
        !matches!(self, EventType::Focus | EventType::Blur)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::KeyDown => "keydown",
            EventType::Change => "change",
            EventType::Focus => "focus",
            EventType::Blur => "blur",
            EventType::DragEnter => "dragenter",
            EventType::DragOver => "dragover",
            EventType::DragLeave => "dragleave",
            EventType::Drop => "drop",
        }
    }
}

/// Where an event is dispatched or a listener is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Document,
    Node(NodeId),
}

impl EventTarget {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            EventTarget::Node(id) => Some(*id),
            _ => None,
        }
    }
}

/// Keyboard key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// `KeyboardEvent.key`
    pub key: String,
    /// Legacy `keyCode`
    pub key_code: u32,
}

impl Key {
    pub fn new(key: &str, key_code: u32) -> Self {
        Self { key: key.to_string(), key_code }
    }

    pub fn enter() -> Self {
        Self::new("Enter", 13)
    }

    pub fn space() -> Self {
        Self::new(" ", 32)
    }
}

/// Type-specific event data
#[derive(Debug, Clone)]
pub enum EventPayload {
    None,
    /// Drag events
    Drag(Option<DataTransfer>),
    /// `change` on a file input: its file list at dispatch time
    Files(FileList),
    Key(Key),
}

#[derive(Debug)]
struct EventInner {
    event_type: EventType,
    target: EventTarget,
    payload: EventPayload,
    bubbles: bool,
    cancelable: bool,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

/// DOM event
#[derive(Debug, Clone)]
pub struct DomEvent {
    inner: Rc<EventInner>,
}

impl DomEvent {
    pub fn new(event_type: EventType, target: EventTarget, payload: EventPayload) -> Self {
        Self {
            inner: Rc::new(EventInner {
                event_type,
                target,
                payload,
                bubbles: event_type.bubbles(),
                cancelable: !matches!(event_type, EventType::Focus | EventType::Blur),
                default_prevented: Cell::new(false),
                propagation_stopped: Cell::new(false),
            }),
        }
    }

    /// Create a drag event on a node
    pub fn drag(event_type: EventType, target: NodeId, data: DataTransfer) -> Self {
        Self::new(event_type, EventTarget::Node(target), EventPayload::Drag(Some(data)))
    }

    /// Create a file input `change` event
    pub fn change(target: NodeId, files: FileList) -> Self {
        Self::new(EventType::Change, EventTarget::Node(target), EventPayload::Files(files))
    }

    /// Create a `keydown` event
    pub fn key_down(target: NodeId, key: Key) -> Self {
        Self::new(EventType::KeyDown, EventTarget::Node(target), EventPayload::Key(key))
    }

    /// Create a `click` event
    pub fn click(target: NodeId) -> Self {
        Self::new(EventType::Click, EventTarget::Node(target), EventPayload::None)
    }

    pub fn event_type(&self) -> EventType {
        self.inner.event_type
    }

    pub fn target(&self) -> EventTarget {
        self.inner.target
    }

    /// Target node, for events dispatched on an element
    pub fn target_node(&self) -> Option<NodeId> {
        self.inner.target.node()
    }

    pub fn payload(&self) -> &EventPayload {
        &self.inner.payload
    }

    /// Data transfer of a drag event
    pub fn data_transfer(&self) -> Option<&DataTransfer> {
        match &self.inner.payload {
            EventPayload::Drag(dt) => dt.as_ref(),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        match &self.inner.payload {
            EventPayload::Key(key) => Some(key),
            _ => None,
        }
    }

    pub fn bubbles(&self) -> bool {
        self.inner.bubbles
    }

    /// Prevent default action
    pub fn prevent_default(&self) {
        if self.inner.cancelable {
            self.inner.default_prevented.set(true);
        }
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.inner.default_prevented.get()
    }

    /// Stop propagation
    pub fn stop_propagation(&self) {
        self.inner.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.inner.propagation_stopped.get()
    }

    /// Two handles to the same dispatched event
    pub fn ptr_eq(&self, other: &DomEvent) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flags() {
        let event = DomEvent::click(NodeId(3));
        let kept = event.clone();
        event.stop_propagation();
        event.prevent_default();

        assert!(kept.is_propagation_stopped());
        assert!(kept.is_default_prevented());
        assert!(kept.ptr_eq(&event));
    }

    #[test]
    fn test_focus_is_not_cancelable() {
        let event = DomEvent::new(EventType::Focus, EventTarget::Window, EventPayload::None);
        event.prevent_default();
        assert!(!event.is_default_prevented());
        assert!(!event.bubbles());
    }
}
