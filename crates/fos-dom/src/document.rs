//! Document - listener registry and event dispatch
//!
//! The document is shared (`Rc<Document>`) between the host and the
//! components mounted on it, so all mutation goes through interior
//! mutability. Listeners run with no internal borrow held and may freely
//! add or remove listeners or touch the tree.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{
    DomError, DomEvent, DomTree, EventPayload, EventTarget, EventType, FileList, NodeId, Result,
};

/// Event listener callback
pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// Handle returned by `add_event_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    target: EventTarget,
    event_type: EventType,
    listener: Listener,
}

/// HTML Document
pub struct Document {
    tree: RefCell<DomTree>,
    listeners: RefCell<Vec<Registration>>,
    next_listener: Cell<u64>,
    active_element: Cell<Option<NodeId>>,
    secure_context: Cell<bool>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree.borrow().len())
            .field("listeners", &self.listeners.borrow().len())
            .field("active_element", &self.active_element.get())
            .finish()
    }
}

impl Document {
    /// Create an empty document in a secure context
    pub fn new() -> Self {
        Self {
            tree: RefCell::new(DomTree::new()),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(1),
            active_element: Cell::new(None),
            secure_context: Cell::new(true),
        }
    }

    /// Whether privileged APIs (native file picker) may be used
    pub fn is_secure_context(&self) -> bool {
        self.secure_context.get()
    }

    pub fn set_secure_context(&self, secure: bool) {
        self.secure_context.set(secure);
    }

    /// Create an element and append it to `parent`
    pub fn create_element(&self, parent: NodeId, tag: &str) -> Result<NodeId> {
        let mut tree = self.tree.borrow_mut();
        let id = tree.create_element(tag);
        tree.append_child(parent, id)?;
        Ok(id)
    }

    /// Create an `<input type="file">` under `parent`
    pub fn create_file_input(&self, parent: NodeId) -> Result<NodeId> {
        let id = self.create_element(parent, "input")?;
        if let Some(el) = self.tree.borrow_mut().get_mut(id).and_then(|n| n.as_element_mut()) {
            el.set_attr("type", "file");
        }
        Ok(id)
    }

    /// Inclusive descendant check
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.borrow().contains(ancestor, node)
    }

    /// Set an attribute on an element
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let el = tree
            .get_mut(node)
            .and_then(|n| n.as_element_mut())
            .ok_or(DomError::UnknownNode(node))?;
        el.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        self.tree
            .borrow_mut()
            .get_mut(node)
            .and_then(|n| n.as_element_mut())
            .is_some_and(|el| el.remove_attr(name))
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let tree = self.tree.borrow();
        tree.get(node)?.as_element()?.get_attr(name).map(str::to_string)
    }

    /// Register a listener
    pub fn add_event_listener(
        &self,
        target: EventTarget,
        event_type: EventType,
        listener: impl Fn(&DomEvent) + 'static,
    ) -> ListenerId {
        self.add_listener_rc(target, event_type, Rc::new(listener))
    }

    /// Register an already shared listener
    pub fn add_listener_rc(
        &self,
        target: EventTarget,
        event_type: EventType,
        listener: Listener,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push(Registration {
            id,
            target,
            event_type,
            listener,
        });
        id
    }

    /// Remove a listener; returns false if it was already gone
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() < before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|r| r.id == id)
    }

    /// Targets visited by an event, innermost first
    fn propagation_path(&self, target: EventTarget, bubbles: bool) -> Vec<EventTarget> {
        let mut path = Vec::new();
        match target {
            EventTarget::Node(id) => {
                let tree = self.tree.borrow();
                for node in tree.ancestors_inclusive(id) {
                    if node == NodeId::ROOT {
                        path.push(EventTarget::Document);
                        path.push(EventTarget::Window);
                    } else {
                        path.push(EventTarget::Node(node));
                    }
                }
            }
            EventTarget::Document => {
                path.push(EventTarget::Document);
                path.push(EventTarget::Window);
            }
            EventTarget::Window => path.push(EventTarget::Window),
        }
        if !bubbles {
            path.truncate(1);
        }
        path
    }

    /// Dispatch an event; returns false if the default action was prevented
    pub fn dispatch_event(&self, event: &DomEvent) -> bool {
        let path = self.propagation_path(event.target(), event.bubbles());

        for current in path {
            let matching: Vec<(ListenerId, Listener)> = self
                .listeners
                .borrow()
                .iter()
                .filter(|r| r.target == current && r.event_type == event.event_type())
                .map(|r| (r.id, Rc::clone(&r.listener)))
                .collect();

            for (id, listener) in matching {
                if self.is_registered(id) {
                    listener(event);
                }
            }
            if event.is_propagation_stopped() {
                tracing::trace!("{} stopped at {:?}", event.event_type().as_str(), current);
                break;
            }
        }

        !event.is_default_prevented()
    }

    /// Focused element
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element.get()
    }

    /// Move focus to `node`, firing `blur` on the previous element
    pub fn focus(&self, node: NodeId) -> Result<()> {
        if self.tree.borrow().get(node).is_none() {
            return Err(DomError::UnknownNode(node));
        }
        if self.active_element.get() == Some(node) {
            return Ok(());
        }
        self.blur();
        self.active_element.set(Some(node));
        self.dispatch_event(&DomEvent::new(
            EventType::Focus,
            EventTarget::Node(node),
            EventPayload::None,
        ));
        Ok(())
    }

    /// Drop focus from the active element
    pub fn blur(&self) {
        if let Some(prev) = self.active_element.take() {
            self.dispatch_event(&DomEvent::new(
                EventType::Blur,
                EventTarget::Node(prev),
                EventPayload::None,
            ));
        }
    }

    /// The window regained focus (e.g. a native dialog closed)
    pub fn focus_window(&self) {
        self.dispatch_event(&DomEvent::new(
            EventType::Focus,
            EventTarget::Window,
            EventPayload::None,
        ));
    }

    /// Click an element
    pub fn click(&self, node: NodeId) -> bool {
        self.dispatch_event(&DomEvent::click(node))
    }

    /// Current selection of a file input
    pub fn input_files(&self, node: NodeId) -> Result<FileList> {
        let tree = self.tree.borrow();
        let el = tree
            .get(node)
            .ok_or(DomError::UnknownNode(node))?
            .as_element()
            .filter(|el| el.is_file_input())
            .ok_or(DomError::NotFileInput(node))?;
        Ok(el.files.clone().unwrap_or_default())
    }

    /// `input.value = ""`
    pub fn clear_input_files(&self, node: NodeId) -> Result<()> {
        self.with_file_input(node, |files| files.clear())
    }

    /// The user picked `files` in a file input: store them and fire `change`
    pub fn select_files(&self, node: NodeId, files: FileList) -> Result<bool> {
        let snapshot = files.clone();
        self.with_file_input(node, move |current| *current = files)?;
        Ok(self.dispatch_event(&DomEvent::change(node, snapshot)))
    }

    fn with_file_input(&self, node: NodeId, f: impl FnOnce(&mut FileList)) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let el = tree
            .get_mut(node)
            .ok_or(DomError::UnknownNode(node))?
            .as_element_mut()
            .filter(|el| el.is_file_input())
            .ok_or(DomError::NotFileInput(node))?;
        f(el.files.get_or_insert_with(FileList::new));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> impl Fn(&DomEvent) + 'static {
        let log = Rc::clone(log);
        move |_| log.borrow_mut().push(name)
    }

    #[test]
    fn test_bubbling_order() {
        let doc = Document::new();
        let outer = doc.create_element(NodeId::ROOT, "div").unwrap();
        let inner = doc.create_element(outer, "div").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        doc.add_event_listener(EventTarget::Window, EventType::Click, recorder(&log, "window"));
        doc.add_event_listener(EventTarget::Document, EventType::Click, recorder(&log, "document"));
        doc.add_event_listener(EventTarget::Node(outer), EventType::Click, recorder(&log, "outer"));
        doc.add_event_listener(EventTarget::Node(inner), EventType::Click, recorder(&log, "inner"));

        doc.click(inner);
        assert_eq!(*log.borrow(), vec!["inner", "outer", "document", "window"]);
    }

    #[test]
    fn test_stop_propagation() {
        let doc = Document::new();
        let outer = doc.create_element(NodeId::ROOT, "div").unwrap();
        let inner = doc.create_element(outer, "div").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        doc.add_event_listener(EventTarget::Node(outer), EventType::Click, recorder(&log, "outer"));
        doc.add_event_listener(EventTarget::Node(inner), EventType::Click, |e| e.stop_propagation());

        doc.click(inner);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_removed_listener_not_called() {
        let doc = Document::new();
        let node = doc.create_element(NodeId::ROOT, "div").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = doc.add_event_listener(EventTarget::Node(node), EventType::Click, recorder(&log, "x"));

        assert!(doc.remove_event_listener(id));
        assert!(!doc.remove_event_listener(id));
        doc.click(node);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_focus_does_not_bubble() {
        let doc = Document::new();
        let outer = doc.create_element(NodeId::ROOT, "div").unwrap();
        let inner = doc.create_element(outer, "button").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        doc.add_event_listener(EventTarget::Node(outer), EventType::Focus, recorder(&log, "outer"));
        doc.add_event_listener(EventTarget::Node(inner), EventType::Focus, recorder(&log, "inner"));
        doc.add_event_listener(EventTarget::Node(inner), EventType::Blur, recorder(&log, "inner-blur"));

        doc.focus(inner).unwrap();
        doc.focus(outer).unwrap();
        assert_eq!(*log.borrow(), vec!["inner", "inner-blur", "outer"]);
        assert_eq!(doc.active_element(), Some(outer));
    }

    #[test]
    fn test_file_input_selection() {
        let doc = Document::new();
        let input = doc.create_file_input(NodeId::ROOT).unwrap();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        doc.add_event_listener(EventTarget::Node(input), EventType::Change, move |e| {
            if let EventPayload::Files(files) = e.payload() {
                counter.set(files.len());
            }
        });

        let files: FileList = [crate::FileEntry::new("a.txt", 3, "text/plain")].into_iter().collect();
        doc.select_files(input, files).unwrap();
        assert_eq!(seen.get(), 1);
        assert_eq!(doc.input_files(input).unwrap().len(), 1);

        doc.clear_input_files(input).unwrap();
        assert!(doc.input_files(input).unwrap().is_empty());
    }

    #[test]
    fn test_attributes() {
        let doc = Document::new();
        let div = doc.create_element(NodeId::ROOT, "div").unwrap();
        doc.set_attribute(div, "role", "presentation").unwrap();
        assert_eq!(doc.get_attribute(div, "role").as_deref(), Some("presentation"));
        assert!(doc.remove_attribute(div, "role"));
        assert_eq!(doc.get_attribute(div, "role"), None);
        assert_eq!(
            doc.set_attribute(NodeId::ROOT, "role", "x"),
            Err(DomError::UnknownNode(NodeId::ROOT))
        );
    }

    #[test]
    fn test_non_input_rejected() {
        let doc = Document::new();
        let div = doc.create_element(NodeId::ROOT, "div").unwrap();
        assert_eq!(doc.input_files(div), Err(DomError::NotFileInput(div)));
    }
}
