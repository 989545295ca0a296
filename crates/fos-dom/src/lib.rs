//! fOS DOM - Document Object Model
//!
//! Arena-allocated node tree plus the event model interactive components
//! are written against: listener registration, bubbling dispatch and drag
//! data transfer.

mod node;
mod tree;
mod document;
mod events;
mod transfer;

pub use node::{Node, NodeData, ElementData};
pub use tree::DomTree;
pub use document::{Document, Listener, ListenerId};
pub use events::{DomEvent, EventPayload, EventTarget, EventType, Key};
pub use transfer::{
    DataTransfer, DataTransferItem, DataTransferKind, DropEffect, FileEntry, FileList,
};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check this is not the sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }
}

/// DOM error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {0:?} is not a file input")]
    NotFileInput(NodeId),

    #[error("Cannot append {child:?} to {parent:?}")]
    Hierarchy { parent: NodeId, child: NodeId },

    #[error("Property is read-only: {0}")]
    ReadOnly(&'static str),
}

pub type Result<T> = std::result::Result<T, DomError>;
