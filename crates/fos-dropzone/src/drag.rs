//! Drag interaction state
//!
//! Nested elements fire `dragenter`/`dragleave` independently as the pointer
//! crosses their boundaries, so the region stays active while any entered
//! node is still under the pointer. Entered nodes are kept as a multiset;
//! a leave removes at most one occurrence.

use fos_dom::NodeId;

/// Visual phase of the drop region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Inactive,
    /// Files hover the region; flags preview whether a drop would be accepted
    Hovering { accept: bool, reject: bool },
}

impl DragPhase {
    /// Preview flags from a speculative classification
    pub fn preview(file_count: usize, all_accepted: bool) -> Self {
        let accept = file_count > 0 && all_accepted;
        DragPhase::Hovering {
            accept,
            reject: file_count > 0 && !accept,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, DragPhase::Hovering { .. })
    }

    pub fn accept(&self) -> bool {
        matches!(self, DragPhase::Hovering { accept: true, .. })
    }

    pub fn reject(&self) -> bool {
        matches!(self, DragPhase::Hovering { reject: true, .. })
    }
}

/// Entered nodes plus the current phase, for one dropzone
#[derive(Debug, Default)]
pub struct DragTracker {
    targets: Vec<NodeId>,
    phase: DragPhase,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// Record a `dragenter` target
    pub fn enter(&mut self, target: NodeId) {
        self.targets.push(target);
    }

    /// Apply a preview computed after `enter`.
    ///
    /// Ignored once every target has left again, so a late preview cannot
    /// reactivate a region the pointer already evacuated.
    pub fn hover(&mut self, phase: DragPhase) -> bool {
        if self.targets.is_empty() {
            tracing::trace!("dropping stale drag preview {phase:?}");
            return false;
        }
        self.phase = phase;
        true
    }

    /// Record a `dragleave`. Targets no longer inside the region are pruned
    /// first. Returns true when the region was fully left.
    pub fn leave(&mut self, target: NodeId, inside: impl Fn(NodeId) -> bool) -> bool {
        self.targets.retain(|&t| inside(t));
        if let Some(idx) = self.targets.iter().position(|&t| t == target) {
            self.targets.remove(idx);
        }
        if !self.targets.is_empty() {
            return false;
        }
        self.phase = DragPhase::Inactive;
        true
    }

    /// Forget all targets (drop, or a drop elsewhere in the document)
    pub fn reset(&mut self) {
        self.targets.clear();
        self.phase = DragPhase::Inactive;
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use fos_dom::DomTree;

    const OUTER: NodeId = NodeId::ROOT;

    fn two_nodes() -> (NodeId, NodeId) {
        let mut tree = DomTree::new();
        (tree.create_element("div"), tree.create_element("div"))
    }

    #[test]
    fn test_preview_flags() {
        assert_eq!(DragPhase::preview(0, true), DragPhase::Hovering { accept: false, reject: false });
        assert_eq!(DragPhase::preview(2, true), DragPhase::Hovering { accept: true, reject: false });
        assert_eq!(DragPhase::preview(2, false), DragPhase::Hovering { accept: false, reject: true });
    }

    #[test]
    fn test_enter_leave_single_target() {
        let mut drag = DragTracker::new();
        drag.enter(OUTER);
        assert!(drag.hover(DragPhase::preview(1, true)));
        assert!(drag.phase().is_active());

        assert!(drag.leave(OUTER, |_| true));
        assert_eq!(drag.phase(), DragPhase::Inactive);
        assert!(drag.targets().is_empty());
    }

    #[test]
    fn test_nested_leave_keeps_active() {
        let (outer, inner) = two_nodes();
        let mut drag = DragTracker::new();
        drag.enter(outer);
        drag.hover(DragPhase::preview(1, true));
        drag.enter(inner);

        assert!(!drag.leave(outer, |_| true));
        assert!(drag.phase().accept());
        assert!(drag.leave(inner, |_| true));
        assert!(!drag.phase().is_active());
    }

    #[test]
    fn test_duplicate_enters_removed_one_at_a_time() {
        let mut drag = DragTracker::new();
        drag.enter(OUTER);
        drag.enter(OUTER);
        assert!(!drag.leave(OUTER, |_| true));
        assert_eq!(drag.targets(), &[OUTER]);
        assert!(drag.leave(OUTER, |_| true));
    }

    #[test]
    fn test_leave_prunes_targets_outside_region() {
        let (outer, stray) = two_nodes();
        let mut drag = DragTracker::new();
        drag.enter(stray);
        drag.enter(outer);
        assert!(drag.leave(outer, |t| t == outer));
    }

    #[test]
    fn test_stale_preview_ignored() {
        let mut drag = DragTracker::new();
        drag.enter(OUTER);
        drag.leave(OUTER, |_| true);
        assert!(!drag.hover(DragPhase::preview(1, true)));
        assert_eq!(drag.phase(), DragPhase::Inactive);
    }
}
