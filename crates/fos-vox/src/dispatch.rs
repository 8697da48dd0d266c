//! Command Dispatcher
//!
//! Resolves a command through the motion table and runs it against the
//! current range. Predicate jumps search forward or backward from the range,
//! ask the host to scroll when nothing is found, wrap to the opposite edge
//! of the search root, and finally re-sync onto a speakable object.

use fos_a11y::{AccessibleTree, NodeId, Role};

use crate::command::{Command, DirectJump, JumpSpec, JumpStart, Motion, PredicateSource};
use crate::cursor::{CursorRange, CursorUnit};
use crate::edit::{self, EditOutcome, TextEditState};
use crate::host::Host;
use crate::predicate::{has_output, node_text, should_ignore, Predicate};
use crate::table::{row_of, table_of, TableCellPredicate};
use crate::traversal::{
    bounding_root, find_last_node, find_next, find_node_post_bounded, find_node_pre_bounded, walk_up, Direction,
    SearchOptions, MAX_ANCESTOR_DEPTH,
};

/// Command to re-run after the host finishes scrolling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRetry {
    pub command: Command,
    /// Range current when the retry was scheduled
    pub range: CursorRange,
}

/// Result of dispatching one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The range moved (or was re-announced in place)
    Navigated(CursorRange),
    /// Consumed without moving the range
    Handled,
    /// Not a navigation command; let it propagate
    Unhandled,
    /// Waiting on a host scroll
    Deferred(PendingRetry),
    /// Nothing to move to; the range is unchanged
    Blocked,
}

impl DispatchOutcome {
    pub fn range(&self) -> Option<&CursorRange> {
        match self {
            Self::Navigated(range) => Some(range),
            _ => None,
        }
    }
}

/// Inputs for one dispatch
pub struct DispatchContext<'a, H: Host + ?Sized> {
    pub tree: &'a dyn AccessibleTree,
    pub host: &'a mut H,
    pub text_edit: Option<&'a TextEditState>,
    pub sticky_mode: bool,
}

/// Command dispatcher
#[derive(Debug)]
pub struct CommandDispatcher {
    max_depth: usize,
    ignoring_range_changes: bool,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new(MAX_ANCESTOR_DEPTH)
    }
}

impl CommandDispatcher {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth, ignoring_range_changes: false }
    }

    /// Mode latch; only set while a command is running
    pub fn is_ignoring_range_changes(&self) -> bool {
        self.ignoring_range_changes
    }

    pub fn dispatch<H: Host + ?Sized>(
        &mut self,
        cx: &mut DispatchContext<'_, H>,
        command: Command,
        range: &CursorRange,
    ) -> DispatchOutcome {
        let outcome = self.run(cx, command, range);
        self.finish(cx.host);
        tracing::debug!("{} -> {:?}", command, outcome);
        outcome
    }

    /// One step of continuous reading: the next object forward, past label
    /// text and nodes with nothing to say. Never wraps; `Blocked` at the end
    /// of the document.
    pub fn read_next<H: Host + ?Sized>(&mut self, cx: &mut DispatchContext<'_, H>, range: &CursorRange) -> DispatchOutcome {
        let tree = cx.tree;
        if !range.is_valid(tree) {
            return DispatchOutcome::Blocked;
        }

        let mut current = range.clone();
        for _ in 0..self.max_depth {
            let moved = current.move_by_bounded(tree, CursorUnit::Node, Direction::Forward, self.max_depth);
            let moved = self.skip_label_or_description(tree, moved, Direction::Forward);
            let node = moved.start().node();
            if moved.wrapped() || moved.same_position(&current) || Predicate::Root.matches(tree, node) {
                tracing::debug!("Reading reached the end at {}", current.start().node());
                return DispatchOutcome::Blocked;
            }
            if has_output(tree, node) {
                return DispatchOutcome::Navigated(moved);
            }
            tracing::trace!("Reading past silent {}", node);
            current = moved;
        }
        tracing::warn!("Reading found no output within {} steps", self.max_depth);
        DispatchOutcome::Blocked
    }

    fn finish<H: Host + ?Sized>(&mut self, host: &mut H) {
        if self.ignoring_range_changes {
            self.ignoring_range_changes = false;
            host.set_ignoring_range_changes(false);
        }
    }

    fn run<H: Host + ?Sized>(
        &mut self,
        cx: &mut DispatchContext<'_, H>,
        command: Command,
        current: &CursorRange,
    ) -> DispatchOutcome {
        if !current.is_valid(cx.tree) {
            return DispatchOutcome::Blocked;
        }

        let mut range = current.clone();
        match edit::prepass(cx.tree, cx.host, cx.text_edit, cx.sticky_mode, command, &range, self.max_depth) {
            EditOutcome::Handled => return DispatchOutcome::Handled,
            EditOutcome::Retarget(retargeted) => range = retargeted,
            EditOutcome::NotApplicable => {}
        }

        let Some(motion) = command.motion() else {
            return DispatchOutcome::Unhandled;
        };

        match motion {
            Motion::Unit(unit, direction) => {
                let mut moved = range.move_by_bounded(cx.tree, unit, direction, self.max_depth);
                if unit == CursorUnit::Node {
                    moved = self.skip_label_or_description(cx.tree, moved, direction);
                }
                self.land(cx, command, current, moved, direction, true)
            }
            Motion::Jump(spec) => self.jump(cx, command, current, &range, &spec),
            Motion::Direct(jump) => self.direct(cx, command, current, &range, jump),
        }
    }

    /// Final step for every successful move: give the host a chance to
    /// scroll the target into view first.
    fn land<H: Host + ?Sized>(
        &mut self,
        cx: &mut DispatchContext<'_, H>,
        command: Command,
        current: &CursorRange,
        target: CursorRange,
        direction: Direction,
        try_scrolling: bool,
    ) -> DispatchOutcome {
        if try_scrolling && cx.host.scroll_for_navigation(&target, direction) {
            tracing::debug!("Deferring {} until scrolled", command);
            return DispatchOutcome::Deferred(PendingRetry { command, range: current.clone() });
        }
        DispatchOutcome::Navigated(target)
    }

    fn blocked<H: Host + ?Sized>(cx: &mut DispatchContext<'_, H>, message: Option<&'static str>) -> DispatchOutcome {
        if let Some(message) = message {
            cx.host.speak_message(message);
        }
        DispatchOutcome::Blocked
    }

    fn resolve_predicate(&self, tree: &dyn AccessibleTree, spec: &JumpSpec, origin: NodeId) -> Option<Predicate> {
        match spec.predicate {
            PredicateSource::Fixed(pred) => Some(pred),
            PredicateSource::SimilarItem => Predicate::similar_to(tree, origin, self.max_depth),
            PredicateSource::List => Some(Predicate::list_from(tree, origin, self.max_depth)),
            PredicateSource::TableCell(axis) => {
                TableCellPredicate::from_node(tree, origin, axis, spec.direction, false, self.max_depth)
                    .map(Predicate::TableCell)
            }
            PredicateSource::ColumnEnd => {
                TableCellPredicate::column_end(tree, origin, spec.direction, self.max_depth).map(Predicate::TableCell)
            }
        }
    }

    /// Range the search starts from, and whether its bound may itself match
    fn jump_start(&self, tree: &dyn AccessibleTree, spec: &JumpSpec, range: &CursorRange) -> Option<(CursorRange, bool)> {
        let origin = range.start().node();
        match spec.start {
            JumpStart::Bound => Some((range.clone(), false)),
            JumpStart::TableFirstChild => {
                let table = table_of(tree, origin, self.max_depth)?;
                Some((CursorRange::from_node(tree.first_child(table)?), false))
            }
            JumpStart::TableLastCell => {
                let table = table_of(tree, origin, self.max_depth)?;
                let mut cell = tree.last_child(table)?;
                for _ in 0..self.max_depth {
                    if Predicate::CellLike.matches(tree, cell) {
                        break;
                    }
                    match tree.last_child(cell) {
                        Some(child) => cell = child,
                        None => break,
                    }
                }
                Some((CursorRange::from_node(cell), true))
            }
        }
    }

    fn jump<H: Host + ?Sized>(
        &mut self,
        cx: &mut DispatchContext<'_, H>,
        command: Command,
        current: &CursorRange,
        range: &CursorRange,
        spec: &JumpSpec,
    ) -> DispatchOutcome {
        if spec.suppress_mode_toggle {
            self.ignoring_range_changes = true;
            cx.host.set_ignoring_range_changes(true);
        }

        let tree = cx.tree;
        let direction = spec.direction;
        let Some(pred) = self.resolve_predicate(tree, spec, range.start().node()) else {
            tracing::debug!("No predicate for {} at {}", command, range.start().node());
            return Self::blocked(cx, spec.error_message);
        };
        let Some((start, match_current)) = self.jump_start(tree, spec, range) else {
            return DispatchOutcome::Blocked;
        };

        let bound = start.bound(direction).node();
        let opts = SearchOptions { root: spec.root, skip_initial_ancestry: spec.skip_initial_ancestry, max_depth: self.max_depth };

        let found = if match_current && pred.matches(tree, bound) {
            Some(bound)
        } else {
            find_next(tree, bound, direction, &pred, &opts)
        };

        if let Some(node) = found {
            let target = CursorRange::from_node(self.sync(tree, node, spec.skip_sync, spec.root));
            return self.land(cx, command, current, target, direction, true);
        }

        if cx.host.try_scroll(bound, command, &start, direction) {
            tracing::debug!("{} found nothing; waiting for scroll", command);
            return DispatchOutcome::Deferred(PendingRetry { command, range: current.clone() });
        }

        if !spec.should_wrap {
            return Self::blocked(cx, spec.error_message);
        }

        let Some(wrapped) = self.wrap_search(tree, bound, direction, &pred, spec.root) else {
            return Self::blocked(cx, spec.error_message);
        };
        tracing::debug!("{} wrapped to {}", command, wrapped);
        let target = CursorRange::from_node(self.sync(tree, wrapped, spec.skip_sync, spec.root)).with_wrapped(true);
        self.land(cx, command, current, target, direction, true)
    }

    /// Second pass from the opposite edge of the search root
    fn wrap_search(
        &self,
        tree: &dyn AccessibleTree,
        bound: NodeId,
        direction: Direction,
        pred: &Predicate,
        root_pred: Predicate,
    ) -> Option<NodeId> {
        let root = bounding_root(tree, bound, &root_pred, self.max_depth)?;
        let opts = SearchOptions { root: root_pred, skip_initial_ancestry: false, max_depth: self.max_depth };
        match direction {
            Direction::Forward => find_next(tree, root, direction, pred, &opts),
            Direction::Backward => {
                let edge = find_node_post_bounded(tree, root, direction, &Predicate::Leaf, self.max_depth)
                    .filter(|&leaf| leaf != root)?;
                if pred.matches(tree, edge) && !should_ignore(tree, edge) {
                    return Some(edge);
                }
                find_next(tree, edge, direction, pred, &opts)
            }
        }
    }

    /// First object at or after `node` within `root`, unless syncing is
    /// skipped. A match with no object below it (an empty table, say) moves
    /// on to the next object in document order.
    fn sync(&self, tree: &dyn AccessibleTree, node: NodeId, skip_sync: bool, root: Predicate) -> NodeId {
        if skip_sync {
            return node;
        }
        if let Some(object) = find_node_pre_bounded(tree, node, Direction::Forward, &Predicate::Object, self.max_depth) {
            return object;
        }
        let opts = SearchOptions { root, skip_initial_ancestry: false, max_depth: self.max_depth };
        find_next(tree, node, Direction::Forward, &Predicate::Object, &opts).unwrap_or(node)
    }

    fn direct<H: Host + ?Sized>(
        &mut self,
        cx: &mut DispatchContext<'_, H>,
        command: Command,
        current: &CursorRange,
        range: &CursorRange,
        jump: DirectJump,
    ) -> DispatchOutcome {
        let tree = cx.tree;
        let node = range.start().node();
        let target = match jump {
            DirectJump::Top | DirectJump::Bottom => {
                let root = bounding_root(tree, node, &Predicate::Root, self.max_depth);
                let found = root.and_then(|root| match jump {
                    DirectJump::Top => find_node_post_bounded(tree, root, Direction::Forward, &Predicate::Object, self.max_depth),
                    _ => find_last_node(tree, root, &Predicate::Object),
                });
                let target = found.map(CursorRange::from_node).unwrap_or_else(|| range.clone());
                return self.land(cx, command, current, target, Direction::Forward, false);
            }
            DirectJump::Details => walk_up(tree, node, self.max_depth)
                .find_map(|n| tree.relations(n).and_then(|r| r.details.first().copied()))
                .filter(|&details| tree.contains(details)),
            DirectJump::RowFirstCell | DirectJump::RowLastCell => {
                let direction = if jump == DirectJump::RowLastCell { Direction::Backward } else { Direction::Forward };
                row_of(tree, node, self.max_depth)
                    .and_then(|row| find_node_post_bounded(tree, row, direction, &Predicate::Leaf, self.max_depth))
            }
            DirectJump::FirstCell | DirectJump::LastCell => {
                let direction = if jump == DirectJump::LastCell { Direction::Backward } else { Direction::Forward };
                table_of(tree, node, self.max_depth)
                    .and_then(|table| find_node_post_bounded(tree, table, direction, &Predicate::Leaf, self.max_depth))
            }
        };

        let target = target.map(CursorRange::from_node).unwrap_or_else(|| range.clone());
        self.land(cx, command, current, target, Direction::Forward, true)
    }

    /// Keep moving past static text that labels or describes another node.
    fn skip_label_or_description(&self, tree: &dyn AccessibleTree, mut range: CursorRange, direction: Direction) -> CursorRange {
        let first = range.clone();
        let mut wrapped = range.wrapped();
        for _ in 0..self.max_depth {
            let node = range.start().node();
            if tree.role(node) != Some(Role::StaticText) {
                break;
            }
            let labels = walk_up(tree, node, self.max_depth).any(|n| {
                tree.relations(n).is_some_and(|r| !r.label_for.is_empty() || !r.description_for.is_empty())
            });
            if !labels {
                break;
            }
            tracing::trace!("Skipping label text {:?}", node_text(tree, node));
            range = range.move_by_bounded(tree, CursorUnit::Node, direction, self.max_depth);
            wrapped |= range.wrapped();
            if range.same_position(&first) {
                break;
            }
        }
        range.with_wrapped(wrapped)
    }
}
