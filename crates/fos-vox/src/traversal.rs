//! Tree Traversal
//!
//! Document-order search over a live accessibility tree. Links are read from
//! the tree on every step; nothing is cached between calls, so a search that
//! runs after a mutation sees the mutated tree.
//!
//! Every upward walk is bounded by a maximum depth. A walk that hits the
//! bound stops and falls back to the tree root.

use fos_a11y::{AccessibleTree, NodeId};

use crate::predicate::{should_ignore, Predicate};

/// Default bound on upward walks
pub const MAX_ANCESTOR_DEPTH: usize = 512;

/// Document-order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Options for [`find_next`]
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Bounds the search to the nearest ancestor-or-self matching this
    pub root: Predicate,
    /// Skip ancestors of the start node when moving backward
    pub skip_initial_ancestry: bool,
    pub max_depth: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            root: Predicate::RootOrEditableRoot,
            skip_initial_ancestry: true,
            max_depth: MAX_ANCESTOR_DEPTH,
        }
    }
}

impl SearchOptions {
    pub fn with_root(root: Predicate) -> Self {
        Self { root, ..Self::default() }
    }
}

/// Ancestor-or-self iterator, capped at `max_depth` steps
pub struct WalkUp<'a> {
    tree: &'a dyn AccessibleTree,
    next: Option<NodeId>,
    remaining: usize,
}

impl Iterator for WalkUp<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        if self.remaining == 0 {
            tracing::warn!("Ancestor walk from {} exceeded depth bound", current);
            self.next = None;
            return None;
        }
        self.remaining -= 1;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Walk `node` and its ancestors, nearest first
pub fn walk_up(tree: &dyn AccessibleTree, node: NodeId, max_depth: usize) -> WalkUp<'_> {
    let next = tree.contains(node).then_some(node);
    WalkUp { tree, next, remaining: max_depth.saturating_add(1) }
}

/// Whether `node` is `ancestor` or lies beneath it
pub fn is_descendant_of(tree: &dyn AccessibleTree, node: NodeId, ancestor: NodeId, max_depth: usize) -> bool {
    walk_up(tree, node, max_depth).any(|n| n == ancestor)
}

/// Nearest ancestor-or-self of `start` matching `root`.
///
/// Falls back to the tree root when no ancestor matches within the depth
/// bound. Returns `None` only for a stale `start`.
pub fn bounding_root(tree: &dyn AccessibleTree, start: NodeId, root: &Predicate, max_depth: usize) -> Option<NodeId> {
    if !tree.contains(start) {
        return None;
    }
    walk_up(tree, start, max_depth)
        .find(|&n| root.matches(tree, n))
        .or_else(|| tree.root())
        .or(Some(start))
}

/// Stepper over nodes in (reverse) document order below a root.
///
/// Forward order is pre-order; backward is its exact reverse, so a parent is
/// visited after all of its descendants.
pub struct TreeWalker<'a> {
    tree: &'a dyn AccessibleTree,
    root: NodeId,
    current: NodeId,
    direction: Direction,
    /// Ancestors of the start node strictly below the root
    ancestry: Vec<NodeId>,
    skip_ancestry: bool,
    /// Node whose subtree the first forward step must not enter
    pruned: Option<NodeId>,
    max_depth: usize,
    done: bool,
}

impl<'a> TreeWalker<'a> {
    pub fn new(tree: &'a dyn AccessibleTree, start: NodeId, direction: Direction, root: NodeId) -> Self {
        Self {
            tree,
            root,
            current: start,
            direction,
            ancestry: Vec::new(),
            skip_ancestry: false,
            pruned: None,
            max_depth: MAX_ANCESTOR_DEPTH,
            done: !tree.contains(start),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Do not yield ancestors of the start node
    pub fn skip_initial_ancestry(mut self) -> Self {
        self.skip_ancestry = true;
        self.ancestry = walk_up(self.tree, self.current, self.max_depth)
            .skip(1)
            .take_while(|&n| n != self.root)
            .collect();
        self
    }

    /// Do not descend into the start node
    pub fn prune_start(mut self) -> Self {
        self.pruned = Some(self.current);
        self
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    fn forward(&mut self) -> Option<NodeId> {
        let node = self.current;
        if self.pruned.take() != Some(node) {
            if let Some(child) = self.tree.first_child(node) {
                return Some(child);
            }
        }

        let mut cur = node;
        for _ in 0..=self.max_depth {
            if cur == self.root {
                return None;
            }
            if let Some(sibling) = self.tree.next_sibling(cur) {
                return Some(sibling);
            }
            cur = self.tree.parent(cur)?;
        }
        tracing::warn!("Forward step from {} exceeded depth bound", node);
        None
    }

    fn backward(&mut self) -> Option<NodeId> {
        let node = self.current;
        if node == self.root {
            return None;
        }

        if let Some(sibling) = self.tree.previous_sibling(node) {
            let mut deepest = sibling;
            for _ in 0..self.max_depth {
                match self.tree.last_child(deepest) {
                    Some(child) => deepest = child,
                    None => break,
                }
            }
            return Some(deepest);
        }

        let parent = self.tree.parent(node)?;
        (parent != self.root).then_some(parent)
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            if self.done {
                return None;
            }
            let step = match self.direction {
                Direction::Forward => self.forward(),
                Direction::Backward => self.backward(),
            };
            let Some(node) = step else {
                self.done = true;
                return None;
            };
            self.current = node;
            tracing::trace!("Walker at {}", node);

            if self.skip_ancestry && self.ancestry.contains(&node) {
                continue;
            }
            return Some(node);
        }
    }
}

/// First node after (or before) `start` in document order that satisfies
/// `pred` and is not ignored.
///
/// The search stays strictly below the nearest ancestor-or-self of `start`
/// matching `opts.root`; that root itself is never returned. Going forward,
/// a start node that already satisfies `pred` and is not a container is not
/// descended into.
pub fn find_next(
    tree: &dyn AccessibleTree,
    start: NodeId,
    direction: Direction,
    pred: &Predicate,
    opts: &SearchOptions,
) -> Option<NodeId> {
    let root = bounding_root(tree, start, &opts.root, opts.max_depth)?;
    let mut walker = TreeWalker::new(tree, start, direction, root).with_max_depth(opts.max_depth);
    if opts.skip_initial_ancestry {
        walker = walker.skip_initial_ancestry();
    }
    if direction == Direction::Forward
        && pred.matches(tree, start)
        && !tree.role(start).is_some_and(|r| r.is_container())
    {
        walker = walker.prune_start();
    }

    let found = walker.into_iter().find(|&n| pred.matches(tree, n) && !should_ignore(tree, n));
    tracing::trace!("find_next from {} ({:?}) -> {:?}", start, direction, found);
    found
}

/// Pre-order search of `root`'s subtree, `root` included. Backward visits
/// children last-to-first.
pub fn find_node_pre(tree: &dyn AccessibleTree, root: NodeId, direction: Direction, pred: &Predicate) -> Option<NodeId> {
    find_node_pre_bounded(tree, root, direction, pred, MAX_ANCESTOR_DEPTH)
}

pub fn find_node_pre_bounded(
    tree: &dyn AccessibleTree,
    root: NodeId,
    direction: Direction,
    pred: &Predicate,
    max_depth: usize,
) -> Option<NodeId> {
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        if pred.matches(tree, node) && !should_ignore(tree, node) {
            return Some(node);
        }
        if depth >= max_depth {
            tracing::warn!("Pre-order search below {} exceeded depth bound", root);
            continue;
        }
        let children = tree.children(node);
        // Stack pops in reverse push order.
        match direction {
            Direction::Forward => stack.extend(children.into_iter().rev().map(|c| (c, depth + 1))),
            Direction::Backward => stack.extend(children.into_iter().map(|c| (c, depth + 1))),
        }
    }
    None
}

/// Post-order search of `root`'s subtree, `root` included. Backward visits
/// children last-to-first, which yields reverse document order.
pub fn find_node_post(tree: &dyn AccessibleTree, root: NodeId, direction: Direction, pred: &Predicate) -> Option<NodeId> {
    find_node_post_bounded(tree, root, direction, pred, MAX_ANCESTOR_DEPTH)
}

pub fn find_node_post_bounded(
    tree: &dyn AccessibleTree,
    root: NodeId,
    direction: Direction,
    pred: &Predicate,
    max_depth: usize,
) -> Option<NodeId> {
    post_order(tree, root, direction, pred, max_depth)
}

fn post_order(
    tree: &dyn AccessibleTree,
    node: NodeId,
    direction: Direction,
    pred: &Predicate,
    depth_left: usize,
) -> Option<NodeId> {
    if depth_left > 0 {
        let mut children = tree.children(node);
        if direction == Direction::Backward {
            children.reverse();
        }
        for child in children {
            if let Some(found) = post_order(tree, child, direction, pred, depth_left - 1) {
                return Some(found);
            }
        }
    } else {
        tracing::warn!("Post-order search at {} exceeded depth bound", node);
    }

    (pred.matches(tree, node) && !should_ignore(tree, node)).then_some(node)
}

/// Last node in document order under `root` (root included) satisfying `pred`
pub fn find_last_node(tree: &dyn AccessibleTree, root: NodeId, pred: &Predicate) -> Option<NodeId> {
    find_node_post(tree, root, Direction::Backward, pred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_a11y::{AccessibilityTree, Role, State};

    /// root
    /// ├── a (group)
    /// │   ├── a1 (text)
    /// │   └── a2 (text)
    /// └── b (group)
    ///     └── b1 (text)
    fn sample() -> (AccessibilityTree, [NodeId; 6]) {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let a = tree.add_node(Role::Group, root).unwrap();
        let a1 = tree.add_node(Role::StaticText, a).unwrap();
        let a2 = tree.add_node(Role::StaticText, a).unwrap();
        let b = tree.add_node(Role::Group, root).unwrap();
        let b1 = tree.add_node(Role::StaticText, b).unwrap();
        for (node, name) in [(a1, "one"), (a2, "two"), (b1, "three")] {
            tree.set_name(node, name).unwrap();
        }
        (tree, [root, a, a1, a2, b, b1])
    }

    #[test]
    fn test_walker_orders() {
        let (tree, [root, a, a1, a2, b, b1]) = sample();
        let forward: Vec<_> = TreeWalker::new(&tree, root, Direction::Forward, root).collect();
        assert_eq!(forward, vec![a, a1, a2, b, b1]);

        let backward: Vec<_> = TreeWalker::new(&tree, b1, Direction::Backward, root).collect();
        assert_eq!(backward, vec![b, a2, a1, a]);

        let skipping: Vec<_> = TreeWalker::new(&tree, b1, Direction::Backward, root)
            .skip_initial_ancestry()
            .collect();
        assert_eq!(skipping, vec![a2, a1, a]);
    }

    #[test]
    fn test_find_next() {
        let (tree, [_, a, a1, a2, b, b1]) = sample();
        let opts = SearchOptions::default();
        assert_eq!(find_next(&tree, a1, Direction::Forward, &Predicate::Object, &opts), Some(a2));
        assert_eq!(find_next(&tree, a2, Direction::Forward, &Predicate::Object, &opts), Some(b1));
        assert_eq!(find_next(&tree, b1, Direction::Forward, &Predicate::Object, &opts), None);
        assert_eq!(find_next(&tree, b1, Direction::Backward, &Predicate::Object, &opts), Some(a2));

        let group = Predicate::role(Role::Group);
        assert_eq!(find_next(&tree, b1, Direction::Backward, &group, &opts), Some(a));
        let keep_ancestry = SearchOptions { skip_initial_ancestry: false, ..opts };
        assert_eq!(find_next(&tree, b1, Direction::Backward, &group, &keep_ancestry), Some(b));
    }

    #[test]
    fn test_root_never_returned() {
        let (tree, [root, ..]) = sample();
        let any = Predicate::Custom(|_, _| true);
        let opts = SearchOptions::default();
        assert_ne!(find_next(&tree, root, Direction::Forward, &any, &opts), Some(root));
        assert_eq!(find_next(&tree, root, Direction::Backward, &any, &opts), None);
    }

    #[test]
    fn test_matching_leaf_is_pruned() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let button = tree.add_node(Role::Button, root).unwrap();
        tree.set_state(button, State::Focusable, true).unwrap();
        let label = tree.add_node(Role::StaticText, button).unwrap();
        tree.set_name(label, "Go").unwrap();
        let after = tree.add_node(Role::StaticText, root).unwrap();
        tree.set_name(after, "after").unwrap();

        let opts = SearchOptions::default();
        assert_eq!(find_next(&tree, button, Direction::Forward, &Predicate::Object, &opts), Some(after));
    }

    #[test]
    fn test_stale_start() {
        let (mut tree, [_, a, a1, ..]) = sample();
        tree.remove_subtree(a).unwrap();
        assert_eq!(find_next(&tree, a1, Direction::Forward, &Predicate::Object, &SearchOptions::default()), None);
        assert!(bounding_root(&tree, a1, &Predicate::Root, 8).is_none());
    }

    #[test]
    fn test_search_sees_mutations() {
        let (mut tree, [_, _, a1, a2, b, _]) = sample();
        let opts = SearchOptions::default();
        let inserted = tree.insert_node(Role::Button, b, 0).unwrap();
        tree.set_state(inserted, State::Focusable, true).unwrap();
        assert_eq!(find_next(&tree, a2, Direction::Forward, &Predicate::Object, &opts), Some(inserted));
        tree.remove_subtree(a2).unwrap();
        assert_eq!(find_next(&tree, a1, Direction::Forward, &Predicate::Object, &opts), Some(inserted));
    }

    #[test]
    fn test_pre_and_post_order() {
        let (tree, [root, a, a1, _, b, b1]) = sample();
        let group = Predicate::role(Role::Group);
        assert_eq!(find_node_pre(&tree, root, Direction::Forward, &group), Some(a));
        assert_eq!(find_node_pre(&tree, root, Direction::Backward, &group), Some(b));
        assert_eq!(find_node_post(&tree, root, Direction::Forward, &Predicate::Object), Some(a1));
        assert_eq!(find_last_node(&tree, root, &Predicate::Object), Some(b1));
        assert_eq!(find_last_node(&tree, root, &group), Some(b));
    }

    #[test]
    fn test_depth_bound_falls_back_to_tree_root() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let mut node = root;
        for _ in 0..20 {
            node = tree.add_node(Role::Group, node).unwrap();
        }
        assert_eq!(walk_up(&tree, node, 5).count(), 6);
        assert_eq!(bounding_root(&tree, node, &Predicate::Root, 5), Some(root));
        assert!(is_descendant_of(&tree, node, root, 64));
        assert!(!is_descendant_of(&tree, node, root, 5));
    }
}
