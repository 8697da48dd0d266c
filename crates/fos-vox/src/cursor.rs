//! Cursors and Ranges
//!
//! A cursor is a position within a node: a character offset into the
//! node's text, or the whole node. A range is a pair of cursors, immutable
//! once built; every movement produces a new range.

use fos_a11y::{AccessibleTree, NodeId};

use crate::predicate::{is_text_leaf, node_text, Predicate};
use crate::traversal::{
    bounding_root, find_last_node, find_next, find_node_pre_bounded, walk_up, Direction, SearchOptions,
    MAX_ANCESTOR_DEPTH,
};

/// Index denoting the whole node rather than an offset
pub const WHOLE_NODE: i32 = -1;

/// Movement granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorUnit {
    Character,
    Word,
    Line,
    Node,
}

/// Position within a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    node: NodeId,
    index: i32,
}

impl Cursor {
    pub fn new(node: NodeId, index: i32) -> Self {
        Self { node, index: index.max(WHOLE_NODE) }
    }

    pub fn from_node(node: NodeId) -> Self {
        Self::new(node, WHOLE_NODE)
    }

    pub fn node(&self) -> NodeId { self.node }

    pub fn index(&self) -> i32 { self.index }

    pub fn is_whole_node(&self) -> bool {
        self.index == WHOLE_NODE
    }

    pub fn is_valid(&self, tree: &dyn AccessibleTree) -> bool {
        tree.contains(self.node)
    }
}

/// Pair of cursors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorRange {
    start: Cursor,
    end: Cursor,
    wrapped: bool,
}

impl CursorRange {
    pub fn new(start: Cursor, end: Cursor) -> Self {
        Self { start, end, wrapped: false }
    }

    /// Range spanning one whole node
    pub fn from_node(node: NodeId) -> Self {
        let cursor = Cursor::from_node(node);
        Self::new(cursor, cursor)
    }

    pub fn start(&self) -> Cursor { self.start }

    pub fn end(&self) -> Cursor { self.end }

    /// Whether the move that produced this range wrapped past a document edge
    pub fn wrapped(&self) -> bool { self.wrapped }

    pub fn with_wrapped(mut self, wrapped: bool) -> Self {
        self.wrapped = wrapped;
        self
    }

    /// Leading edge in `direction`
    pub fn bound(&self, direction: Direction) -> Cursor {
        match direction {
            Direction::Forward => self.end,
            Direction::Backward => self.start,
        }
    }

    pub fn is_valid(&self, tree: &dyn AccessibleTree) -> bool {
        self.start.is_valid(tree) && self.end.is_valid(tree)
    }

    /// Same start and end, ignoring the wrap flag
    pub fn same_position(&self, other: &CursorRange) -> bool {
        self.start == other.start && self.end == other.end
    }

    pub fn move_by(&self, tree: &dyn AccessibleTree, unit: CursorUnit, direction: Direction) -> CursorRange {
        self.move_by_bounded(tree, unit, direction, MAX_ANCESTOR_DEPTH)
    }

    /// Move by `unit`. Node movement wraps at document edges; the finer
    /// units stop there and return the range unchanged.
    pub fn move_by_bounded(
        &self,
        tree: &dyn AccessibleTree,
        unit: CursorUnit,
        direction: Direction,
        max_depth: usize,
    ) -> CursorRange {
        let opts = SearchOptions { root: Predicate::Root, skip_initial_ancestry: true, max_depth };
        let moved = match unit {
            CursorUnit::Character => move_character(tree, self.start, direction, &opts),
            CursorUnit::Word => move_word(tree, self.start, direction, &opts),
            CursorUnit::Line => move_line(tree, self, direction, &opts),
            CursorUnit::Node => move_node(tree, self, direction, &opts),
        };
        moved.unwrap_or_else(|| self.clone().with_wrapped(false))
    }
}

fn char_range(node: NodeId, index: i32) -> CursorRange {
    CursorRange::new(Cursor::new(node, index), Cursor::new(node, index + 1))
}

fn char_count(tree: &dyn AccessibleTree, node: NodeId) -> i32 {
    node_text(tree, node).chars().count() as i32
}

/// Character spans `[start, end)` of whitespace-separated words
fn word_spans(text: &str) -> Vec<(i32, i32)> {
    let mut spans = Vec::new();
    let mut start = None;
    let mut count = 0;
    for (i, ch) in text.chars().enumerate() {
        let i = i as i32;
        match (ch.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
        count = i + 1;
    }
    if let Some(s) = start {
        spans.push((s, count));
    }
    spans
}

fn adjacent_text_leaf(tree: &dyn AccessibleTree, node: NodeId, direction: Direction, opts: &SearchOptions) -> Option<NodeId> {
    find_next(tree, node, direction, &Predicate::Custom(is_text_leaf), opts)
}

fn move_character(tree: &dyn AccessibleTree, start: Cursor, direction: Direction, opts: &SearchOptions) -> Option<CursorRange> {
    let node = start.node();
    let len = char_count(tree, node);
    match direction {
        Direction::Forward => {
            let next = start.index() + 1;
            if next < len {
                return Some(char_range(node, next));
            }
            adjacent_text_leaf(tree, node, direction, opts).map(|leaf| char_range(leaf, 0))
        }
        Direction::Backward => {
            if start.index() > 0 {
                return Some(char_range(node, (start.index() - 1).min(len - 1)));
            }
            let leaf = adjacent_text_leaf(tree, node, direction, opts)?;
            Some(char_range(leaf, char_count(tree, leaf) - 1))
        }
    }
}

fn move_word(tree: &dyn AccessibleTree, start: Cursor, direction: Direction, opts: &SearchOptions) -> Option<CursorRange> {
    let node = start.node();
    let spans = word_spans(&node_text(tree, node));
    let here = match direction {
        Direction::Forward => spans.iter().find(|(s, _)| *s > start.index()),
        Direction::Backward => {
            let index = start.index().max(0);
            spans.iter().rev().find(|(s, _)| *s < index)
        }
    };
    if let Some(&(s, e)) = here {
        return Some(CursorRange::new(Cursor::new(node, s), Cursor::new(node, e)));
    }

    let mut cur = node;
    loop {
        cur = adjacent_text_leaf(tree, cur, direction, opts)?;
        let spans = word_spans(&node_text(tree, cur));
        let word = match direction {
            Direction::Forward => spans.first(),
            Direction::Backward => spans.last(),
        };
        if let Some(&(s, e)) = word {
            return Some(CursorRange::new(Cursor::new(cur, s), Cursor::new(cur, e)));
        }
    }
}

/// Nearest block ancestor-or-self; objects sharing it form one line.
pub fn line_container(tree: &dyn AccessibleTree, node: NodeId, max_depth: usize) -> NodeId {
    walk_up(tree, node, max_depth)
        .find(|&n| tree.role(n).is_some_and(|r| r.is_block()))
        .or_else(|| tree.root())
        .unwrap_or(node)
}

fn move_line(tree: &dyn AccessibleTree, range: &CursorRange, direction: Direction, opts: &SearchOptions) -> Option<CursorRange> {
    let anchor = range.bound(direction).node();
    let container = line_container(tree, anchor, opts.max_depth);

    let mut cur = anchor;
    let near = loop {
        cur = find_next(tree, cur, direction, &Predicate::Object, opts)?;
        if line_container(tree, cur, opts.max_depth) != container {
            break cur;
        }
    };

    let line = line_container(tree, near, opts.max_depth);
    let mut far = near;
    while let Some(next) = find_next(tree, far, direction, &Predicate::Object, opts) {
        if line_container(tree, next, opts.max_depth) != line {
            break;
        }
        far = next;
    }

    let (first, last) = match direction {
        Direction::Forward => (near, far),
        Direction::Backward => (far, near),
    };
    Some(CursorRange::new(Cursor::from_node(first), Cursor::from_node(last)))
}

fn move_node(tree: &dyn AccessibleTree, range: &CursorRange, direction: Direction, opts: &SearchOptions) -> Option<CursorRange> {
    let bound = range.bound(direction).node();
    if let Some(next) = find_next(tree, bound, direction, &Predicate::Object, opts) {
        return Some(CursorRange::from_node(next));
    }

    let root = bounding_root(tree, bound, &Predicate::Root, opts.max_depth)?;
    let wrapped = match direction {
        Direction::Forward => find_node_pre_bounded(tree, root, direction, &Predicate::Object, opts.max_depth),
        Direction::Backward => find_last_node(tree, root, &Predicate::Object),
    }?;
    tracing::trace!("Node move wrapped to {}", wrapped);
    Some(CursorRange::from_node(wrapped).with_wrapped(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_a11y::{AccessibilityTree, Role};

    /// root
    /// ├── p1 (paragraph): "hello world", "again"
    /// └── p2 (paragraph): "last line"
    fn text_page() -> (AccessibilityTree, [NodeId; 3]) {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let p1 = tree.add_node(Role::Paragraph, root).unwrap();
        let p2 = tree.add_node(Role::Paragraph, root).unwrap();
        let t1 = tree.add_node(Role::StaticText, p1).unwrap();
        let t2 = tree.add_node(Role::StaticText, p1).unwrap();
        let t3 = tree.add_node(Role::StaticText, p2).unwrap();
        tree.set_name(t1, "hello world").unwrap();
        tree.set_name(t2, "again").unwrap();
        tree.set_name(t3, "last line").unwrap();
        (tree, [t1, t2, t3])
    }

    #[test]
    fn test_word_spans() {
        assert_eq!(word_spans("  hello   big world"), vec![(2, 7), (10, 13), (14, 19)]);
        assert!(word_spans("   ").is_empty());
    }

    #[test]
    fn test_bound() {
        let (_, [t1, t2, _]) = text_page();
        let range = CursorRange::new(Cursor::from_node(t1), Cursor::from_node(t2));
        assert_eq!(range.bound(Direction::Forward).node(), t2);
        assert_eq!(range.bound(Direction::Backward).node(), t1);
    }

    #[test]
    fn test_character_moves_cross_leaves() {
        let (tree, [t1, t2, _]) = text_page();
        let range = char_range(t1, 10);
        let next = range.move_by(&tree, CursorUnit::Character, Direction::Forward);
        assert_eq!(next.start(), Cursor::new(t2, 0));

        let back = next.move_by(&tree, CursorUnit::Character, Direction::Backward);
        assert_eq!(back.start(), Cursor::new(t1, 10));

        let from_whole = CursorRange::from_node(t1).move_by(&tree, CursorUnit::Character, Direction::Forward);
        assert_eq!(from_whole.start(), Cursor::new(t1, 0));
    }

    #[test]
    fn test_word_moves() {
        let (tree, [t1, t2, _]) = text_page();
        let first = CursorRange::from_node(t1).move_by(&tree, CursorUnit::Word, Direction::Forward);
        assert_eq!((first.start(), first.end()), (Cursor::new(t1, 0), Cursor::new(t1, 5)));

        let second = first.move_by(&tree, CursorUnit::Word, Direction::Forward);
        assert_eq!(second.start(), Cursor::new(t1, 6));

        let third = second.move_by(&tree, CursorUnit::Word, Direction::Forward);
        assert_eq!(third.start(), Cursor::new(t2, 0));

        let back = third.move_by(&tree, CursorUnit::Word, Direction::Backward);
        assert_eq!(back.start(), Cursor::new(t1, 6));
    }

    #[test]
    fn test_line_moves() {
        let (tree, [t1, t2, t3]) = text_page();
        let next = CursorRange::from_node(t1).move_by(&tree, CursorUnit::Line, Direction::Forward);
        assert_eq!((next.start().node(), next.end().node()), (t3, t3));

        let back = next.move_by(&tree, CursorUnit::Line, Direction::Backward);
        assert_eq!((back.start().node(), back.end().node()), (t1, t2));

        // No line before the first one.
        let stuck = back.move_by(&tree, CursorUnit::Line, Direction::Backward);
        assert!(stuck.same_position(&back));
        assert!(!stuck.wrapped());
    }

    #[test]
    fn test_node_moves_wrap() {
        let (tree, [t1, t2, t3]) = text_page();
        let next = CursorRange::from_node(t2).move_by(&tree, CursorUnit::Node, Direction::Forward);
        assert_eq!(next.start().node(), t3);
        assert!(!next.wrapped());

        let wrapped = next.move_by(&tree, CursorUnit::Node, Direction::Forward);
        assert_eq!(wrapped.start().node(), t1);
        assert!(wrapped.wrapped());

        let back = wrapped.move_by(&tree, CursorUnit::Node, Direction::Backward);
        assert_eq!(back.start().node(), t3);
        assert!(back.wrapped());
    }

    #[test]
    fn test_same_position_ignores_wrap() {
        let (tree, [t1, ..]) = text_page();
        let a = CursorRange::from_node(t1);
        let b = a.clone().with_wrapped(true);
        assert!(a.same_position(&b));
        assert_ne!(a, b);
        assert!(a.is_valid(&tree));
    }
}
