//! Table Cell Navigation
//!
//! Cells carry row/column indices and spans. Moving between rows or columns
//! has to account for cells that span several of either, so the cell
//! predicate captures the span of the starting cell and compares ranges.

use fos_a11y::{AccessibleTree, Attribute, NodeId, Role};

use crate::predicate::Predicate;
use crate::traversal::{walk_up, Direction};

/// Table axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Col,
}

/// Inclusive index range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub first: u32,
    pub last: u32,
}

impl Span {
    /// Span starting at `start` covering `len` indices (at least one)
    pub fn new(start: u32, len: u32) -> Self {
        Self { first: start, last: start + len.max(1) - 1 }
    }

    pub fn contains(&self, index: u32) -> bool {
        self.first <= index && index <= self.last
    }

    pub fn intersects(&self, other: &Span) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// Row and column spans of a cell-like node
pub fn cell_spans(tree: &dyn AccessibleTree, node: NodeId) -> Option<(Span, Span)> {
    if !tree.role(node)?.is_cell_like() {
        return None;
    }
    let row = tree.int_attribute(node, Attribute::TableCellRowIndex)?;
    let col = tree.int_attribute(node, Attribute::TableCellColumnIndex)?;
    if row < 0 || col < 0 {
        return None;
    }
    let row_span = tree.int_attribute(node, Attribute::TableCellRowSpan).unwrap_or(1).max(1);
    let col_span = tree.int_attribute(node, Attribute::TableCellColumnSpan).unwrap_or(1).max(1);
    Some((Span::new(row as u32, row_span as u32), Span::new(col as u32, col_span as u32)))
}

/// Innermost table (inclusive) around `node`
pub fn table_of(tree: &dyn AccessibleTree, node: NodeId, max_depth: usize) -> Option<NodeId> {
    walk_up(tree, node, max_depth).find(|&n| Predicate::Table.matches(tree, n))
}

/// Innermost row (inclusive) around `node`
pub fn row_of(tree: &dyn AccessibleTree, node: NodeId, max_depth: usize) -> Option<NodeId> {
    walk_up(tree, node, max_depth).find(|&n| tree.role(n) == Some(Role::Row))
}

/// Innermost cell-like node (inclusive) around `node`, stopping at the table
pub fn cell_of(tree: &dyn AccessibleTree, node: NodeId, max_depth: usize) -> Option<NodeId> {
    walk_up(tree, node, max_depth)
        .take_while(|&n| !Predicate::Table.matches(tree, n))
        .find(|&n| tree.role(n).is_some_and(|r| r.is_cell_like()))
}

/// Cell matcher relative to a starting cell's spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCellPredicate {
    axis: Axis,
    direction: Direction,
    want_end: bool,
    rows: Span,
    cols: Span,
}

impl TableCellPredicate {
    /// Predicate relative to the cell containing `start`.
    ///
    /// Returns `None` when `start` is not inside an indexed cell of a table.
    pub fn from_node(
        tree: &dyn AccessibleTree,
        start: NodeId,
        axis: Axis,
        direction: Direction,
        want_end: bool,
        max_depth: usize,
    ) -> Option<Self> {
        table_of(tree, start, max_depth)?;
        let cell = cell_of(tree, start, max_depth)?;
        let (rows, cols) = cell_spans(tree, cell)?;
        Some(Self { axis, direction, want_end, rows, cols })
    }

    /// Cell in the row below
    pub fn next_row(tree: &dyn AccessibleTree, start: NodeId, max_depth: usize) -> Option<Self> {
        Self::from_node(tree, start, Axis::Row, Direction::Forward, false, max_depth)
    }

    pub fn previous_row(tree: &dyn AccessibleTree, start: NodeId, max_depth: usize) -> Option<Self> {
        Self::from_node(tree, start, Axis::Row, Direction::Backward, false, max_depth)
    }

    pub fn next_col(tree: &dyn AccessibleTree, start: NodeId, max_depth: usize) -> Option<Self> {
        Self::from_node(tree, start, Axis::Col, Direction::Forward, false, max_depth)
    }

    pub fn previous_col(tree: &dyn AccessibleTree, start: NodeId, max_depth: usize) -> Option<Self> {
        Self::from_node(tree, start, Axis::Col, Direction::Backward, false, max_depth)
    }

    /// Any cell in the starting cell's column; used to land on the first or
    /// last cell of a column.
    pub fn column_end(
        tree: &dyn AccessibleTree,
        start: NodeId,
        direction: Direction,
        max_depth: usize,
    ) -> Option<Self> {
        Self::from_node(tree, start, Axis::Col, direction, true, max_depth)
    }

    pub fn matches(&self, tree: &dyn AccessibleTree, node: NodeId) -> bool {
        let Some((rows, cols)) = cell_spans(tree, node) else {
            return false;
        };

        if self.want_end {
            return match self.axis {
                Axis::Col => cols.contains(self.cols.first),
                Axis::Row => rows.contains(self.rows.first),
            };
        }

        match (self.axis, self.direction) {
            (Axis::Row, Direction::Forward) => rows.contains(self.rows.last + 1) && cols.intersects(&self.cols),
            (Axis::Row, Direction::Backward) => {
                self.rows.first > 0 && rows.contains(self.rows.first - 1) && cols.intersects(&self.cols)
            }
            (Axis::Col, Direction::Forward) => cols.contains(self.cols.last + 1) && rows.intersects(&self.rows),
            (Axis::Col, Direction::Backward) => {
                self.cols.first > 0 && cols.contains(self.cols.first - 1) && rows.intersects(&self.rows)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_a11y::AccessibilityTree;

    fn cell(tree: &mut AccessibilityTree, row: NodeId, r: i32, c: i32, rs: i32, cs: i32) -> NodeId {
        let id = tree.add_node(Role::Cell, row).unwrap();
        tree.set_attribute(id, Attribute::TableCellRowIndex, r).unwrap();
        tree.set_attribute(id, Attribute::TableCellColumnIndex, c).unwrap();
        tree.set_attribute(id, Attribute::TableCellRowSpan, rs).unwrap();
        tree.set_attribute(id, Attribute::TableCellColumnSpan, cs).unwrap();
        id
    }

    #[test]
    fn test_span() {
        let span = Span::new(2, 3);
        assert_eq!(span.last, 4);
        assert!(span.contains(2) && span.contains(4) && !span.contains(5));
        assert!(span.intersects(&Span::new(4, 1)));
        assert!(!span.intersects(&Span::new(5, 2)));
        assert_eq!(Span::new(1, 0), Span::new(1, 1));
    }

    #[test]
    fn test_row_below_respects_spans() {
        // r0: [a  a] [b]
        // r1: [c] [d] [e]
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let table = tree.add_node(Role::Table, root).unwrap();
        let r0 = tree.add_node(Role::Row, table).unwrap();
        let r1 = tree.add_node(Role::Row, table).unwrap();
        let a = cell(&mut tree, r0, 0, 0, 1, 2);
        let b = cell(&mut tree, r0, 0, 2, 1, 1);
        let c = cell(&mut tree, r1, 1, 0, 1, 1);
        let d = cell(&mut tree, r1, 1, 1, 1, 1);
        let e = cell(&mut tree, r1, 1, 2, 1, 1);

        let below_a = TableCellPredicate::next_row(&tree, a, 64).unwrap();
        assert!(below_a.matches(&tree, c));
        assert!(below_a.matches(&tree, d));
        assert!(!below_a.matches(&tree, e));

        let above_e = TableCellPredicate::previous_row(&tree, e, 64).unwrap();
        assert!(above_e.matches(&tree, b));
        assert!(!above_e.matches(&tree, a));

        let above_d = TableCellPredicate::previous_row(&tree, d, 64).unwrap();
        assert!(above_d.matches(&tree, a));

        let left_of_b = TableCellPredicate::previous_col(&tree, b, 64).unwrap();
        assert!(left_of_b.matches(&tree, a));
        assert!(!TableCellPredicate::previous_col(&tree, a, 64).unwrap().matches(&tree, a));
    }

    #[test]
    fn test_column_end() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let table = tree.add_node(Role::Grid, root).unwrap();
        let r0 = tree.add_node(Role::Row, table).unwrap();
        let r1 = tree.add_node(Role::Row, table).unwrap();
        let wide = cell(&mut tree, r0, 0, 0, 1, 2);
        let right = cell(&mut tree, r1, 1, 1, 1, 1);

        let pred = TableCellPredicate::column_end(&tree, right, Direction::Backward, 64).unwrap();
        assert!(pred.matches(&tree, wide));
        assert!(pred.matches(&tree, right));
    }

    #[test]
    fn test_outside_table() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let text = tree.add_node(Role::StaticText, root).unwrap();
        assert!(TableCellPredicate::next_row(&tree, text, 64).is_none());
        assert!(cell_spans(&tree, text).is_none());
    }
}
