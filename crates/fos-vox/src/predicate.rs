//! Node Predicates
//!
//! Stateless tests over tree nodes used to drive searches. Parameterized
//! predicates capture plain data (a role set, a heading level, table cell
//! coordinates) so they can be re-invoked any number of times per traversal.

use fos_a11y::{AccessibleTree, Attribute, NodeId, Role, RoleSet, State};

use crate::table::TableCellPredicate;
use crate::traversal::walk_up;

/// Free-form node test
pub type NodeTest = fn(&dyn AccessibleTree, NodeId) -> bool;

const BUTTON_ROLES: RoleSet = RoleSet::of(&[Role::Button, Role::ToggleButton]);
const CHECKBOX_ROLES: RoleSet = RoleSet::of(&[Role::CheckBox, Role::Switch]);
const TABLE_ROLES: RoleSet = RoleSet::of(&[Role::Table, Role::Grid]);

const FORM_FIELD_ROLES: RoleSet = RoleSet::of(&[
    Role::Button, Role::CheckBox, Role::ComboBox, Role::ListBox, Role::MenuListPopup,
    Role::RadioButton, Role::SearchBox, Role::Slider, Role::SpinButton, Role::Switch,
    Role::TextField, Role::ToggleButton,
]);

const GROUP_ROLES: RoleSet = RoleSet::of(&[
    Role::Article, Role::Dialog, Role::Figure, Role::Grid, Role::Group, Role::Heading,
    Role::List, Role::Paragraph, Role::Table, Role::Toolbar,
]);

/// Roles walked past when deriving the role for a same-role jump
const IGNORE_DURING_JUMP: RoleSet = RoleSet::of(&[
    Role::GenericContainer, Role::StaticText, Role::InlineTextBox, Role::LineBreak,
]);

/// Search predicate
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// Any of a set of roles
    Roles(RoleSet),
    /// Heading, optionally of one level (1-6)
    Heading(Option<u8>),
    Link,
    VisitedLink,
    Button,
    CheckBox,
    ComboBox,
    EditText,
    FormField,
    Image,
    Table,
    Landmark,
    Group,
    Invalid,
    /// Lists other than the innermost list around the origin
    List { exclude: Option<NodeId> },
    TableCell(TableCellPredicate),
    /// Renderable, speakable node
    Object,
    Leaf,
    Root,
    EditableRoot,
    RootOrEditableRoot,
    Row,
    CellLike,
    Custom(NodeTest),
}

impl Predicate {
    pub fn role(role: Role) -> Self {
        Self::Roles(RoleSet::single(role))
    }

    /// List predicate relative to `origin`
    pub fn list_from(tree: &dyn AccessibleTree, origin: NodeId, max_depth: usize) -> Self {
        let exclude = walk_up(tree, origin, max_depth).find(|&n| tree.role(n) == Some(Role::List));
        Self::List { exclude }
    }

    /// Same-role predicate: skips wrapper roles upward from `origin` and
    /// matches the first role found. The walk is capped at `max_depth`.
    pub fn similar_to(tree: &dyn AccessibleTree, origin: NodeId, max_depth: usize) -> Option<Self> {
        let effective = walk_up(tree, origin, max_depth)
            .find(|&n| !ignore_during_jump(tree, n))
            .unwrap_or(origin);
        tree.role(effective).map(Self::role)
    }

    pub fn matches(&self, tree: &dyn AccessibleTree, node: NodeId) -> bool {
        let Some(role) = tree.role(node) else {
            return false;
        };

        match self {
            Self::Roles(set) => set.contains(role),
            Self::Heading(level) => {
                role == Role::Heading
                    && level.is_none_or(|l| {
                        tree.int_attribute(node, Attribute::HierarchicalLevel) == Some(l as i32)
                    })
            }
            Self::Link => role == Role::Link,
            Self::VisitedLink => role == Role::Link && tree.has_state(node, State::Visited),
            Self::Button => BUTTON_ROLES.contains(role),
            Self::CheckBox => CHECKBOX_ROLES.contains(role),
            Self::ComboBox => role == Role::ComboBox,
            Self::EditText => is_edit_text(tree, node, role),
            Self::FormField => FORM_FIELD_ROLES.contains(role) || is_edit_text(tree, node, role),
            Self::Image => role == Role::Image,
            Self::Table => TABLE_ROLES.contains(role),
            Self::Landmark => role.is_landmark(),
            Self::Group => GROUP_ROLES.contains(role) || role.is_landmark(),
            Self::Invalid => tree.has_state(node, State::Invalid),
            Self::List { exclude } => role == Role::List && Some(node) != *exclude,
            Self::TableCell(cell) => cell.matches(tree, node),
            Self::Object => is_object(tree, node, role),
            Self::Leaf => is_leaf(tree, node, role),
            Self::Root => is_root(tree, node, role),
            Self::EditableRoot => is_editable_root(tree, node),
            Self::RootOrEditableRoot => is_root(tree, node, role) || is_editable_root(tree, node),
            Self::Row => role == Role::Row,
            Self::CellLike => role.is_cell_like(),
            Self::Custom(test) => test(tree, node),
        }
    }
}

/// Nodes never returned from a search
pub fn should_ignore(tree: &dyn AccessibleTree, node: NodeId) -> bool {
    match tree.role(node) {
        None | Some(Role::Presentation) => true,
        Some(_) => tree.has_state(node, State::Invisible),
    }
}

pub fn ignore_during_jump(tree: &dyn AccessibleTree, node: NodeId) -> bool {
    tree.role(node).is_some_and(|r| IGNORE_DURING_JUMP.contains(r))
}

/// Name, falling back to value
pub fn node_text(tree: &dyn AccessibleTree, node: NodeId) -> String {
    tree.name(node)
        .filter(|s| !s.is_empty())
        .or_else(|| tree.attribute(node, Attribute::Value).and_then(|v| v.as_str().map(String::from)))
        .unwrap_or_default()
}

/// Leaf carrying text; the unit for character and word movement.
pub fn is_text_leaf(tree: &dyn AccessibleTree, node: NodeId) -> bool {
    match tree.role(node) {
        Some(role) => is_leaf(tree, node, role) && !node_text(tree, node).is_empty(),
        None => false,
    }
}

/// Whether outputting `node` would say anything: text, or a role that is
/// announced on its own.
pub fn has_output(tree: &dyn AccessibleTree, node: NodeId) -> bool {
    match tree.role(node) {
        Some(role) => role.is_widget() || role.is_leaf_like() || !node_text(tree, node).is_empty(),
        None => false,
    }
}

fn is_leaf(tree: &dyn AccessibleTree, node: NodeId, role: Role) -> bool {
    role.is_leaf_like() || role == Role::StaticText || tree.first_child(node).is_none()
}

fn is_object(tree: &dyn AccessibleTree, node: NodeId, role: Role) -> bool {
    if should_ignore(tree, node) || role.is_container() || role == Role::InlineTextBox {
        return false;
    }
    if tree.has_state(node, State::Focusable) {
        return true;
    }
    is_leaf(tree, node, role) && (role.is_leaf_like() || !node_text(tree, node).is_empty())
}

fn is_root(tree: &dyn AccessibleTree, node: NodeId, role: Role) -> bool {
    role.is_root() || tree.parent(node).is_none()
}

fn is_editable_root(tree: &dyn AccessibleTree, node: NodeId) -> bool {
    let rich = |n: NodeId| tree.has_state(n, State::RichlyEditable) && tree.has_state(n, State::Editable);
    rich(node) && !tree.parent(node).is_some_and(rich)
}

fn is_edit_text(tree: &dyn AccessibleTree, node: NodeId, role: Role) -> bool {
    if matches!(role, Role::TextField | Role::SearchBox) {
        return true;
    }
    tree.has_state(node, State::Editable)
        && !tree.parent(node).is_some_and(|p| tree.has_state(p, State::Editable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_a11y::AccessibilityTree;

    fn page() -> (AccessibilityTree, NodeId, NodeId, NodeId) {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let heading = tree.add_node(Role::Heading, root).unwrap();
        tree.set_attribute(heading, Attribute::HierarchicalLevel, 2).unwrap();
        let text = tree.add_node(Role::StaticText, heading).unwrap();
        tree.set_name(text, "Intro").unwrap();
        let link = tree.add_node(Role::Link, root).unwrap();
        tree.set_state(link, State::Focusable, true).unwrap();
        tree.set_state(link, State::Visited, true).unwrap();
        (tree, heading, text, link)
    }

    #[test]
    fn test_heading_levels() {
        let (tree, heading, ..) = page();
        assert!(Predicate::Heading(None).matches(&tree, heading));
        assert!(Predicate::Heading(Some(2)).matches(&tree, heading));
        assert!(!Predicate::Heading(Some(1)).matches(&tree, heading));
    }

    #[test]
    fn test_object_and_leaf() {
        let (tree, heading, text, link) = page();
        assert!(!Predicate::Object.matches(&tree, heading));
        assert!(Predicate::Object.matches(&tree, text));
        assert!(Predicate::Object.matches(&tree, link));
        assert!(Predicate::Leaf.matches(&tree, text));
        assert!(!Predicate::Leaf.matches(&tree, heading));
        assert!(Predicate::VisitedLink.matches(&tree, link));
    }

    #[test]
    fn test_has_output() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let button = tree.add_node(Role::Button, root).unwrap();
        let text = tree.add_node(Role::StaticText, root).unwrap();
        let clickable = tree.add_node(Role::GenericContainer, root).unwrap();
        tree.set_name(text, "Hi").unwrap();
        tree.set_state(clickable, State::Focusable, true).unwrap();

        assert!(has_output(&tree, button));
        assert!(has_output(&tree, text));
        assert!(Predicate::Object.matches(&tree, clickable));
        assert!(!has_output(&tree, clickable));
    }

    #[test]
    fn test_ignored_nodes() {
        let (mut tree, _, text, _) = page();
        tree.set_state(text, State::Invisible, true).unwrap();
        assert!(should_ignore(&tree, text));
        assert!(!Predicate::Object.matches(&tree, text));
    }

    #[test]
    fn test_similar_item_skips_wrappers() {
        let (tree, _, text, _) = page();
        let pred = Predicate::similar_to(&tree, text, 16).unwrap();
        assert!(matches!(pred, Predicate::Roles(set) if set.contains(Role::Heading)));
    }

    #[test]
    fn test_list_excludes_innermost() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let outer = tree.add_node(Role::List, root).unwrap();
        let item = tree.add_node(Role::ListItem, outer).unwrap();
        let inner = tree.add_node(Role::List, item).unwrap();
        let leaf = tree.add_node(Role::ListItem, inner).unwrap();

        let pred = Predicate::list_from(&tree, leaf, 16);
        assert!(!pred.matches(&tree, inner));
        assert!(pred.matches(&tree, outer));
    }

    #[test]
    fn test_stale_nodes_never_match() {
        let (mut tree, heading, text, _) = page();
        tree.remove_subtree(heading).unwrap();
        assert!(!Predicate::Heading(None).matches(&tree, heading));
        assert!(!Predicate::Custom(|_, _| true).matches(&tree, text));
    }

    #[test]
    fn test_editable_roots() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let editor = tree.add_node(Role::GenericContainer, root).unwrap();
        let para = tree.add_node(Role::Paragraph, editor).unwrap();
        for node in [editor, para] {
            tree.set_state(node, State::Editable, true).unwrap();
            tree.set_state(node, State::RichlyEditable, true).unwrap();
        }
        assert!(Predicate::EditableRoot.matches(&tree, editor));
        assert!(!Predicate::EditableRoot.matches(&tree, para));
        assert!(Predicate::RootOrEditableRoot.matches(&tree, root));
        assert!(Predicate::EditText.matches(&tree, editor));
        assert!(!Predicate::EditText.matches(&tree, para));
    }
}
