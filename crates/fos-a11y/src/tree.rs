//! Accessibility Tree
//!
//! The tree accessor consumed by assistive technology, plus an arena-backed
//! implementation. Handles are generational: once a node is removed its
//! handle stops resolving, and every read returns `None` for it.

use crate::aria::{Attribute, AttributeValue, Attributes, Restriction, Role, State, StateSet};
use crate::A11yError;

/// Stable node handle (arena slot + generation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub const fn index(self) -> u32 { self.index }

    #[inline]
    pub const fn generation(self) -> u32 { self.generation }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Relations to other nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    pub label_for: Vec<NodeId>,
    pub description_for: Vec<NodeId>,
    pub active_descendant_for: Vec<NodeId>,
    pub controlled_by: Vec<NodeId>,
    pub details: Vec<NodeId>,
}

/// Read access to a live accessibility tree.
///
/// Every method takes a handle that may have gone stale since it was
/// obtained; implementations return `None` (or an empty list) rather than
/// failing. Nothing read here may be cached across calls.
pub trait AccessibleTree {
    /// Top-level root of the tree
    fn root(&self) -> Option<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Ordered children, read fresh
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn role(&self, node: NodeId) -> Option<Role>;

    fn attribute(&self, node: NodeId, key: Attribute) -> Option<AttributeValue>;

    fn state_flags(&self, node: NodeId) -> Option<StateSet>;

    fn relations(&self, node: NodeId) -> Option<Relations>;

    /// Whether the handle still resolves
    fn contains(&self, node: NodeId) -> bool {
        self.role(node).is_some()
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == node)?;
        siblings.get(pos + 1).copied()
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == node)?;
        pos.checked_sub(1).and_then(|p| siblings.get(p).copied())
    }

    fn has_state(&self, node: NodeId, state: State) -> bool {
        self.state_flags(node).is_some_and(|s| s.contains(state))
    }

    fn name(&self, node: NodeId) -> Option<String> {
        match self.attribute(node, Attribute::Name)? {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn int_attribute(&self, node: NodeId, key: Attribute) -> Option<i32> {
        self.attribute(node, key)?.as_int()
    }

    fn restriction(&self, node: NodeId) -> Restriction {
        match self.attribute(node, Attribute::Restriction) {
            Some(AttributeValue::Restriction(r)) => r,
            _ => Restriction::None,
        }
    }
}

/// Accessibility node
#[derive(Debug, Clone)]
pub struct AccessibilityNode {
    pub id: NodeId,
    pub role: Role,
    pub attributes: Attributes,
    pub states: StateSet,
    pub relations: Relations,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Position within the parent's children, kept current by the arena
    sibling_index: usize,
}

impl AccessibilityNode {
    pub fn new(id: NodeId, role: Role) -> Self {
        Self {
            id,
            role,
            attributes: Attributes::default(),
            states: StateSet::empty(),
            relations: Relations::default(),
            children: Vec::new(),
            parent: None,
            sibling_index: 0,
        }
    }

    /// Set accessible name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.attributes.set(Attribute::Name, name.into());
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<AccessibilityNode>,
}

/// Arena-backed accessibility tree
#[derive(Debug, Default)]
pub struct AccessibilityTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root_id: Option<NodeId>,
}

impl AccessibilityTree {
    pub fn new() -> Self { Self::default() }

    /// Create root node
    pub fn create_root(&mut self, role: Role) -> NodeId {
        let id = self.allocate(role);
        self.root_id = Some(id);
        id
    }

    /// Append a node under `parent_id`
    pub fn add_node(&mut self, role: Role, parent_id: NodeId) -> Result<NodeId, A11yError> {
        if self.get_node(parent_id).is_none() {
            return Err(A11yError::StaleNode(parent_id));
        }
        let id = self.allocate(role);
        self.attach(id, parent_id, None);
        Ok(id)
    }

    /// Insert a node at `index` among `parent_id`'s children
    pub fn insert_node(&mut self, role: Role, parent_id: NodeId, index: usize) -> Result<NodeId, A11yError> {
        if self.get_node(parent_id).is_none() {
            return Err(A11yError::StaleNode(parent_id));
        }
        let id = self.allocate(role);
        self.attach(id, parent_id, Some(index));
        Ok(id)
    }

    /// Move an existing subtree under a new parent
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), A11yError> {
        if self.get_node(id).is_none() {
            return Err(A11yError::StaleNode(id));
        }
        if self.get_node(new_parent).is_none() {
            return Err(A11yError::StaleNode(new_parent));
        }
        if self.is_ancestor_or_self(id, new_parent) {
            return Err(A11yError::CycleDetected(id));
        }
        self.detach(id);
        self.attach(id, new_parent, None);
        Ok(())
    }

    /// Remove a node and its whole subtree; their handles go stale.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<usize, A11yError> {
        if self.get_node(id).is_none() {
            return Err(A11yError::StaleNode(id));
        }
        self.detach(id);
        if self.root_id == Some(id) {
            self.root_id = None;
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                removed += 1;
            }
        }
        tracing::trace!("Removed {} nodes under {}", removed, id);
        Ok(removed)
    }

    /// Get node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&AccessibilityNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Get mutable node
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut AccessibilityNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), A11yError> {
        self.get_node_mut(id).ok_or(A11yError::StaleNode(id))?.set_name(name);
        Ok(())
    }

    pub fn set_attribute(&mut self, id: NodeId, key: Attribute, value: impl Into<AttributeValue>) -> Result<(), A11yError> {
        self.get_node_mut(id).ok_or(A11yError::StaleNode(id))?.attributes.set(key, value);
        Ok(())
    }

    pub fn set_state(&mut self, id: NodeId, state: State, on: bool) -> Result<(), A11yError> {
        let node = self.get_node_mut(id).ok_or(A11yError::StaleNode(id))?;
        if on {
            node.states.insert(state);
        } else {
            node.states.remove(state);
        }
        Ok(())
    }

    pub fn set_relations(&mut self, id: NodeId, relations: Relations) -> Result<(), A11yError> {
        self.get_node_mut(id).ok_or(A11yError::StaleNode(id))?.relations = relations;
        Ok(())
    }

    /// Live node count
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate(&mut self, role: Role) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            let id = NodeId::new(index, slot.generation);
            slot.node = Some(AccessibilityNode::new(id, role));
            id
        } else {
            let id = NodeId::new(self.slots.len() as u32, 0);
            self.slots.push(Slot { generation: 0, node: Some(AccessibilityNode::new(id, role)) });
            id
        }
    }

    fn attach(&mut self, id: NodeId, parent_id: NodeId, index: Option<usize>) {
        let Some(parent) = self.get_node_mut(parent_id) else {
            return;
        };
        let at = match index {
            Some(i) if i < parent.children.len() => i,
            _ => parent.children.len(),
        };
        parent.children.insert(at, id);
        if let Some(node) = self.get_node_mut(id) {
            node.parent = Some(parent_id);
        }
        self.renumber(parent_id, at);
    }

    fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get_node_mut(id) else {
            return;
        };
        let (parent, at) = (node.parent.take(), node.sibling_index);
        node.sibling_index = 0;
        if let Some(pid) = parent {
            if let Some(p) = self.get_node_mut(pid) {
                p.children.retain(|&c| c != id);
            }
            self.renumber(pid, at);
        }
    }

    /// Refresh sibling indices of `parent_id`'s children from `from` onward
    fn renumber(&mut self, parent_id: NodeId, from: usize) {
        let tail = match self.get_node(parent_id) {
            Some(p) => p.children.get(from..).map(<[NodeId]>::to_vec).unwrap_or_default(),
            None => return,
        };
        for (offset, child) in tail.into_iter().enumerate() {
            if let Some(node) = self.get_node_mut(child) {
                node.sibling_index = from + offset;
            }
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.get_node(c).and_then(|n| n.parent);
        }
        false
    }
}

impl AccessibleTree for AccessibilityTree {
    fn root(&self) -> Option<NodeId> {
        self.root_id.filter(|&r| self.get_node(r).is_some())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get_node(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get_node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn role(&self, node: NodeId) -> Option<Role> {
        self.get_node(node).map(|n| n.role)
    }

    fn attribute(&self, node: NodeId, key: Attribute) -> Option<AttributeValue> {
        self.get_node(node)?.attributes.get(key).cloned()
    }

    fn state_flags(&self, node: NodeId) -> Option<StateSet> {
        self.get_node(node).map(|n| n.states)
    }

    fn relations(&self, node: NodeId) -> Option<Relations> {
        self.get_node(node).map(|n| n.relations.clone())
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.get_node(node)?.children.first().copied()
    }

    fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.get_node(node)?.children.last().copied()
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let n = self.get_node(node)?;
        n.parent?;
        Some(n.sibling_index)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let n = self.get_node(node)?;
        self.get_node(n.parent?)?.children.get(n.sibling_index + 1).copied()
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let n = self.get_node(node)?;
        let i = n.sibling_index.checked_sub(1)?;
        self.get_node(n.parent?)?.children.get(i).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessibility_tree() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);

        let button = tree.add_node(Role::Button, root).unwrap();
        tree.set_name(button, "Submit").unwrap();
        tree.set_state(button, State::Focusable, true).unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.name(button).as_deref(), Some("Submit"));
        assert!(tree.has_state(button, State::Focusable));
        assert_eq!(tree.role(button), Some(Role::Button));
        assert_eq!(tree.parent(button), Some(root));
        assert_eq!(tree.index_in_parent(button), Some(0));
        assert_eq!(tree.index_in_parent(root), None);
    }

    #[test]
    fn test_siblings() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let a = tree.add_node(Role::Paragraph, root).unwrap();
        let c = tree.add_node(Role::Paragraph, root).unwrap();
        let b = tree.insert_node(Role::Heading, root, 1).unwrap();

        assert_eq!(tree.children(root), vec![a, b, c]);
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.previous_sibling(c), Some(b));
        assert_eq!(tree.previous_sibling(a), None);
        assert_eq!(tree.index_in_parent(c), Some(2));
    }

    #[test]
    fn test_sibling_indices_follow_mutations() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let group = tree.add_node(Role::Group, root).unwrap();
        let a = tree.add_node(Role::Paragraph, root).unwrap();
        let b = tree.add_node(Role::Paragraph, root).unwrap();
        let c = tree.add_node(Role::Paragraph, root).unwrap();

        let first = tree.insert_node(Role::Heading, root, 0).unwrap();
        assert_eq!(tree.index_in_parent(c), Some(4));
        assert_eq!(tree.previous_sibling(group), Some(first));

        tree.remove_subtree(a).unwrap();
        assert_eq!(tree.next_sibling(group), Some(b));
        assert_eq!(tree.previous_sibling(b), Some(group));
        assert_eq!(tree.index_in_parent(c), Some(3));

        tree.reparent(b, group).unwrap();
        assert_eq!(tree.index_in_parent(b), Some(0));
        assert_eq!(tree.next_sibling(b), None);
        assert_eq!(tree.previous_sibling(b), None);
        assert_eq!(tree.next_sibling(group), Some(c));
        assert_eq!(tree.index_in_parent(c), Some(2));

        for child in tree.children(root) {
            let expected = tree.children(root).iter().position(|&n| n == child);
            assert_eq!(tree.index_in_parent(child), expected);
        }
    }

    #[test]
    fn test_removed_handles_go_stale() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let list = tree.add_node(Role::List, root).unwrap();
        let item = tree.add_node(Role::ListItem, list).unwrap();

        assert_eq!(tree.remove_subtree(list).unwrap(), 2);
        assert!(!tree.contains(list));
        assert!(!tree.contains(item));
        assert_eq!(tree.parent(item), None);
        assert!(tree.children(list).is_empty());
        assert!(tree.children(root).is_empty());

        // The slot is reused under a new generation.
        let fresh = tree.add_node(Role::Paragraph, root).unwrap();
        assert!(tree.contains(fresh));
        assert!(!tree.contains(item));
        assert!(matches!(tree.set_name(item, "x"), Err(A11yError::StaleNode(_))));
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let outer = tree.add_node(Role::Group, root).unwrap();
        let inner = tree.add_node(Role::Group, outer).unwrap();

        assert!(matches!(tree.reparent(outer, inner), Err(A11yError::CycleDetected(_))));
        tree.reparent(inner, root).unwrap();
        assert_eq!(tree.children(root), vec![outer, inner]);
        assert!(tree.children(outer).is_empty());
    }
}
