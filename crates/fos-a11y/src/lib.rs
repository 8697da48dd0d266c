//! fOS Accessibility
//!
//! Accessibility node model for the fOS browser engine.
//!
//! Features:
//! - Roles, state flags, attributes and relations
//! - `AccessibleTree`: read access to a live, host-owned tree
//! - `AccessibilityTree`: arena implementation with generational handles

pub mod aria;
pub mod tree;

pub use aria::{Attribute, AttributeValue, Attributes, Restriction, Role, RoleSet, State, StateSet};
pub use tree::{AccessibilityNode, AccessibilityTree, AccessibleTree, NodeId, Relations};

/// Accessibility error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("Node {0} no longer exists")]
    StaleNode(NodeId),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Moving {0} would create a cycle")]
    CycleDetected(NodeId),
}
