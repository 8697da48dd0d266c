//! fOS Screen Reader Core
//!
//! Keyboard arbitration and command-driven navigation over an accessibility
//! tree.
//!
//! Features:
//! - Key arbiter with one-shot pass-through mode
//! - Static command table: unit moves, predicate jumps, table navigation
//! - Bounded document-order search with wrap, re-sync and scroll retry
//! - Edit field key translation and mode latch
//! - Continuous reading

pub mod command;
pub mod config;
pub mod cursor;
pub mod dispatch;
pub mod edit;
pub mod host;
pub mod keyboard;
pub mod keymap;
pub mod predicate;
pub mod session;
pub mod table;
pub mod traversal;

pub use command::{Command, Motion};
pub use config::{BindingConfig, VoxConfig};
pub use cursor::{Cursor, CursorRange, CursorUnit};
pub use dispatch::{CommandDispatcher, DispatchContext, DispatchOutcome, PendingRetry};
pub use edit::{EditOutcome, TextEditState};
pub use host::{Earcon, Host, KeyInjector, ModeLatch, NullHost, OutputEvent, OutputSink, ScrollHook};
pub use keyboard::{KeyArbiter, KeyCode, KeyDisposition, KeyEvent, Modifiers, PassThroughPhase};
pub use keymap::{KeyCombo, KeyMatch, Keymap};
pub use predicate::Predicate;
pub use session::VoxSession;
pub use table::{Axis, Span, TableCellPredicate};
pub use traversal::{find_next, Direction, SearchOptions, TreeWalker};

/// Screen reader error
#[derive(Debug, thiserror::Error)]
pub enum VoxError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid shortcut: {0}")]
    InvalidShortcut(String),

    #[error("Unknown key: {0}")]
    UnknownKey(String),
}
