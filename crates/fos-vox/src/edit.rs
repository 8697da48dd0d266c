//! Editable Text Commands
//!
//! Inside an edit field, movement commands are turned into key presses sent
//! to the field so its own caret moves, instead of moving the range.

use fos_a11y::{AccessibleTree, NodeId, Restriction, State};

use crate::command::Command;
use crate::cursor::CursorRange;
use crate::host::Host;
use crate::keyboard::{KeyCode, Modifiers};
use crate::traversal::is_descendant_of;

/// Edit field that currently has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEditState {
    pub node: NodeId,
    pub selection_on_first_line: bool,
    pub selection_on_last_line: bool,
}

impl TextEditState {
    pub fn new(node: NodeId) -> Self {
        Self { node, selection_on_first_line: true, selection_on_last_line: true }
    }

    pub fn with_lines(mut self, on_first: bool, on_last: bool) -> Self {
        self.selection_on_first_line = on_first;
        self.selection_on_last_line = on_last;
        self
    }
}

/// Result of the edit pre-pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Continue with normal dispatch
    NotApplicable,
    /// Fully handled; the range stays put
    Handled,
    /// Continue with normal dispatch from this range
    Retarget(CursorRange),
}

fn send<H: Host + ?Sized>(host: &mut H, key: KeyCode, modifiers: Modifiers) -> EditOutcome {
    tracing::debug!("Sending {} to edit field", key.name());
    host.send_key_press(key, modifiers);
    EditOutcome::Handled
}

/// Translate `command` into edit-field key presses when `range` sits in
/// `edit`. Skipped in sticky mode, for read-only fields, and for fields
/// whose selection changes are not spoken.
pub fn prepass<H: Host + ?Sized>(
    tree: &dyn AccessibleTree,
    host: &mut H,
    edit: Option<&TextEditState>,
    sticky_mode: bool,
    command: Command,
    range: &CursorRange,
    max_depth: usize,
) -> EditOutcome {
    if sticky_mode {
        return EditOutcome::NotApplicable;
    }
    let Some(edit) = edit else {
        return EditOutcome::NotApplicable;
    };
    if !is_descendant_of(tree, range.start().node(), edit.node, max_depth) {
        return EditOutcome::NotApplicable;
    }
    if tree.restriction(edit.node) == Restriction::ReadOnly || tree.has_state(edit.node, State::Protected) {
        return EditOutcome::NotApplicable;
    }

    let multiline = tree.has_state(edit.node, State::Multiline);
    let shift = Modifiers::SHIFT;
    let ctrl_shift = Modifiers::CTRL.union(Modifiers::SHIFT);

    match command {
        Command::PreviousCharacter => send(host, KeyCode::HOME, shift),
        Command::NextCharacter => send(host, KeyCode::END, shift),
        Command::PreviousWord => send(host, KeyCode::HOME, ctrl_shift),
        Command::NextWord => send(host, KeyCode::END, ctrl_shift),
        Command::JumpToTop => send(host, KeyCode::HOME, Modifiers::CTRL),
        Command::JumpToBottom => send(host, KeyCode::END, Modifiers::CTRL),
        Command::PreviousObject | Command::PreviousLine if multiline => {
            if edit.selection_on_first_line {
                return EditOutcome::Retarget(CursorRange::from_node(edit.node));
            }
            let key = if command == Command::PreviousObject { KeyCode::HOME } else { KeyCode::PAGE_UP };
            send(host, key, Modifiers::NONE)
        }
        Command::NextObject | Command::NextLine if multiline => {
            if edit.selection_on_last_line {
                tracing::debug!("Leaving edit field {}", edit.node);
                host.move_to_after_edit_text(edit.node);
                return EditOutcome::Handled;
            }
            let key = if command == Command::NextObject { KeyCode::END } else { KeyCode::PAGE_DOWN };
            send(host, key, Modifiers::NONE)
        }
        _ => EditOutcome::NotApplicable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Earcon, KeyInjector, ModeLatch, OutputEvent, OutputSink, ScrollHook};
    use fos_a11y::{AccessibilityTree, Role};

    #[derive(Default)]
    struct Keys {
        sent: Vec<(KeyCode, Modifiers)>,
        left: Vec<NodeId>,
    }

    impl OutputSink for Keys {
        fn navigate(&mut self, _: &CursorRange, _: Option<&CursorRange>, _: OutputEvent) {}
        fn speak_message(&mut self, _: &'static str) {}
        fn play_earcon(&mut self, _: Earcon) {}
    }
    impl ScrollHook for Keys {}
    impl ModeLatch for Keys {}
    impl KeyInjector for Keys {
        fn send_key_press(&mut self, key: KeyCode, modifiers: Modifiers) {
            self.sent.push((key, modifiers));
        }
        fn move_to_after_edit_text(&mut self, field: NodeId) {
            self.left.push(field);
        }
    }

    fn field(multiline: bool) -> (AccessibilityTree, NodeId, NodeId) {
        let mut tree = AccessibilityTree::new();
        let root = tree.create_root(Role::RootWebArea);
        let field = tree.add_node(Role::TextField, root).unwrap();
        tree.set_state(field, State::Editable, true).unwrap();
        tree.set_state(field, State::Multiline, multiline).unwrap();
        let text = tree.add_node(Role::StaticText, field).unwrap();
        (tree, field, text)
    }

    #[test]
    fn test_character_and_word_keys() {
        let (tree, field, text) = field(false);
        let mut host = Keys::default();
        let edit = TextEditState::new(field);
        let range = CursorRange::from_node(text);

        let out = prepass(&tree, &mut host, Some(&edit), false, Command::NextWord, &range, 64);
        assert_eq!(out, EditOutcome::Handled);
        assert_eq!(host.sent, vec![(KeyCode::END, Modifiers::CTRL.union(Modifiers::SHIFT))]);

        // Object movement only applies to multiline fields.
        let out = prepass(&tree, &mut host, Some(&edit), false, Command::NextObject, &range, 64);
        assert_eq!(out, EditOutcome::NotApplicable);
    }

    #[test]
    fn test_multiline_edges() {
        let (tree, field, text) = field(true);
        let mut host = Keys::default();
        let range = CursorRange::from_node(text);

        let top = TextEditState::new(field).with_lines(true, false);
        let out = prepass(&tree, &mut host, Some(&top), false, Command::PreviousLine, &range, 64);
        assert_eq!(out, EditOutcome::Retarget(CursorRange::from_node(field)));
        let out = prepass(&tree, &mut host, Some(&top), false, Command::NextLine, &range, 64);
        assert_eq!(out, EditOutcome::Handled);
        assert_eq!(host.sent, vec![(KeyCode::PAGE_DOWN, Modifiers::NONE)]);

        let bottom = TextEditState::new(field).with_lines(false, true);
        let out = prepass(&tree, &mut host, Some(&bottom), false, Command::NextObject, &range, 64);
        assert_eq!(out, EditOutcome::Handled);
        assert_eq!(host.left, vec![field]);
    }

    #[test]
    fn test_skipped_cases() {
        let (mut tree, field, text) = field(true);
        let mut host = Keys::default();
        let edit = TextEditState::new(field);
        let range = CursorRange::from_node(text);

        assert_eq!(prepass(&tree, &mut host, Some(&edit), true, Command::NextWord, &range, 64), EditOutcome::NotApplicable);
        assert_eq!(prepass(&tree, &mut host, None, false, Command::NextWord, &range, 64), EditOutcome::NotApplicable);

        let outside = CursorRange::from_node(tree.root().unwrap());
        assert_eq!(prepass(&tree, &mut host, Some(&edit), false, Command::NextWord, &outside, 64), EditOutcome::NotApplicable);

        tree.set_attribute(field, fos_a11y::Attribute::Restriction, Restriction::ReadOnly).unwrap();
        assert_eq!(prepass(&tree, &mut host, Some(&edit), false, Command::NextWord, &range, 64), EditOutcome::NotApplicable);
        assert!(host.sent.is_empty());
    }
}
