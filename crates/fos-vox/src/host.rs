//! Host Collaborators
//!
//! Interfaces the navigation core calls out to: speech/braille output, the
//! scroll hook, key injection for editable text, and the mode latch. A host
//! implements all of them; [`NullHost`] implements none.

use fos_a11y::NodeId;

use crate::command::Command;
use crate::cursor::CursorRange;
use crate::keyboard::{KeyCode, Modifiers};
use crate::traversal::Direction;

/// Why a range is being output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    Navigate,
    /// First utterance of continuous reading
    ReadFromHere,
    /// Next utterance of continuous reading
    ContinuousRead,
}

/// Non-speech cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Earcon {
    Wrap,
}

/// Speech and braille output
pub trait OutputSink {
    /// Output a new range; for continuous reading the host reports
    /// completion back through the session.
    fn navigate(&mut self, range: &CursorRange, previous: Option<&CursorRange>, event: OutputEvent);

    /// Speak a localized message by key
    fn speak_message(&mut self, message: &'static str);

    fn play_earcon(&mut self, earcon: Earcon);

    fn stop_speech(&mut self) {}
}

/// Scrolling for content that is not yet realized
pub trait ScrollHook {
    /// Called when a search found nothing. Returns whether a scroll was
    /// started; if so, the host later asks the session to retry.
    fn try_scroll(&mut self, _bound: NodeId, _command: Command, _range: &CursorRange, _direction: Direction) -> bool {
        false
    }

    /// Called before landing on a target. Returns whether a scroll was
    /// started to bring it into view first.
    fn scroll_for_navigation(&mut self, _target: &CursorRange, _direction: Direction) -> bool {
        false
    }
}

/// Synthetic input for editable text
pub trait KeyInjector {
    fn send_key_press(&mut self, _key: KeyCode, _modifiers: Modifiers) {}

    /// Move focus past the end of an edit field
    fn move_to_after_edit_text(&mut self, _field: NodeId) {}
}

/// Mode-management notification
pub trait ModeLatch {
    /// While set, focus-driven mode switching should be suppressed.
    fn set_ignoring_range_changes(&mut self, _ignoring: bool) {}
}

/// Everything the core needs from its host
pub trait Host: OutputSink + ScrollHook + KeyInjector + ModeLatch {}

impl<T: OutputSink + ScrollHook + KeyInjector + ModeLatch + ?Sized> Host for T {}

/// Host that discards everything
#[derive(Debug, Default)]
pub struct NullHost;

impl NullHost {
    pub fn new() -> Self { Self }
}

impl OutputSink for NullHost {
    fn navigate(&mut self, _range: &CursorRange, _previous: Option<&CursorRange>, _event: OutputEvent) {}
    fn speak_message(&mut self, _message: &'static str) {}
    fn play_earcon(&mut self, _earcon: Earcon) {}
}

impl ScrollHook for NullHost {}
impl KeyInjector for NullHost {}
impl ModeLatch for NullHost {}
