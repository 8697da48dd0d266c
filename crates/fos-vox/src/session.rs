//! Screen Reader Session
//!
//! Owns the key arbiter, the dispatcher, the current range and the pending
//! scroll retry, and routes host events between them. Multiple sessions can
//! run side by side; nothing here is global.

use fos_a11y::AccessibleTree;

use crate::command::Command;
use crate::config::VoxConfig;
use crate::cursor::CursorRange;
use crate::dispatch::{CommandDispatcher, DispatchContext, DispatchOutcome, PendingRetry};
use crate::edit::TextEditState;
use crate::host::{Earcon, Host, OutputEvent};
use crate::keyboard::{KeyArbiter, KeyEvent};
use crate::keymap::Keymap;
use crate::VoxError;

pub const NO_FOCUS: &str = "no_focus";
pub const PASS_THROUGH_KEY: &str = "pass_through_key";
pub const PASS_THROUGH_UNAVAILABLE: &str = "pass_through_unavailable_with_sticky_mode";
pub const STICKY_MODE_ENABLED: &str = "sticky_mode_enabled";
pub const STICKY_MODE_DISABLED: &str = "sticky_mode_disabled";

/// Screen reader session
pub struct VoxSession<H: Host> {
    keymap: Keymap,
    arbiter: KeyArbiter,
    dispatcher: CommandDispatcher,
    current: Option<CursorRange>,
    pending_retry: Option<PendingRetry>,
    text_edit: Option<TextEditState>,
    sticky_mode: bool,
    reading: bool,
    host: H,
}

impl<H: Host> VoxSession<H> {
    pub fn new(config: &VoxConfig, host: H) -> Result<Self, VoxError> {
        let keymap = Keymap::from_config(config)?;
        let arbiter = KeyArbiter::with_reserved(config.reserved_key_codes()?);
        tracing::info!("Session started with {} bindings", keymap.len());
        Ok(Self {
            keymap,
            arbiter,
            dispatcher: CommandDispatcher::new(config.max_ancestor_depth),
            current: None,
            pending_retry: None,
            text_edit: None,
            sticky_mode: config.sticky_mode,
            reading: false,
            host,
        })
    }

    pub fn with_defaults(host: H) -> Result<Self, VoxError> {
        Self::new(&VoxConfig::default(), host)
    }

    pub fn host(&self) -> &H { &self.host }

    pub fn host_mut(&mut self) -> &mut H { &mut self.host }

    pub fn arbiter(&self) -> &KeyArbiter { &self.arbiter }

    pub fn keymap_mut(&mut self) -> &mut Keymap { &mut self.keymap }

    pub fn current_range(&self) -> Option<&CursorRange> { self.current.as_ref() }

    /// Replace the current range from outside (focus change, click)
    pub fn set_current_range(&mut self, range: Option<CursorRange>) {
        self.current = range;
    }

    pub fn set_text_edit(&mut self, edit: Option<TextEditState>) {
        self.text_edit = edit;
    }

    pub fn is_sticky_mode(&self) -> bool { self.sticky_mode }

    pub fn is_reading(&self) -> bool { self.reading }

    pub fn pending_retry(&self) -> Option<&PendingRetry> { self.pending_retry.as_ref() }

    /// Mode latch state; clear between commands
    pub fn is_ignoring_range_changes(&self) -> bool {
        self.dispatcher.is_ignoring_range_changes()
    }

    /// Returns whether the key must be kept from the page.
    pub fn on_key_down(&mut self, tree: &dyn AccessibleTree, event: &KeyEvent) -> bool {
        let disposition = self.arbiter.on_key_down(event, &self.keymap);
        if let Some(command) = disposition.command {
            self.dispatch(tree, command);
        }
        disposition.consumed
    }

    pub fn on_key_up(&mut self, event: &KeyEvent) -> bool {
        self.arbiter.on_key_up(event)
    }

    /// Dispatch by command name
    pub fn dispatch_named(&mut self, tree: &dyn AccessibleTree, name: &str) -> DispatchOutcome {
        match Command::parse(name) {
            Some(command) => self.dispatch(tree, command),
            None => {
                tracing::warn!("Unknown command: {}", name);
                DispatchOutcome::Unhandled
            }
        }
    }

    pub fn dispatch(&mut self, tree: &dyn AccessibleTree, command: Command) -> DispatchOutcome {
        if command.is_session_command() {
            return self.session_command(tree, command);
        }
        self.reading = false;

        let Some(range) = self.current.clone().filter(|r| r.is_valid(tree)) else {
            tracing::debug!("No current range for {}", command);
            self.host.speak_message(NO_FOCUS);
            return DispatchOutcome::Unhandled;
        };

        let outcome = {
            let mut cx = DispatchContext {
                tree,
                host: &mut self.host,
                text_edit: self.text_edit.as_ref(),
                sticky_mode: self.sticky_mode,
            };
            self.dispatcher.dispatch(&mut cx, command, &range)
        };
        self.apply(&outcome, OutputEvent::Navigate);
        outcome
    }

    fn apply(&mut self, outcome: &DispatchOutcome, event: OutputEvent) {
        match outcome {
            DispatchOutcome::Navigated(range) => {
                if range.wrapped() {
                    self.host.play_earcon(Earcon::Wrap);
                }
                let previous = self.current.replace(range.clone());
                self.host.navigate(range, previous.as_ref(), event);
            }
            DispatchOutcome::Deferred(retry) => {
                if let Some(old) = self.pending_retry.replace(retry.clone()) {
                    tracing::debug!("Retry for {} replaced by {}", old.command, retry.command);
                }
            }
            _ => {}
        }
    }

    /// Host finished scrolling: re-run the pending command if the range it
    /// was scheduled against is still current.
    pub fn complete_scroll(&mut self, tree: &dyn AccessibleTree) -> DispatchOutcome {
        let Some(retry) = self.pending_retry.take() else {
            return DispatchOutcome::Unhandled;
        };
        match &self.current {
            Some(current) if current.same_position(&retry.range) => {
                tracing::debug!("Retrying {}", retry.command);
                self.dispatch(tree, retry.command)
            }
            _ => {
                tracing::debug!("Dropping retry for {}; range moved", retry.command);
                DispatchOutcome::Blocked
            }
        }
    }

    fn session_command(&mut self, tree: &dyn AccessibleTree, command: Command) -> DispatchOutcome {
        match command {
            Command::PassThroughMode => {
                if self.sticky_mode {
                    self.host.speak_message(PASS_THROUGH_UNAVAILABLE);
                } else {
                    self.arbiter.enable_pass_through();
                    self.host.speak_message(PASS_THROUGH_KEY);
                }
            }
            Command::ToggleStickyMode => {
                self.sticky_mode = !self.sticky_mode;
                tracing::info!("Sticky mode {}", if self.sticky_mode { "on" } else { "off" });
                self.host.speak_message(if self.sticky_mode { STICKY_MODE_ENABLED } else { STICKY_MODE_DISABLED });
            }
            Command::StopSpeech => {
                self.reading = false;
                self.host.stop_speech();
            }
            Command::ReadFromHere => return self.read_from_here(tree),
            _ => return DispatchOutcome::Unhandled,
        }
        DispatchOutcome::Handled
    }

    fn read_from_here(&mut self, tree: &dyn AccessibleTree) -> DispatchOutcome {
        let Some(range) = self.current.clone().filter(|r| r.is_valid(tree)) else {
            self.host.speak_message(NO_FOCUS);
            return DispatchOutcome::Unhandled;
        };
        let start = CursorRange::from_node(range.start().node());
        self.reading = true;
        tracing::info!("Reading from {}", range.start().node());
        let outcome = DispatchOutcome::Navigated(start);
        self.apply(&outcome, OutputEvent::ReadFromHere);
        outcome
    }

    /// Output for the last range finished. While reading continuously, move
    /// on to the next object with something to say; stop at the document
    /// end.
    pub fn on_speech_end(&mut self, tree: &dyn AccessibleTree) -> DispatchOutcome {
        if !self.reading {
            return DispatchOutcome::Unhandled;
        }
        let Some(range) = self.current.clone() else {
            self.reading = false;
            return DispatchOutcome::Blocked;
        };

        let outcome = {
            let mut cx = DispatchContext {
                tree,
                host: &mut self.host,
                text_edit: self.text_edit.as_ref(),
                sticky_mode: self.sticky_mode,
            };
            self.dispatcher.read_next(&mut cx, &range)
        };
        if outcome == DispatchOutcome::Blocked {
            self.reading = false;
            tracing::info!("Continuous reading finished");
            return outcome;
        }

        self.apply(&outcome, OutputEvent::ContinuousRead);
        outcome
    }
}
