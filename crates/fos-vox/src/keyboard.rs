//! Key Arbiter
//!
//! Decides, per physical key event, whether the screen reader consumes the
//! key or lets it reach the page. Also runs the one-shot pass-through mode:
//! after the pass-through shortcut, the next key combination goes to the
//! page untouched, and the arbiter resumes once those keys are released.
//!
//! Invariants, checked after every event:
//! - no key is in both the eaten set and the passed-through set;
//! - while pass-through is off the phase is [`PassThroughPhase::NoPassThrough`].

use std::collections::HashSet;

use crate::command::Command;
use crate::keymap::{KeyMatch, Keymap};
use crate::VoxError;

/// Physical key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const BACKSPACE: KeyCode = KeyCode(8);
    pub const TAB: KeyCode = KeyCode(9);
    pub const ENTER: KeyCode = KeyCode(13);
    pub const SHIFT: KeyCode = KeyCode(16);
    pub const CONTROL: KeyCode = KeyCode(17);
    pub const ALT: KeyCode = KeyCode(18);
    pub const ESCAPE: KeyCode = KeyCode(27);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const PAGE_UP: KeyCode = KeyCode(33);
    pub const PAGE_DOWN: KeyCode = KeyCode(34);
    pub const END: KeyCode = KeyCode(35);
    pub const HOME: KeyCode = KeyCode(36);
    pub const LEFT: KeyCode = KeyCode(37);
    pub const UP: KeyCode = KeyCode(38);
    pub const RIGHT: KeyCode = KeyCode(39);
    pub const DOWN: KeyCode = KeyCode(40);
    pub const SEARCH: KeyCode = KeyCode(91);
    pub const APPS: KeyCode = KeyCode(93);
    pub const SEMICOLON: KeyCode = KeyCode(186);

    const NAMED: &'static [(KeyCode, &'static str)] = &[
        (Self::BACKSPACE, "Backspace"),
        (Self::TAB, "Tab"),
        (Self::ENTER, "Enter"),
        (Self::SHIFT, "Shift"),
        (Self::CONTROL, "Ctrl"),
        (Self::ALT, "Alt"),
        (Self::ESCAPE, "Escape"),
        (Self::SPACE, "Space"),
        (Self::PAGE_UP, "PageUp"),
        (Self::PAGE_DOWN, "PageDown"),
        (Self::END, "End"),
        (Self::HOME, "Home"),
        (Self::LEFT, "Left"),
        (Self::UP, "Up"),
        (Self::RIGHT, "Right"),
        (Self::DOWN, "Down"),
        (Self::SEARCH, "Search"),
        (Self::APPS, "Apps"),
        (Self::SEMICOLON, "Semicolon"),
    ];

    /// Parse a key name (`"Escape"`, `"H"`, `"3"`, `"ArrowLeft"`)
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        let alias = match lower.as_str() {
            "control" => "ctrl",
            "esc" => "escape",
            "return" => "enter",
            "meta" | "os" => "search",
            ";" => "semicolon",
            other => other.strip_prefix("arrow").unwrap_or(other),
        };
        if let Some((code, _)) = Self::NAMED.iter().find(|(_, name)| name.to_lowercase() == alias) {
            return Some(*code);
        }

        let mut chars = alias.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Some(KeyCode(c.to_ascii_uppercase() as u16)),
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        if let Some((_, name)) = Self::NAMED.iter().find(|(code, _)| code == self) {
            return (*name).to_string();
        }
        match char::from_u32(self.0 as u32) {
            Some(c) if c.is_ascii_alphanumeric() => c.to_string(),
            _ => format!("Key{}", self.0),
        }
    }

    /// Modifier this key sets while held, if any
    pub fn as_modifier(&self) -> Option<Modifiers> {
        match *self {
            Self::SHIFT => Some(Modifiers::SHIFT),
            Self::CONTROL => Some(Modifiers::CTRL),
            Self::ALT => Some(Modifiers::ALT),
            Self::SEARCH => Some(Modifiers::SEARCH),
            _ => None,
        }
    }

    pub fn is_modifier(&self) -> bool {
        self.as_modifier().is_some()
    }
}

impl std::str::FromStr for KeyCode {
    type Err = VoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| VoxError::UnknownKey(s.to_string()))
    }
}

/// Held modifier flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub search: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, alt: false, shift: false, search: false };
    pub const CTRL: Modifiers = Modifiers { ctrl: true, ..Self::NONE };
    pub const ALT: Modifiers = Modifiers { alt: true, ..Self::NONE };
    pub const SHIFT: Modifiers = Modifiers { shift: true, ..Self::NONE };
    pub const SEARCH: Modifiers = Modifiers { search: true, ..Self::NONE };

    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.alt || self.shift || self.search)
    }

    pub fn union(self, other: Modifiers) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            shift: self.shift || other.shift,
            search: self.search || other.search,
        }
    }

    /// Every flag set here is also set in `other`
    pub fn is_subset_of(&self, other: &Modifiers) -> bool {
        (!self.ctrl || other.ctrl)
            && (!self.alt || other.alt)
            && (!self.shift || other.shift)
            && (!self.search || other.search)
    }

    /// Flags left once `key` is no longer held
    pub fn without(self, key: KeyCode) -> Modifiers {
        match key.as_modifier() {
            Some(m) => Modifiers {
                ctrl: self.ctrl && !m.ctrl,
                alt: self.alt && !m.alt,
                shift: self.shift && !m.shift,
                search: self.search && !m.search,
            },
            None => self,
        }
    }
}

/// Raw key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Bare key, no modifiers held
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, Modifiers::NONE)
    }
}

/// Pass-through progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassThroughPhase {
    #[default]
    NoPassThrough,
    /// Waiting for the keys of the pass-through shortcut to come up
    AwaitingShortcutKeyups,
    /// Waiting for the keys passed to the page to come up
    AwaitingPassedKeyups,
}

/// Decision for a key-down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyDisposition {
    /// The key must not reach the page
    pub consumed: bool,
    /// Command bound to the key combination
    pub command: Option<Command>,
}

impl KeyDisposition {
    fn propagate() -> Self {
        Self::default()
    }
}

/// Key arbiter state
#[derive(Debug, Default)]
pub struct KeyArbiter {
    eaten: HashSet<KeyCode>,
    passed_through: HashSet<KeyCode>,
    pass_through_enabled: bool,
    phase: PassThroughPhase,
    reserved: HashSet<KeyCode>,
}

impl KeyArbiter {
    pub fn new() -> Self { Self::default() }

    /// Arbiter that always consumes `reserved` keys
    pub fn with_reserved(reserved: impl IntoIterator<Item = KeyCode>) -> Self {
        Self { reserved: reserved.into_iter().collect(), ..Self::default() }
    }

    pub fn is_pass_through_enabled(&self) -> bool { self.pass_through_enabled }

    pub fn phase(&self) -> PassThroughPhase { self.phase }

    pub fn eaten(&self) -> &HashSet<KeyCode> { &self.eaten }

    pub fn passed_through(&self) -> &HashSet<KeyCode> { &self.passed_through }

    /// Let the next key combination through to the page
    pub fn enable_pass_through(&mut self) {
        self.pass_through_enabled = true;
        self.phase = PassThroughPhase::AwaitingShortcutKeyups;
        tracing::info!("Pass-through enabled");
    }

    pub fn on_key_down(&mut self, event: &KeyEvent, keymap: &Keymap) -> KeyDisposition {
        if event.modifiers.is_empty() {
            // A bare key-down means any earlier state is stale.
            self.eaten.clear();
            self.passed_through.clear();
        }

        let disposition = if self.pass_through_enabled {
            self.eaten.remove(&event.code);
            self.passed_through.insert(event.code);
            tracing::trace!("Passing {} through", event.code.name());
            KeyDisposition::propagate()
        } else {
            let combo = keymap.combo_for(event);
            let eat = match keymap.classify(&combo) {
                KeyMatch::Command(command) => Some(Some(command)),
                KeyMatch::Prefix if !self.eaten.is_empty() => Some(None),
                _ if self.reserved.contains(&event.code) => Some(None),
                _ => None,
            };
            match eat {
                Some(command) => {
                    self.passed_through.remove(&event.code);
                    self.eaten.insert(event.code);
                    tracing::trace!("Eating {} ({:?})", combo.display(), command);
                    KeyDisposition { consumed: true, command }
                }
                None => KeyDisposition::propagate(),
            }
        };

        self.check_invariants();
        disposition
    }

    /// Returns whether the key-up is consumed.
    pub fn on_key_up(&mut self, event: &KeyEvent) -> bool {
        let consumed = self.eaten.remove(&event.code);

        if self.pass_through_enabled {
            self.passed_through.remove(&event.code);
            let held = event.modifiers.without(event.code);
            match self.phase {
                PassThroughPhase::AwaitingShortcutKeyups => {
                    if held.is_empty() && self.eaten.is_empty() {
                        self.phase = PassThroughPhase::AwaitingPassedKeyups;
                        tracing::debug!("Pass-through shortcut released");
                    }
                }
                PassThroughPhase::AwaitingPassedKeyups => {
                    if self.passed_through.is_empty() {
                        self.pass_through_enabled = false;
                        self.phase = PassThroughPhase::NoPassThrough;
                        tracing::info!("Pass-through finished");
                    }
                }
                PassThroughPhase::NoPassThrough => {}
            }
        }

        self.check_invariants();
        consumed
    }

    /// Recover from a violated invariant; panics in debug builds.
    fn check_invariants(&mut self) {
        let overlap = !self.eaten.is_disjoint(&self.passed_through);
        debug_assert!(!overlap, "key both eaten and passed through");
        if overlap {
            tracing::warn!("Key both eaten and passed through; resetting key state");
            self.eaten.clear();
            self.passed_through.clear();
        }

        let stray_phase = !self.pass_through_enabled && self.phase != PassThroughPhase::NoPassThrough;
        debug_assert!(!stray_phase, "pass-through phase without pass-through");
        if stray_phase {
            tracing::warn!("Pass-through phase {:?} while disabled; resetting", self.phase);
            self.phase = PassThroughPhase::NoPassThrough;
        }
    }
}
