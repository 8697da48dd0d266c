//! Key Bindings
//!
//! Maps key combinations to commands. A combination is a non-modifier key
//! plus the modifiers held with it, written like `Search+Shift+Escape`.

use std::collections::HashMap;

use crate::command::Command;
use crate::config::VoxConfig;
use crate::keyboard::{KeyCode, KeyEvent, Modifiers};
use crate::VoxError;

/// Key combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: KeyCode) -> Self { Self { key, modifiers: Modifiers::NONE } }
    pub fn search(mut self) -> Self { self.modifiers.search = true; self }
    pub fn ctrl(mut self) -> Self { self.modifiers.ctrl = true; self }
    pub fn alt(mut self) -> Self { self.modifiers.alt = true; self }
    pub fn shift(mut self) -> Self { self.modifiers.shift = true; self }

    /// Letter or digit key
    pub fn char(c: char) -> Self {
        Self::new(KeyCode(c.to_ascii_uppercase() as u16))
    }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.modifiers.search { parts.push("Search".to_string()); }
        if self.modifiers.ctrl { parts.push("Ctrl".to_string()); }
        if self.modifiers.alt { parts.push("Alt".to_string()); }
        if self.modifiers.shift { parts.push("Shift".to_string()); }
        if !self.key.is_modifier() {
            parts.push(self.key.name());
        }
        parts.join("+")
    }

    /// Parse `Search+Shift+Escape`. The last non-modifier part is the key; a
    /// combination of only modifiers binds the last of them.
    pub fn parse(s: &str) -> Result<Self, VoxError> {
        let invalid = || VoxError::InvalidShortcut(s.to_string());
        let mut modifiers = Modifiers::NONE;
        let mut key = None;
        let mut last_modifier = None;

        for part in s.split('+').map(str::trim) {
            if part.is_empty() {
                return Err(invalid());
            }
            let code = KeyCode::parse(part).ok_or_else(|| VoxError::UnknownKey(part.to_string()))?;
            match code.as_modifier() {
                Some(m) => {
                    modifiers = modifiers.union(m);
                    last_modifier = Some(code);
                }
                None if key.is_none() => key = Some(code),
                None => return Err(invalid()),
            }
        }

        match (key, last_modifier) {
            (Some(key), _) => Ok(Self { key, modifiers }),
            (None, Some(code)) => Ok(Self { key: code, modifiers: modifiers.without(code) }),
            (None, None) => Err(invalid()),
        }
    }
}

impl std::fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Result of looking up a combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    Command(Command),
    /// A modifier that can still grow into a bound combination
    Prefix,
    None,
}

/// Key binding table
#[derive(Debug, Default)]
pub struct Keymap {
    bindings: HashMap<KeyCombo, Command>,
}

impl Keymap {
    pub fn new() -> Self { Self::default() }

    pub fn with_defaults() -> Self {
        let mut keymap = Self::new();
        for (combo, command) in default_bindings() {
            keymap.bind(combo, command);
        }
        keymap
    }

    /// Keymap built from configuration; later bindings override earlier ones.
    pub fn from_config(config: &VoxConfig) -> Result<Self, VoxError> {
        let mut keymap = if config.default_bindings { Self::with_defaults() } else { Self::new() };
        for binding in &config.bindings {
            let combo = KeyCombo::parse(&binding.shortcut)?;
            tracing::debug!("Binding {} to {}", combo, binding.command);
            keymap.bind(combo, binding.command);
        }
        Ok(keymap)
    }

    pub fn bind(&mut self, combo: KeyCombo, command: Command) {
        self.bindings.insert(combo, command);
    }

    pub fn command_for(&self, combo: &KeyCombo) -> Option<Command> {
        self.bindings.get(combo).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Combination for a key-down: the key plus the other held modifiers
    pub fn combo_for(&self, event: &KeyEvent) -> KeyCombo {
        KeyCombo { key: event.code, modifiers: event.modifiers.without(event.code) }
    }

    pub fn classify(&self, combo: &KeyCombo) -> KeyMatch {
        if let Some(command) = self.command_for(combo) {
            return KeyMatch::Command(command);
        }
        let Some(own) = combo.key.as_modifier() else {
            return KeyMatch::None;
        };
        let held = combo.modifiers.union(own);
        if self.bindings.keys().any(|bound| held.is_subset_of(&bound.modifiers)) {
            KeyMatch::Prefix
        } else {
            KeyMatch::None
        }
    }
}

fn default_bindings() -> Vec<(KeyCombo, Command)> {
    use Command::*;

    let mut bindings = vec![
        (KeyCombo::new(KeyCode::ESCAPE).search().shift(), PassThroughMode),
        (KeyCombo::new(KeyCode::RIGHT).search(), NextObject),
        (KeyCombo::new(KeyCode::LEFT).search(), PreviousObject),
        (KeyCombo::new(KeyCode::DOWN).search(), NextLine),
        (KeyCombo::new(KeyCode::UP).search(), PreviousLine),
        (KeyCombo::new(KeyCode::RIGHT).search().shift(), NextCharacter),
        (KeyCombo::new(KeyCode::LEFT).search().shift(), PreviousCharacter),
        (KeyCombo::new(KeyCode::RIGHT).search().ctrl().shift(), NextWord),
        (KeyCombo::new(KeyCode::LEFT).search().ctrl().shift(), PreviousWord),
        (KeyCombo::new(KeyCode::LEFT).search().ctrl(), JumpToTop),
        (KeyCombo::new(KeyCode::RIGHT).search().ctrl(), JumpToBottom),
        (KeyCombo::new(KeyCode::DOWN).search().ctrl().alt(), NextRow),
        (KeyCombo::new(KeyCode::UP).search().ctrl().alt(), PreviousRow),
        (KeyCombo::new(KeyCode::RIGHT).search().ctrl().alt(), NextCol),
        (KeyCombo::new(KeyCode::LEFT).search().ctrl().alt(), PreviousCol),
        (KeyCombo::new(KeyCode::SEMICOLON).search(), NextLandmark),
        (KeyCombo::new(KeyCode::SEMICOLON).search().shift(), PreviousLandmark),
        (KeyCombo::char('r').search(), ReadFromHere),
        (KeyCombo::char('a').search().alt(), JumpToDetails),
    ];

    let jumps = [
        ('b', NextButton, PreviousButton),
        ('c', NextComboBox, PreviousComboBox),
        ('e', NextEditText, PreviousEditText),
        ('f', NextFormField, PreviousFormField),
        ('g', NextGraphic, PreviousGraphic),
        ('h', NextHeading, PreviousHeading),
        ('i', NextSimilarItem, PreviousSimilarItem),
        ('j', NextList, PreviousList),
        ('l', NextLink, PreviousLink),
        ('t', NextTable, PreviousTable),
        ('v', NextVisitedLink, PreviousVisitedLink),
        ('x', NextCheckbox, PreviousCheckbox),
        ('1', NextHeading1, PreviousHeading1),
        ('2', NextHeading2, PreviousHeading2),
        ('3', NextHeading3, PreviousHeading3),
        ('4', NextHeading4, PreviousHeading4),
        ('5', NextHeading5, PreviousHeading5),
        ('6', NextHeading6, PreviousHeading6),
    ];
    for (key, next, previous) in jumps {
        bindings.push((KeyCombo::char(key).search(), next));
        bindings.push((KeyCombo::char(key).search().shift(), previous));
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_display_and_parse() {
        let combo = KeyCombo::new(KeyCode::ESCAPE).search().shift();
        assert_eq!(combo.display(), "Search+Shift+Escape");
        assert_eq!(KeyCombo::parse("Search+Shift+Escape").unwrap(), combo);
        assert_eq!(KeyCombo::parse("shift + search + esc").unwrap(), combo);
        assert_eq!(KeyCombo::parse("Search+h").unwrap(), KeyCombo::char('h').search());
    }

    #[test]
    fn test_combo_parse_errors() {
        assert!(matches!(KeyCombo::parse(""), Err(VoxError::InvalidShortcut(_))));
        assert!(matches!(KeyCombo::parse("Search+H+J"), Err(VoxError::InvalidShortcut(_))));
        assert!(matches!(KeyCombo::parse("Search+Hyper"), Err(VoxError::UnknownKey(_))));
        let ctrl = KeyCombo::parse("Ctrl").unwrap();
        assert_eq!(ctrl.key, KeyCode::CONTROL);
        assert!(ctrl.modifiers.is_empty());
    }

    #[test]
    fn test_classify() {
        let keymap = Keymap::with_defaults();
        let event = KeyEvent::new(KeyCode::ESCAPE, Modifiers::SEARCH.union(Modifiers::SHIFT));
        assert_eq!(keymap.classify(&keymap.combo_for(&event)), KeyMatch::Command(Command::PassThroughMode));

        let shift = KeyEvent::new(KeyCode::SHIFT, Modifiers::SEARCH.union(Modifiers::SHIFT));
        assert_eq!(keymap.classify(&keymap.combo_for(&shift)), KeyMatch::Prefix);

        let plain = KeyEvent::key(KeyCode(72));
        assert_eq!(keymap.classify(&keymap.combo_for(&plain)), KeyMatch::None);
    }

    #[test]
    fn test_from_config_overrides() {
        let config = VoxConfig::from_json(
            r#"{"defaultBindings": false, "bindings": [{"shortcut": "Search+K", "command": "nextLink"}]}"#,
        )
        .unwrap();
        let keymap = Keymap::from_config(&config).unwrap();
        assert_eq!(keymap.len(), 1);
        assert_eq!(keymap.command_for(&KeyCombo::char('k').search()), Some(Command::NextLink));
    }
}
