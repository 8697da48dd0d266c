//! Configuration
//!
//! Session settings, loadable from JSON:
//!
//! ```json
//! {
//!   "stickyMode": false,
//!   "maxAncestorDepth": 512,
//!   "reservedKeys": ["Search"],
//!   "defaultBindings": true,
//!   "bindings": [{ "shortcut": "Search+K", "command": "nextLink" }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::keyboard::KeyCode;
use crate::traversal::MAX_ANCESTOR_DEPTH;
use crate::VoxError;

/// One key binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub shortcut: String,
    pub command: Command,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoxConfig {
    /// Start with sticky mode on
    pub sticky_mode: bool,
    /// Bound on every upward tree walk
    pub max_ancestor_depth: usize,
    /// Keys always consumed, bound or not
    pub reserved_keys: Vec<String>,
    /// Start from the built-in bindings
    pub default_bindings: bool,
    pub bindings: Vec<BindingConfig>,
}

impl Default for VoxConfig {
    fn default() -> Self {
        Self {
            sticky_mode: false,
            max_ancestor_depth: MAX_ANCESTOR_DEPTH,
            reserved_keys: vec!["Search".to_string()],
            default_bindings: true,
            bindings: Vec::new(),
        }
    }
}

impl VoxConfig {
    pub fn from_json(json: &str) -> Result<Self, VoxError> {
        let config: Self = serde_json::from_str(json)?;
        tracing::debug!("Loaded config with {} bindings", config.bindings.len());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, VoxError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn reserved_key_codes(&self) -> Result<Vec<KeyCode>, VoxError> {
        self.reserved_keys.iter().map(|k| k.parse()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VoxConfig::from_json("{}").unwrap();
        assert_eq!(config, VoxConfig::default());
        assert_eq!(config.reserved_key_codes().unwrap(), vec![KeyCode::SEARCH]);
    }

    #[test]
    fn test_parse() {
        let config = VoxConfig::from_json(
            r#"{"stickyMode": true, "maxAncestorDepth": 64, "bindings": [{"shortcut": "Search+K", "command": "nextLink"}]}"#,
        )
        .unwrap();
        assert!(config.sticky_mode);
        assert_eq!(config.max_ancestor_depth, 64);
        assert_eq!(config.bindings[0].command, Command::NextLink);

        let back = VoxConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(VoxConfig::from_json("{"), Err(VoxError::Config(_))));
        assert!(matches!(
            VoxConfig::from_json(r#"{"bindings": [{"shortcut": "K", "command": "fly"}]}"#),
            Err(VoxError::Config(_))
        ));
        let config = VoxConfig { reserved_keys: vec!["Hyper".into()], ..VoxConfig::default() };
        assert!(matches!(config.reserved_key_codes(), Err(VoxError::UnknownKey(_))));
    }
}
