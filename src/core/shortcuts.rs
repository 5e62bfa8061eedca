//! # Shortcut Validation
//!
//! A shortcut must be a key the picker recognizes, must not collide with a key that
//! already has a meaning in the menu, and must not be claimed by another item.
//! The reserved set is derived from the current [`Settings`] every time it is needed,
//! so rebinding e.g. the secondary key frees the old key for shortcuts.
use crate::core::keys::{self, HARD_RESERVED_KEYS};
use crate::models::Settings;
use std::collections::HashMap;
use thiserror::Error;

/// A rejected shortcut. `Display` is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("'{key}' is not a valid picker key")]
    InvalidKey { key: String, item: String },
    #[error("'{key}' is reserved ({reason})")]
    Reserved {
        key: String,
        item: String,
        reason: String,
    },
    #[error("'{key}' is already used by '{owner}'")]
    AlreadyUsed {
        key: String,
        item: String,
        owner: String,
    },
}

impl ShortcutError {
    /// The item whose shortcut was rejected.
    pub fn item_name(&self) -> &str {
        match self {
            Self::InvalidKey { item, .. }
            | Self::Reserved { item, .. }
            | Self::AlreadyUsed { item, .. } => item,
        }
    }

    /// The shortcut as written in the config.
    pub fn key(&self) -> &str {
        match self {
            Self::InvalidKey { key, .. }
            | Self::Reserved { key, .. }
            | Self::AlreadyUsed { key, .. } => key,
        }
    }
}

/// Computes the reserved keys for `settings`, mapped to the reason they are reserved.
///
/// Later entries overwrite earlier ones, so a hard-reserved key that is also the
/// configured primary key reports `primary_key`.
pub fn reserved_keys(settings: &Settings) -> HashMap<String, String> {
    let mut reserved: HashMap<String, String> = HARD_RESERVED_KEYS
        .iter()
        .map(|k| ((*k).to_string(), format!("reserved by {}", crate::constants::APP_NAME)))
        .collect();

    let configured = [
        (&settings.primary_key, "primary_key"),
        (&settings.secondary_key, "secondary_key"),
        (&settings.action_menu_key, "action_menu_key"),
        (&settings.toggle_shortcuts_key, "toggle_shortcuts_key"),
        (&settings.popup_key, "popup_key"),
        (&settings.window_key, "window_key"),
        (&settings.background_window_key, "background_window_key"),
        (&settings.pane_right_key, "pane_right_key"),
        (&settings.pane_left_key, "pane_left_key"),
        (&settings.pane_above_key, "pane_above_key"),
        (&settings.pane_below_key, "pane_below_key"),
    ];
    for (key, field) in configured {
        if !key.is_empty() {
            reserved.insert(keys::normalize(key), field.to_string());
        }
    }
    reserved
}

/// Validates one shortcut against the whitelist, the reserved set and `registered`
/// (normalized key -> item name). An empty key is always valid.
pub fn validate_shortcut(
    key: &str,
    item_name: &str,
    settings: &Settings,
    registered: &HashMap<String, String>,
) -> Result<(), ShortcutError> {
    if key.is_empty() {
        return Ok(());
    }
    let normalized = keys::normalize(key);

    if !keys::is_valid_key(&normalized) {
        return Err(ShortcutError::InvalidKey {
            key: key.to_string(),
            item: item_name.to_string(),
        });
    }

    if let Some(reason) = reserved_keys(settings).remove(&normalized) {
        return Err(ShortcutError::Reserved {
            key: key.to_string(),
            item: item_name.to_string(),
            reason,
        });
    }

    match registered.get(&normalized) {
        Some(owner) if owner != item_name => Err(ShortcutError::AlreadyUsed {
            key: key.to_string(),
            item: item_name.to_string(),
            owner: owner.clone(),
        }),
        _ => Ok(()),
    }
}

/// Collects shortcuts for one registry build, keeping every rejection.
#[derive(Debug)]
pub struct ShortcutValidator<'a> {
    settings: &'a Settings,
    registered: HashMap<String, String>,
    errors: Vec<ShortcutError>,
}

impl<'a> ShortcutValidator<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            registered: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Validates `key` for `item_name` and registers it on success.
    /// A rejection is also recorded in [`errors`](Self::errors).
    pub fn register(&mut self, key: &str, item_name: &str) -> Result<(), ShortcutError> {
        if key.is_empty() {
            return Ok(());
        }
        if let Err(e) = validate_shortcut(key, item_name, self.settings, &self.registered) {
            log::debug!("Rejected shortcut for '{}': {}", item_name, e);
            self.errors.push(e.clone());
            return Err(e);
        }
        self.registered
            .insert(keys::normalize(key), item_name.to_string());
        Ok(())
    }

    #[cfg(test)]
    pub fn errors(&self) -> &[ShortcutError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Normalized key -> item name for every accepted shortcut.
    #[cfg(test)]
    pub fn shortcuts(&self) -> &HashMap<String, String> {
        &self.registered
    }

    /// Consumes the validator, returning the accepted shortcuts and the rejections.
    pub fn into_parts(self) -> (HashMap<String, String>, Vec<ShortcutError>) {
        (self.registered, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reserved_keys() {
        let reserved = reserved_keys(&Settings::default());
        for key in ["enter", "esc", "ctrl-x", "ctrl-o", "ctrl-j", "ctrl-/"] {
            assert!(reserved.contains_key(key), "expected '{}' to be reserved", key);
        }
        assert_eq!(reserved["ctrl-o"], "secondary_key");
        assert_eq!(reserved["enter"], "primary_key");
    }

    #[test]
    fn test_validate_shortcut_rules() {
        let settings = Settings::default();
        let mut registered = HashMap::new();

        assert!(validate_shortcut("alt-a", "myapp", &settings, &registered).is_ok());
        assert!(validate_shortcut("", "myapp", &settings, &registered).is_ok());
        assert!(matches!(
            validate_shortcut("x", "myapp", &settings, &registered),
            Err(ShortcutError::InvalidKey { .. })
        ));
        assert!(matches!(
            validate_shortcut("ESC", "myapp", &settings, &registered),
            Err(ShortcutError::Reserved { .. })
        ));

        registered.insert("alt-b".to_string(), "otherapp".to_string());
        let err = validate_shortcut("alt-b", "myapp", &settings, &registered).unwrap_err();
        assert_eq!(err.to_string(), "'alt-b' is already used by 'otherapp'");
        assert_eq!(err.item_name(), "myapp");
    }

    #[test]
    fn test_reserved_message_names_the_field() {
        let settings = Settings::default();
        let err = validate_shortcut("ctrl-j", "app", &settings, &HashMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "'ctrl-j' is reserved (action_menu_key)");
    }

    #[test]
    fn test_same_key_for_two_items_keeps_first_registrant() {
        let settings = Settings::default();
        let mut v = ShortcutValidator::new(&settings);

        assert!(v.register("alt-a", "app1").is_ok());
        assert!(v.register("ALT-A", "app2").is_err());

        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.shortcuts()["alt-a"], "app1");
        assert_eq!(v.shortcuts().len(), 1);
    }

    #[test]
    fn test_secondary_key_change_moves_reservation() {
        let mut settings = Settings::default();
        settings.secondary_key = "alt-z".to_string();

        let reserved = reserved_keys(&settings);
        assert!(reserved.contains_key("alt-z"));
        assert!(!reserved.contains_key("ctrl-o"));

        let mut v = ShortcutValidator::new(&settings);
        assert!(v.register("alt-z", "app").is_err());
        assert!(v.register("ctrl-o", "app").is_ok());
    }

    #[test]
    fn test_empty_and_invalid_keys_are_not_registered() {
        let settings = Settings::default();
        let mut v = ShortcutValidator::new(&settings);
        assert!(v.register("", "app").is_ok());
        assert!(v.register("invalid-key", "app").is_err());
        assert!(v.shortcuts().is_empty());
        assert!(v.has_errors());
    }
}
