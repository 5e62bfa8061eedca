// src/core/actions.rs

//! # Action Resolution
//!
//! Maps the key token reported by the picker to a launch [`Action`]. Direct action keys
//! win over everything, then the secondary key, and anything else (the empty token included)
//! means the primary action. Unset (empty) direct keys never match.
use crate::core::items::Item;
use crate::models::{Action, Settings};

fn direct_action(key: &str, settings: &Settings) -> Option<Action> {
    if key.is_empty() {
        return None;
    }
    settings
        .direct_action_keys()
        .into_iter()
        .find(|(configured, _)| *configured == key)
        .map(|(_, action)| action)
}

/// Resolves `key` against the global settings only.
pub fn resolve_action(key: &str, settings: &Settings) -> Action {
    if let Some(action) = direct_action(key, settings) {
        return action;
    }
    if !key.is_empty() && key == settings.secondary_key {
        return settings.secondary_action.clone();
    }
    settings.primary_action.clone()
}

/// Resolves `key` for a specific item, honoring its own primary and secondary actions.
///
/// Items without actions of their own (menus, dividers) use the global resolution.
pub fn resolve_for_item(key: &str, settings: &Settings, item: &Item) -> Action {
    if let Some(action) = direct_action(key, settings) {
        return action;
    }
    let own = if !key.is_empty() && key == settings.secondary_key {
        item.secondary_action()
    } else {
        item.primary_action()
    };
    own.unwrap_or_else(|| resolve_action(key, settings))
}

/// Picker input for the action menu: one `action<TAB>label` line per known action.
pub fn action_menu_lines() -> String {
    Action::known()
        .iter()
        .map(|a| format!("{}\t{}", a.as_str(), a.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads the action back from a selected action menu line.
pub fn parse_action_menu_choice(fields: &[String]) -> Option<Action> {
    fields
        .first()
        .filter(|f| !f.is_empty())
        .map(|f| Action::parse(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::items::AppItem;
    use crate::models::App;
    use std::sync::Arc;

    fn app_item(primary: Option<Action>, settings: &Settings) -> Item {
        Item::App(AppItem {
            app: App {
                name: "btop".to_string(),
                primary_action: primary,
                ..Default::default()
            },
            settings: Arc::new(settings.clone()),
        })
    }

    #[test]
    fn test_accept_key_resolves_to_primary_popup() {
        let settings = Settings::default();
        assert_eq!(resolve_action("", &settings), Action::Popup);
        let item = app_item(None, &settings);
        assert_eq!(resolve_for_item("", &settings, &item), Action::Popup);
    }

    #[test]
    fn test_direct_key_beats_item_override() {
        let mut settings = Settings::default();
        settings.pane_right_key = "ctrl-l".to_string();
        let item = app_item(Some(Action::Window), &settings);

        assert_eq!(resolve_action("ctrl-l", &settings), Action::PaneRight);
        assert_eq!(resolve_for_item("ctrl-l", &settings, &item), Action::PaneRight);
        assert_eq!(resolve_for_item("", &settings, &item), Action::Window);
    }

    #[test]
    fn test_secondary_key() {
        let settings = Settings::default();
        assert_eq!(resolve_action("ctrl-o", &settings), Action::Window);

        let mut item_settings = settings.clone();
        item_settings.secondary_action = Action::PaneBelow;
        let item = app_item(None, &item_settings);
        assert_eq!(resolve_for_item("ctrl-o", &settings, &item), Action::PaneBelow);
    }

    #[test]
    fn test_unknown_key_falls_back_to_primary() {
        let settings = Settings::default();
        assert_eq!(resolve_action("alt-q", &settings), Action::Popup);
    }

    #[test]
    fn test_empty_direct_keys_do_not_swallow_accept() {
        let mut settings = Settings::default();
        settings.primary_action = Action::Window;
        // Every direct key is unset by default.
        assert_eq!(resolve_action("", &settings), Action::Window);
    }

    #[test]
    fn test_action_menu_lines() {
        let menu = action_menu_lines();
        let lines: Vec<&str> = menu.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "popup\tOpen in popup");
        assert_eq!(lines[6], "pane_below\tOpen in pane below");

        let choice = parse_action_menu_choice(&["pane_left".to_string(), "x".to_string()]);
        assert_eq!(choice, Some(Action::PaneLeft));
        assert_eq!(parse_action_menu_choice(&[]), None);
    }
}
