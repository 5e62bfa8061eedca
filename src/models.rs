// src/models.rs

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

// --- LAUNCH ACTIONS ---

/// The ways an item can be opened by the process-control layer.
///
/// Configured values that do not name a known action are preserved verbatim in
/// `Other`, so a typo in the config file surfaces at launch time instead of
/// silently turning into a different action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Action {
    #[default]
    Popup,
    Window,
    BackgroundWindow,
    PaneRight,
    PaneLeft,
    PaneAbove,
    PaneBelow,
    Other(String),
}

impl Action {
    /// Every known action, in the order the action menu presents them.
    pub fn known() -> [Self; 7] {
        [
            Self::Popup,
            Self::Window,
            Self::BackgroundWindow,
            Self::PaneRight,
            Self::PaneLeft,
            Self::PaneAbove,
            Self::PaneBelow,
        ]
    }

    /// Parses a configured action string. Never fails.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "popup" => Self::Popup,
            "window" => Self::Window,
            "background_window" => Self::BackgroundWindow,
            "pane_right" => Self::PaneRight,
            "pane_left" => Self::PaneLeft,
            "pane_above" => Self::PaneAbove,
            "pane_below" => Self::PaneBelow,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Popup => "popup",
            Self::Window => "window",
            Self::BackgroundWindow => "background_window",
            Self::PaneRight => "pane_right",
            Self::PaneLeft => "pane_left",
            Self::PaneAbove => "pane_above",
            Self::PaneBelow => "pane_below",
            Self::Other(raw) => raw,
        }
    }

    /// Human readable label used by the action menu.
    pub fn label(&self) -> &str {
        match self {
            Self::Popup => "Open in popup",
            Self::Window => "Open in window",
            Self::BackgroundWindow => "Open in background window",
            Self::PaneRight => "Open in pane to the right",
            Self::PaneLeft => "Open in pane to the left",
            Self::PaneAbove => "Open in pane above",
            Self::PaneBelow => "Open in pane below",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- GLOBAL SETTINGS ---

/// Process-wide defaults. Built from `Default`, then mutated by the `[settings]`
/// and global `[taskrunner]` sections, then by CLI overrides. Read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub icon_running: String,
    pub icon_stopped: String,

    pub menu_width: String,
    pub menu_height: String,
    pub max_menu_width: String,
    pub max_menu_height: String,

    pub popup_width: String,
    pub popup_height: String,
    pub max_popup_width: String,
    pub max_popup_height: String,

    pub primary_key: String,
    pub secondary_key: String,
    pub primary_action: Action,
    pub secondary_action: Action,

    /// Direct action keys. Empty disables the key.
    pub popup_key: String,
    pub window_key: String,
    pub background_window_key: String,
    pub pane_right_key: String,
    pub pane_left_key: String,
    pub pane_above_key: String,
    pub pane_below_key: String,
    pub action_menu_key: String,
    pub toggle_shortcuts_key: String,

    pub label: String,
    /// Shows the help header and the shortcut column.
    pub show_help: bool,
    pub show_cwd: bool,
    pub cache_ttl: i64,

    pub fzf_prompt: String,
    pub fzf_pointer: String,
    pub fzf_border: String,
    pub fzf_colors: String,

    /// Comma separated exclude patterns for directory browsers.
    pub exclude_patterns: String,

    /// Directory holding helper scripts. Set at runtime, never parsed.
    pub bin_dir: Option<PathBuf>,

    pub taskrunner_icon_running: String,
    pub taskrunner_icon_success: String,
    pub taskrunner_icon_failed: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            icon_running: "●".to_string(),
            icon_stopped: "○".to_string(),

            menu_width: "60%".to_string(),
            menu_height: "50%".to_string(),
            max_menu_width: String::new(),
            max_menu_height: String::new(),

            popup_width: "90%".to_string(),
            popup_height: "90%".to_string(),
            max_popup_width: String::new(),
            max_popup_height: String::new(),

            primary_key: "enter".to_string(),
            secondary_key: "ctrl-o".to_string(),
            primary_action: Action::Popup,
            secondary_action: Action::Window,

            popup_key: String::new(),
            window_key: String::new(),
            background_window_key: String::new(),
            pane_right_key: String::new(),
            pane_left_key: String::new(),
            pane_above_key: String::new(),
            pane_below_key: String::new(),
            action_menu_key: "ctrl-j".to_string(),
            toggle_shortcuts_key: "ctrl-/".to_string(),

            label: crate::constants::APP_NAME.to_string(),
            show_help: false,
            show_cwd: true,
            cache_ttl: 60,

            fzf_prompt: String::new(),
            fzf_pointer: "▌".to_string(),
            fzf_border: "rounded".to_string(),
            fzf_colors: "fg+:white:bold,bg+:237,hl:214,hl+:214:bold,pointer:white,marker:green,header:gray,border:gray".to_string(),

            exclude_patterns: ".git, node_modules, Cache, cache, .cache, GPUCache, CachedData, blob_storage, Code Cache, Session Storage, Local Storage, IndexedDB, databases, *.db, *.db-*, *.sqlite*, *.log, *.png, *.jpg, *.jpeg, *.gif, *.ico, *.webp, *.woff*, *.ttf, *.lock, lock, *.pid".to_string(),

            bin_dir: None,

            taskrunner_icon_running: "🔄".to_string(),
            taskrunner_icon_success: "✅".to_string(),
            taskrunner_icon_failed: "❌".to_string(),
        }
    }
}

impl Settings {
    /// The seven direct action keys paired with the action each one triggers.
    pub fn direct_action_keys(&self) -> [(&str, Action); 7] {
        [
            (self.popup_key.as_str(), Action::Popup),
            (self.window_key.as_str(), Action::Window),
            (self.background_window_key.as_str(), Action::BackgroundWindow),
            (self.pane_right_key.as_str(), Action::PaneRight),
            (self.pane_left_key.as_str(), Action::PaneLeft),
            (self.pane_above_key.as_str(), Action::PaneAbove),
            (self.pane_below_key.as_str(), Action::PaneBelow),
        ]
    }
}

// --- CONFIGURED ENTITIES ---

/// An application launched by a shell command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct App {
    /// Full name. `parent/leaf` places the app inside a submenu.
    pub name: String,
    pub cmd: String,
    pub desc: String,
    pub width: String,
    pub height: String,
    /// Shell snippet printing a live status.
    pub status: String,
    /// Script sourced to print a live status. Wins over `status`.
    pub status_script: String,
    pub on_exit: String,
    pub shortcut: String,
    pub primary_action: Option<Action>,
    pub secondary_action: Option<Action>,
    /// Submenu this app belongs to, derived from `name`. Empty for the root menu.
    pub parent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    pub name: String,
    pub desc: String,
    pub status: String,
    pub cache_ttl: i64,
    pub shortcut: String,
}

/// A browser over the files below a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirbrowser {
    pub name: String,
    pub directory: String,
    pub depth: i64,
    /// `modified`, `modified-folder` or `alphabetical`.
    pub sort: String,
    /// `ascending` or `descending`.
    pub sort_direction: String,
    pub glob: String,
    pub width: String,
    pub height: String,
    pub cache_ttl: i64,
    pub shortcut: String,
    pub primary_action: Option<Action>,
    pub secondary_action: Option<Action>,
}

impl Default for Dirbrowser {
    fn default() -> Self {
        Self {
            name: String::new(),
            directory: String::new(),
            depth: 1,
            sort: "modified".to_string(),
            sort_direction: "descending".to_string(),
            glob: String::new(),
            width: "90%".to_string(),
            height: "80%".to_string(),
            cache_ttl: 300,
            shortcut: String::new(),
            primary_action: None,
            secondary_action: None,
        }
    }
}

/// A `[taskrunner:<name>]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskrunnerConfig {
    pub name: String,
    pub enabled: bool,
    pub icon: String,
    /// Defaults to the runner name.
    pub label: String,
    pub primary_action: Action,
    pub secondary_action: Action,
}

impl TaskrunnerConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: false,
            icon: String::new(),
            label: name.to_string(),
            primary_action: Action::Window,
            secondary_action: Action::BackgroundWindow,
        }
    }
}

/// Explicit item ordering for the root menu and for each submenu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderConfig {
    pub main: Vec<String>,
    pub submenus: HashMap<String, Vec<String>>,
}

impl OrderConfig {
    /// The order list for a scope. The root scope is the empty string.
    pub fn for_scope(&self, scope: &str) -> &[String] {
        if scope.is_empty() {
            &self.main
        } else {
            self.submenus.get(scope).map(Vec::as_slice).unwrap_or(&[])
        }
    }
}

/// Everything parsed from one config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub settings: Settings,
    pub apps: Vec<App>,
    pub menus: Vec<Menu>,
    pub dirbrowsers: Vec<Dirbrowser>,
    pub taskrunners: Vec<TaskrunnerConfig>,
    pub order: OrderConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse_round_trips_known_values() {
        for action in Action::known() {
            assert_eq!(Action::parse(action.as_str()), action);
        }
    }

    #[test]
    fn test_action_parse_keeps_unknown_values() {
        let action = Action::parse("floating");
        assert_eq!(action, Action::Other("floating".to_string()));
        assert_eq!(action.to_string(), "floating");
    }

    #[test]
    fn test_order_for_unknown_submenu_is_empty() {
        let order = OrderConfig {
            main: vec!["a".to_string()],
            ..Default::default()
        };
        assert_eq!(order.for_scope(""), ["a".to_string()]);
        assert!(order.for_scope("missing").is_empty());
    }
}
