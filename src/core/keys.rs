// src/core/keys.rs

use lazy_static::lazy_static;
use std::collections::HashSet;

/// Every key identifier the picker understands in `--expect` and `--bind`.
pub const SUPPORTED_KEYS: &[&str] = &[
    // Basic keys
    "enter", "space", "tab", "esc", "backspace", "delete", "insert",
    // Navigation
    "up", "down", "left", "right", "home", "end", "page-up", "page-down",
    // Function keys
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
    // Ctrl combinations
    "ctrl-a", "ctrl-b", "ctrl-c", "ctrl-d", "ctrl-e", "ctrl-f", "ctrl-g", "ctrl-h",
    "ctrl-i", "ctrl-j", "ctrl-k", "ctrl-l", "ctrl-m", "ctrl-n", "ctrl-o", "ctrl-p",
    "ctrl-q", "ctrl-r", "ctrl-s", "ctrl-t", "ctrl-u", "ctrl-v", "ctrl-w", "ctrl-x",
    "ctrl-y", "ctrl-z", "ctrl-space", "ctrl-delete", "ctrl-backspace",
    "ctrl-up", "ctrl-down", "ctrl-left", "ctrl-right",
    // Alt combinations
    "alt-a", "alt-b", "alt-c", "alt-d", "alt-e", "alt-f", "alt-g", "alt-h",
    "alt-i", "alt-j", "alt-k", "alt-l", "alt-m", "alt-n", "alt-o", "alt-p",
    "alt-q", "alt-r", "alt-s", "alt-t", "alt-u", "alt-v", "alt-w", "alt-x",
    "alt-y", "alt-z", "alt-enter", "alt-space", "alt-backspace", "alt-delete",
    "alt-up", "alt-down", "alt-left", "alt-right", "alt-page-up", "alt-page-down",
    // Shift combinations
    "shift-tab", "shift-up", "shift-down", "shift-left", "shift-right",
    "shift-home", "shift-end", "shift-delete", "shift-page-up", "shift-page-down",
    // Special
    "double-click", "ctrl-/",
];

/// Keys that can never be shortcuts: accept, leave the menu, kill-and-reload.
pub const HARD_RESERVED_KEYS: &[&str] = &["enter", "esc", "ctrl-x"];

lazy_static! {
    static ref SUPPORTED_SET: HashSet<&'static str> = SUPPORTED_KEYS.iter().copied().collect();
}

/// Lower-cases a key identifier for comparisons.
pub fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Returns `true` if `key` is a picker key identifier (case-insensitive).
pub fn is_valid_key(key: &str) -> bool {
    SUPPORTED_SET.contains(normalize(key).as_str())
}
