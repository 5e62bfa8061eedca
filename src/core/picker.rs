// src/core/picker.rs

//! # Picker Protocol
//!
//! The picker prints the key that ended the session on the first line (empty for the accept
//! key) and the selected line on the second. No output at all means nothing was selected.
use crate::constants::BACK_KEY;

/// A completed pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerResponse {
    pub key: String,
    pub line: String,
    /// `line` split on tabs.
    pub fields: Vec<String>,
}

impl PickerResponse {
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// Parses raw picker output. `None` means canceled.
///
/// Only one trailing newline is removed: a leading empty line is the accept key.
pub fn parse_picker_output(output: &str) -> Option<PickerResponse> {
    let output = output.strip_suffix('\n').unwrap_or(output);
    if output.is_empty() {
        return None;
    }
    let (key, line) = output.split_once('\n').unwrap_or((output, ""));
    let fields = if line.is_empty() {
        Vec::new()
    } else {
        line.split('\t').map(str::to_string).collect()
    };
    Some(PickerResponse {
        key: key.to_string(),
        line: line.to_string(),
        fields,
    })
}

/// What the menu loop should do with one picker round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEvent {
    /// Nothing picked: leave the loop.
    Canceled,
    /// The back key: pop one level.
    Back,
    /// A line without a name (a divider): show the menu again.
    Ignored,
    /// An item was picked with `key`.
    Picked { key: String, name: String },
}

impl MenuEvent {
    /// Classifies a picker round. `name_field` is the column carrying the item name;
    /// a selection too short to have that column counts as canceled.
    pub fn classify(response: Option<PickerResponse>, name_field: usize) -> Self {
        let Some(response) = response else {
            return Self::Canceled;
        };
        if response.key == BACK_KEY {
            return Self::Back;
        }
        match response.field(name_field) {
            None => Self::Canceled,
            Some("") => Self::Ignored,
            Some(name) => Self::Picked {
                name: name.to_string(),
                key: response.key,
            },
        }
    }
}

/// Where "back" leads from `scope`: a submenu returns to the root, the root exits.
pub fn back_target(scope: &str) -> Option<String> {
    if scope.is_empty() {
        None
    } else {
        Some(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_key_is_empty_first_line() {
        let r = parse_picker_output("\n○ vim  Editor\t\tvim\n").unwrap();
        assert_eq!(r.key, "");
        assert_eq!(r.fields, ["○ vim  Editor", "", "vim"]);
    }

    #[test]
    fn test_expected_key_is_reported() {
        let r = parse_picker_output("ctrl-o\n▸ dev\t\tdev\n").unwrap();
        assert_eq!(r.key, "ctrl-o");
        assert_eq!(r.field(2), Some("dev"));
    }

    #[test]
    fn test_empty_output_is_canceled() {
        assert_eq!(parse_picker_output(""), None);
        assert_eq!(parse_picker_output("\n"), None);
    }

    #[test]
    fn test_key_without_selection() {
        let r = parse_picker_output("esc\n").unwrap();
        assert_eq!(r.key, "esc");
        assert!(r.fields.is_empty());
        assert_eq!(MenuEvent::classify(Some(r), 2), MenuEvent::Back);
    }

    #[test]
    fn test_classify() {
        assert_eq!(MenuEvent::classify(None, 2), MenuEvent::Canceled);

        let picked = parse_picker_output("\nline\t\tvim");
        assert_eq!(
            MenuEvent::classify(picked, 2),
            MenuEvent::Picked {
                key: String::new(),
                name: "vim".to_string()
            }
        );

        // Dividers carry no name.
        let divider = parse_picker_output("\n   ─── just ───\t\t\t");
        assert_eq!(MenuEvent::classify(divider, 2), MenuEvent::Ignored);

        let short = parse_picker_output("\nonly-one-field");
        assert_eq!(MenuEvent::classify(short, 2), MenuEvent::Canceled);
    }

    #[test]
    fn test_go_back_from_submenu_then_root() {
        let mut scope = "finance".to_string();

        let next = back_target(&scope);
        assert_eq!(next.as_deref(), Some(""));
        scope = next.unwrap();
        assert_eq!(scope, "");

        assert_eq!(back_target(&scope), None);
    }
}
