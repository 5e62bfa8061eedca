// src/system/fzf.rs

//! # fzf Picker
//!
//! Builds fzf command lines and runs fzf over a menu. Exit status 1 (no match) and 130
//! (interrupted) are cancellations, not errors.
use crate::constants::{BACK_KEY, KILL_KEY};
use crate::core::picker::{PickerResponse, parse_picker_output};
use crate::models::Settings;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum PickerError {
    #[error("Could not start fzf: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Could not talk to fzf: {0}")]
    Io(#[source] std::io::Error),
    #[error("fzf exited with status {0}")]
    Failed(i32),
    #[error("fzf was terminated by a signal")]
    Killed,
}

/// Shows lines to the user and reports the pick.
#[async_trait]
pub trait Picker: Send + Sync + std::fmt::Debug {
    /// `Ok(None)` means the user canceled.
    async fn pick(
        &self,
        input: &str,
        options: &[String],
    ) -> Result<Option<PickerResponse>, PickerError>;
}

#[derive(Debug, Clone, Default)]
pub struct FzfPicker;

impl FzfPicker {
    /// Whether `fzf` can be found on `PATH`.
    pub fn is_available() -> bool {
        std::env::var_os("PATH").is_some_and(|paths| {
            std::env::split_paths(&paths).any(|dir| dir.join("fzf").is_file())
        })
    }
}

#[async_trait]
impl Picker for FzfPicker {
    async fn pick(
        &self,
        input: &str,
        options: &[String],
    ) -> Result<Option<PickerResponse>, PickerError> {
        let mut child = Command::new("fzf")
            .args(options)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(PickerError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(PickerError::Io)?;
        }
        let output = child.wait_with_output().await.map_err(PickerError::Io)?;

        match output.status.code() {
            Some(0) => Ok(parse_picker_output(&String::from_utf8_lossy(&output.stdout))),
            Some(1) | Some(130) => Ok(None),
            Some(code) => Err(PickerError::Failed(code)),
            None => Err(PickerError::Killed),
        }
    }
}

// --- Options ---

/// Assembles fzf arguments from the styling settings.
#[derive(Debug, Clone)]
pub struct PickerOptions<'a> {
    settings: &'a Settings,
    border_label: String,
    header: String,
    expect_keys: Vec<String>,
    binds: Vec<String>,
}

impl<'a> PickerOptions<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            border_label: String::new(),
            header: String::new(),
            expect_keys: Vec::new(),
            binds: Vec::new(),
        }
    }

    pub fn border_label(mut self, label: impl Into<String>) -> Self {
        self.border_label = label.into();
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn expect_key(mut self, key: &str) -> Self {
        if !key.is_empty() {
            self.expect_keys.push(key.to_string());
        }
        self
    }

    pub fn bind(mut self, key: &str, action: &str) -> Self {
        self.binds.push(format!("{}:{}", key, action));
        self
    }

    pub fn build(self) -> Vec<String> {
        let s = self.settings;
        let mut opts: Vec<String> = [
            "--ansi",
            "--delimiter=\t",
            "--with-nth=1",
            "--tiebreak=begin",
            "--layout=reverse",
            "--height=100%",
            "--highlight-line",
            "--no-preview",
        ]
        .iter()
        .map(|o| o.to_string())
        .collect();

        let prompt = if s.fzf_prompt.is_empty() { " " } else { &s.fzf_prompt };
        opts.push(format!("--prompt={}", prompt));
        opts.push(format!("--pointer={}", s.fzf_pointer));
        opts.push(format!("--border={}", s.fzf_border));
        if !self.border_label.is_empty() {
            opts.push(format!("--border-label={}", self.border_label));
            opts.push("--border-label-pos=3".to_string());
        }
        if !s.fzf_colors.is_empty() {
            opts.push(format!("--color={}", s.fzf_colors));
        }
        if !self.header.is_empty() {
            opts.push(format!("--header={}", self.header));
            opts.push("--header-first".to_string());
        }

        let mut expect = vec![BACK_KEY.to_string()];
        expect.extend(self.expect_keys);
        for key in [&s.secondary_key, &s.action_menu_key] {
            if !key.is_empty() {
                expect.push(key.clone());
            }
        }
        expect.extend(
            s.direct_action_keys()
                .iter()
                .filter(|(k, _)| !k.is_empty())
                .map(|(k, _)| k.to_string()),
        );
        opts.push(format!("--expect={}", expect.join(",")));

        opts.extend(self.binds.into_iter().map(|b| format!("--bind={}", b)));
        opts
    }
}

/// The help header, shown only when shortcuts are shown.
pub fn help_header(settings: &Settings) -> String {
    if !settings.show_help {
        return String::new();
    }
    let mut header = String::from("enter: open │ ");
    if !settings.secondary_key.is_empty() {
        header.push_str(&format!(
            "{}: {} │ ",
            settings.secondary_key, settings.secondary_action
        ));
    }
    if !settings.action_menu_key.is_empty() {
        header.push_str(&format!("{}: action menu │ ", settings.action_menu_key));
    }
    header.push_str("esc: back");
    header
}

/// Options for the main menu or a submenu.
///
/// `exe` is this binary, re-invoked by the shortcut, toggle and kill bindings.
/// `cwd` is shown in the border label when `show_cwd` is set.
pub fn menu_options(
    settings: &Settings,
    scope: &str,
    shortcuts: &HashMap<String, String>,
    exe: &Path,
    cwd: Option<&str>,
) -> Vec<String> {
    let exe = exe.display().to_string();
    let submenu_arg = if scope.is_empty() {
        String::new()
    } else {
        format!(" --submenu '{}'", scope)
    };

    let mut label = format!(" {}", settings.label);
    if !scope.is_empty() {
        label.push_str(&format!(": {}", scope));
    }
    if let Some(cwd) = cwd.filter(|_| settings.show_cwd) {
        label.push_str(&format!(" ({})", cwd));
    }
    label.push(' ');

    let mut builder = PickerOptions::new(settings)
        .border_label(label)
        .header(help_header(settings));

    if !settings.toggle_shortcuts_key.is_empty() {
        let flag = if settings.show_help {
            "--hide-shortcuts"
        } else {
            "--show-shortcuts"
        };
        builder = builder.bind(
            &settings.toggle_shortcuts_key,
            &format!("become({}{} {})", exe, submenu_arg, flag),
        );
    }

    let mut bound: Vec<(&String, &String)> = shortcuts.iter().collect();
    bound.sort();
    for (key, item) in bound {
        builder = builder.bind(key, &format!("become({} --launch-shortcut '{}')", exe, item));
    }

    let reload = format!(
        "{} --menu{}{}",
        exe,
        submenu_arg,
        if settings.show_help { " --show-shortcuts" } else { "" }
    );
    builder = builder.bind(
        KILL_KEY,
        &format!("reload({} --kill {{3}} 2>/dev/null; {})", exe, reload),
    );
    builder.build()
}

/// Options for a directory browser listing.
pub fn dirbrowser_options(settings: &Settings, name: &str) -> Vec<String> {
    PickerOptions::new(settings)
        .border_label(format!(" {}: {} ", settings.label, name))
        .header(help_header(settings))
        .build()
}

/// Options for the empty-config fallback menu.
pub fn empty_menu_options(settings: &Settings) -> Vec<String> {
    PickerOptions::new(settings)
        .border_label(format!(" {} ", settings.label))
        .header("No items configured. Add some apps to your config file.")
        .build()
}

/// Options for the action menu of one item.
pub fn action_menu_options(settings: &Settings, item_name: &str) -> Vec<String> {
    let mut opts = vec![
        "--ansi".to_string(),
        "--delimiter=\t".to_string(),
        "--with-nth=2".to_string(),
        "--height=100%".to_string(),
        "--layout=reverse".to_string(),
        "--border=rounded".to_string(),
        format!("--border-label= Action: {} ", item_name),
        "--border-label-pos=3".to_string(),
        "--no-info".to_string(),
        format!("--pointer={}", settings.fzf_pointer),
        format!("--expect=enter,{}", BACK_KEY),
    ];
    if !settings.fzf_colors.is_empty() {
        opts.push(format!("--color={}", settings.fzf_colors));
    }
    opts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn find<'a>(opts: &'a [String], prefix: &str) -> Vec<&'a str> {
        opts.iter()
            .filter(|o| o.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_expect_includes_back_secondary_action_menu_and_direct_keys() {
        let mut settings = Settings::default();
        settings.pane_right_key = "ctrl-l".to_string();
        let opts = PickerOptions::new(&settings).build();
        assert_eq!(find(&opts, "--expect="), ["--expect=esc,ctrl-o,ctrl-j,ctrl-l"]);
        assert_eq!(find(&opts, "--prompt="), ["--prompt= "]);
        assert!(find(&opts, "--border-label=").is_empty());
    }

    #[test]
    fn test_help_header() {
        let mut settings = Settings::default();
        assert_eq!(help_header(&settings), "");
        settings.show_help = true;
        assert_eq!(
            help_header(&settings),
            "enter: open │ ctrl-o: window │ ctrl-j: action menu │ esc: back"
        );
    }

    #[test]
    fn test_menu_options_bindings() {
        let settings = Settings::default();
        let mut shortcuts = HashMap::new();
        shortcuts.insert("alt-v".to_string(), "vim".to_string());
        let exe = PathBuf::from("/usr/bin/muxdeck");

        let opts = menu_options(&settings, "dev", &shortcuts, &exe, Some("~/src"));
        assert_eq!(find(&opts, "--border-label="), ["--border-label= muxdeck: dev (~/src) "]);

        let binds = find(&opts, "--bind=");
        assert_eq!(binds.len(), 3);
        assert_eq!(
            binds[0],
            "--bind=ctrl-/:become(/usr/bin/muxdeck --submenu 'dev' --show-shortcuts)"
        );
        assert_eq!(
            binds[1],
            "--bind=alt-v:become(/usr/bin/muxdeck --launch-shortcut 'vim')"
        );
        assert_eq!(
            binds[2],
            "--bind=ctrl-x:reload(/usr/bin/muxdeck --kill {3} 2>/dev/null; /usr/bin/muxdeck --menu --submenu 'dev')"
        );
    }

    #[test]
    fn test_cwd_hidden_when_disabled() {
        let mut settings = Settings::default();
        settings.show_cwd = false;
        let opts = menu_options(&settings, "", &HashMap::new(), Path::new("m"), Some("/x"));
        assert_eq!(find(&opts, "--border-label="), ["--border-label= muxdeck "]);
    }

    #[test]
    fn test_action_menu_options() {
        let opts = action_menu_options(&Settings::default(), "vim");
        assert!(opts.contains(&"--with-nth=2".to_string()));
        assert!(opts.contains(&"--border-label= Action: vim ".to_string()));
        assert!(opts.contains(&"--expect=enter,esc".to_string()));
        assert_eq!(find(&opts, "--color=").len(), 1);

        let mut plain = Settings::default();
        plain.fzf_colors.clear();
        let opts = action_menu_options(&plain, "vim");
        assert!(find(&opts, "--color").is_empty());
    }
}
