// src/cli/mod.rs

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub mod handlers;

/// muxdeck: a keyboard-driven launcher for tmux.
///
/// Without flags, opens the menu. The remaining modes are mostly invoked by the picker's
/// own key bindings (`--launch-shortcut`, `--kill`, `--menu`). `--debug` alone prints
/// diagnostics; combine it with a mode, or set `RUST_LOG=debug`, to log a session.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the discovered one.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Open this submenu instead of the root menu.
    #[arg(long, value_name = "NAME", default_value = "")]
    pub submenu: String,

    /// List the configured apps, menus and directory browsers.
    #[arg(long)]
    pub list: bool,

    /// Print the menu content and exit.
    #[arg(long)]
    pub menu: bool,

    /// Launch an item by name with its primary action.
    #[arg(long, value_name = "NAME")]
    pub launch_shortcut: Option<String>,

    /// Kill the window with this name.
    #[arg(long, value_name = "NAME")]
    pub kill: Option<String>,

    /// Show the shortcut column and help header.
    #[arg(long, conflicts_with = "hide_shortcuts")]
    pub show_shortcuts: bool,

    /// Hide the shortcut column and help header.
    #[arg(long)]
    pub hide_shortcuts: bool,

    /// Log at debug level and mirror the log to stderr. On its own, print diagnostics.
    #[arg(long)]
    pub debug: bool,

    /// Print the log file path and exit.
    #[arg(long)]
    pub log: bool,

    /// Print the shell hook that saves each pane's environment, then exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    pub shell_init: Option<InitShell>,
}

/// Shells with a `--shell-init` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InitShell {
    Bash,
    Zsh,
    Fish,
}

impl Cli {
    /// The `show_help` override requested on the command line, if any.
    pub fn shortcuts_override(&self) -> Option<bool> {
        if self.show_shortcuts {
            Some(true)
        } else if self.hide_shortcuts {
            Some(false)
        } else {
            None
        }
    }

    /// `--debug` with no mode or menu flag asks for diagnostics only.
    pub fn wants_diagnostics(&self) -> bool {
        self.debug
            && !self.list
            && !self.menu
            && self.launch_shortcut.is_none()
            && self.kill.is_none()
            && self.submenu.is_empty()
            && self.shortcuts_override().is_none()
    }
}
