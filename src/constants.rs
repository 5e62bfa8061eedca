// src/constants.rs

use std::time::Duration;

/// The name of the application, used for config, cache and data directories.
pub const APP_NAME: &str = "muxdeck";

/// Environment variable that points directly at a config file.
pub const RC_FILE_ENV: &str = "MUXDECK_RC_FILE";

/// The dotfile searched upward from the working directory.
pub const RC_FILENAME: &str = ".muxdeckrc";

/// The config file name inside `$XDG_CONFIG_HOME/muxdeck/`.
pub const XDG_CONFIG_FILENAME: &str = "config";

/// The log file name inside the cache directory.
pub const LOG_FILENAME: &str = "muxdeck.log";

/// Helper wrapper that ships next to the binary and marks the helper directory.
pub const RUN_WRAPPER_FILENAME: &str = "muxdeck-run";

/// Per-pane environment snapshot written by the shell hook and restored by the run
/// wrapper. The pane id is appended.
pub const PANE_ENV_PREFIX: &str = "/tmp/muxdeck-env-";

/// Subdirectory holding task-runner provider scripts.
pub const TASKRUNNERS_DIR: &str = "taskrunners";

/// Sentinel names for the fallback menu shown when nothing is configured.
pub const EDIT_CONFIG_SENTINEL: &str = "__edit_config";
pub const OPEN_DOCS_SENTINEL: &str = "__open_docs";

/// Name-field prefix used by directory browser lines.
pub const DIRBROWSER_PREFIX: &str = "dirbrowser:";

/// The key that leaves the current menu level.
pub const BACK_KEY: &str = "esc";

/// The key bound to "kill the selected window and reload".
pub const KILL_KEY: &str = "ctrl-x";

/// Opened from the empty-config menu: the picker manual, which lists every valid key name.
pub const DOCS_URL: &str = "https://man.archlinux.org/man/fzf.1.en";

pub const STATUS_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
pub const PROVIDER_QUERY_TIMEOUT: Duration = Duration::from_millis(500);
pub const PROVIDER_TASKS_TIMEOUT: Duration = Duration::from_secs(2);
pub const FILE_COUNT_TIMEOUT: Duration = Duration::from_millis(500);

/// File counts above this are shown as "N+ files".
pub const FILE_COUNT_CAP: usize = 1000;

pub const MENU_ICON: &str = "▸";
pub const FILE_ICON: &str = "○";

/// ANSI 256-color gray used for dimmed text.
pub const DIM_START: &str = "\x1b[38;5;244m";
pub const DIM_END: &str = "\x1b[0m";
