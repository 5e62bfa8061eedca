// src/core/items.rs

//! # Menu Items
//!
//! Every line of the menu is an [`Item`]. The variants share one capability set (name,
//! kind, shortcut, parent, display name, render, resolved actions) and dispatch on the
//! variant, never on runtime type probing.
//!
//! Rendered lines are tab-delimited. The first field is the display segment, which embeds a
//! NUL byte between `icon name` and the description; the menu composer replaces it with
//! padding before the text leaves the process.
use crate::constants::{
    DIRBROWSER_PREFIX, FILE_COUNT_CAP, FILE_COUNT_TIMEOUT, MENU_ICON, STATUS_PROBE_TIMEOUT,
};
use crate::core::dirbrowser;
use crate::core::taskrunner::Task;
use crate::models::{Action, App, Dirbrowser, Menu, Settings, TaskrunnerConfig};
use crate::system::executor::{ShellRequest, ShellRunner};
use crate::system::file_lister::FileLister;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Separates `icon name` from the description inside a display segment.
pub const DISPLAY_SEPARATOR: char = '\x00';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    App,
    Menu,
    Dirbrowser,
    Taskrunner,
    Divider,
}

/// The collaborators a render may consult.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub shell: &'a dyn ShellRunner,
    pub files: &'a dyn FileLister,
    pub cancel: &'a CancellationToken,
}

// --- Item payloads ---

#[derive(Debug, Clone)]
pub struct AppItem {
    pub app: App,
    pub settings: Arc<Settings>,
}

impl AppItem {
    /// The leaf name; submenu apps drop their `parent/` prefix.
    pub fn display_name(&self) -> &str {
        if self.app.parent.is_empty() {
            return &self.app.name;
        }
        self.app
            .name
            .strip_prefix(&format!("{}/", self.app.parent))
            .unwrap_or(&self.app.name)
    }

    pub fn width(&self) -> &str {
        non_empty_or(&self.app.width, &self.settings.popup_width)
    }

    pub fn height(&self) -> &str {
        non_empty_or(&self.app.height, &self.settings.popup_height)
    }

    /// The status probe to run, if any. `status_script` wins over `status`.
    pub fn status_command(&self) -> Option<String> {
        if !self.app.status_script.is_empty() {
            Some(format!("source {}", self.app.status_script))
        } else if !self.app.status.is_empty() {
            Some(self.app.status.clone())
        } else {
            None
        }
    }

    async fn render(&self, ctx: RenderContext<'_>, is_running: bool) -> String {
        let icon = if is_running {
            &self.settings.icon_running
        } else {
            &self.settings.icon_stopped
        };
        let status = match self.status_command() {
            Some(cmd) => probe_status(ctx, &cmd, &self.settings).await,
            None => String::new(),
        };
        let desc = join_desc(&self.app.desc, &status);
        format!(
            "{}\t{}\t{}",
            display_segment(icon, self.display_name(), &desc),
            self.app.shortcut,
            self.app.name
        )
    }
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub menu: Menu,
    pub settings: Arc<Settings>,
}

impl MenuItem {
    async fn render(&self, ctx: RenderContext<'_>) -> String {
        let status = if self.menu.status.is_empty() {
            String::new()
        } else {
            probe_status(ctx, &self.menu.status, &self.settings).await
        };
        let desc = join_desc(&self.menu.desc, &status);
        format!(
            "{}\t{}\t{}",
            display_segment(MENU_ICON, &self.menu.name, &desc),
            self.menu.shortcut,
            self.menu.name
        )
    }
}

#[derive(Debug, Clone)]
pub struct DirbrowserItem {
    pub dirbrowser: Dirbrowser,
    pub settings: Arc<Settings>,
}

impl DirbrowserItem {
    pub fn width(&self) -> &str {
        non_empty_or(&self.dirbrowser.width, &self.settings.popup_width)
    }

    pub fn height(&self) -> &str {
        non_empty_or(&self.dirbrowser.height, &self.settings.popup_height)
    }

    /// Counts the browsable files, giving up after a short timeout.
    pub async fn file_count(&self, ctx: RenderContext<'_>) -> usize {
        let cancel = ctx.cancel.child_token();
        let counting =
            dirbrowser::count_files(&self.dirbrowser, &self.settings, ctx.files, &cancel);
        let count = match tokio::time::timeout(FILE_COUNT_TIMEOUT, counting).await {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => {
                log::debug!("File count for '{}' failed: {}", self.dirbrowser.name, e);
                0
            }
            Err(_) => {
                log::debug!("File count for '{}' timed out", self.dirbrowser.name);
                0
            }
        };
        cancel.cancel();
        count
    }

    async fn render(&self, ctx: RenderContext<'_>) -> String {
        let count = format_file_count(self.file_count(ctx).await);
        format!(
            "{}\t{}\t{}{}",
            display_segment(MENU_ICON, &self.dirbrowser.name, &count),
            self.dirbrowser.shortcut,
            DIRBROWSER_PREFIX,
            self.dirbrowser.name
        )
    }
}

/// One task of a loaded task runner.
#[derive(Debug, Clone)]
pub struct TaskItem {
    pub runner: TaskrunnerConfig,
    pub task: Task,
    /// Label reported by the provider or configured.
    pub label: String,
    pub settings: Arc<Settings>,
}

impl TaskItem {
    /// `runner:task`, the name carried in the menu line.
    pub fn name(&self) -> String {
        format!("{}:{}", self.runner.name, self.task.name)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.label, self.task.name)
    }

    /// The multiplexer window a task runs in.
    pub fn window_name(&self) -> String {
        format!("{} » {}", self.runner.name, self.task.name)
    }

    fn render(&self, is_running: bool) -> String {
        let icon = if is_running {
            &self.settings.taskrunner_icon_running
        } else {
            &self.settings.icon_stopped
        };
        format!(
            "{}\t\t{}\t{}",
            display_segment(icon, &self.display_name(), &self.task.description),
            self.name(),
            self.task.cmd
        )
    }
}

/// A non-selectable heading above a runner's tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divider {
    pub runner: String,
    pub icon: String,
    pub label: String,
}

impl Divider {
    fn render(&self) -> String {
        let icon_part = if self.icon.is_empty() {
            String::new()
        } else {
            format!(" {}", self.icon)
        };
        let content_len = self.label.len() + icon_part.len() + 2;
        let tail = "─".repeat(24usize.saturating_sub(content_len).max(3));
        format!("   ─── {}{} {}\t\t\t", self.label, icon_part, tail)
    }
}

// --- The item union ---

#[derive(Debug, Clone)]
pub enum Item {
    App(AppItem),
    Menu(MenuItem),
    Dirbrowser(DirbrowserItem),
    Task(TaskItem),
    Divider(Divider),
}

impl Item {
    pub fn name(&self) -> String {
        match self {
            Self::App(a) => a.app.name.clone(),
            Self::Menu(m) => m.menu.name.clone(),
            Self::Dirbrowser(d) => d.dirbrowser.name.clone(),
            Self::Task(t) => t.name(),
            Self::Divider(d) => format!("divider:{}", d.runner),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::App(_) => ItemKind::App,
            Self::Menu(_) => ItemKind::Menu,
            Self::Dirbrowser(_) => ItemKind::Dirbrowser,
            Self::Task(_) => ItemKind::Taskrunner,
            Self::Divider(_) => ItemKind::Divider,
        }
    }

    pub fn shortcut(&self) -> &str {
        match self {
            Self::App(a) => &a.app.shortcut,
            Self::Menu(m) => &m.menu.shortcut,
            Self::Dirbrowser(d) => &d.dirbrowser.shortcut,
            Self::Task(_) | Self::Divider(_) => "",
        }
    }

    /// The submenu this item lives in; empty for the root menu.
    pub fn parent(&self) -> &str {
        match self {
            Self::App(a) => &a.app.parent,
            _ => "",
        }
    }

    /// The name used for column width. Dividers contribute nothing.
    pub fn display_name(&self) -> String {
        match self {
            Self::App(a) => a.display_name().to_string(),
            Self::Menu(m) => m.menu.name.clone(),
            Self::Dirbrowser(d) => d.dirbrowser.name.clone(),
            Self::Task(t) => t.display_name(),
            Self::Divider(_) => String::new(),
        }
    }

    pub fn is_divider(&self) -> bool {
        matches!(self, Self::Divider(_))
    }

    /// The window name whose presence marks this item as running.
    pub fn window_name(&self) -> Option<String> {
        match self {
            Self::App(a) => Some(a.app.name.clone()),
            Self::Task(t) => Some(t.window_name()),
            _ => None,
        }
    }

    /// Formats the menu line. Never fails: probe failures yield an empty status.
    pub async fn render(&self, ctx: RenderContext<'_>, is_running: bool) -> String {
        match self {
            Self::App(a) => a.render(ctx, is_running).await,
            Self::Menu(m) => m.render(ctx).await,
            Self::Dirbrowser(d) => d.render(ctx).await,
            Self::Task(t) => t.render(is_running),
            Self::Divider(d) => d.render(),
        }
    }

    /// The action used when the item is accepted. Menus and dividers have none.
    pub fn primary_action(&self) -> Option<Action> {
        match self {
            Self::App(a) => Some(
                a.app
                    .primary_action
                    .clone()
                    .unwrap_or_else(|| a.settings.primary_action.clone()),
            ),
            Self::Dirbrowser(d) => Some(
                d.dirbrowser
                    .primary_action
                    .clone()
                    .unwrap_or_else(|| d.settings.primary_action.clone()),
            ),
            Self::Task(t) => Some(t.runner.primary_action.clone()),
            Self::Menu(_) | Self::Divider(_) => None,
        }
    }

    /// The action bound to the secondary key. Menus and dividers have none.
    pub fn secondary_action(&self) -> Option<Action> {
        match self {
            Self::App(a) => Some(
                a.app
                    .secondary_action
                    .clone()
                    .unwrap_or_else(|| a.settings.secondary_action.clone()),
            ),
            Self::Dirbrowser(d) => Some(
                d.dirbrowser
                    .secondary_action
                    .clone()
                    .unwrap_or_else(|| d.settings.secondary_action.clone()),
            ),
            Self::Task(t) => Some(t.runner.secondary_action.clone()),
            Self::Menu(_) | Self::Divider(_) => None,
        }
    }
}

// --- Helpers ---

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn display_segment(icon: &str, name: &str, desc: &str) -> String {
    format!("{} {}{}{}", icon, name, DISPLAY_SEPARATOR, desc)
}

fn join_desc(desc: &str, status: &str) -> String {
    match (desc.is_empty(), status.is_empty()) {
        (_, true) => desc.to_string(),
        (true, false) => status.to_string(),
        (false, false) => format!("{} {}", desc, status),
    }
}

/// `(N files)`, `(1 file)`, or `(1000+ files)` past the cap.
pub fn format_file_count(count: usize) -> String {
    if count > FILE_COUNT_CAP {
        format!("({}+ files)", FILE_COUNT_CAP)
    } else if count == 1 {
        "(1 file)".to_string()
    } else {
        format!("({} files)", count)
    }
}

/// Runs a status probe with the helper directory on `PATH`. Any failure is an empty status.
async fn probe_status(ctx: RenderContext<'_>, command: &str, settings: &Settings) -> String {
    let request =
        ShellRequest::new(command, STATUS_PROBE_TIMEOUT).extra_path(settings.bin_dir.clone());
    match ctx.shell.capture(&request, ctx.cancel).await {
        Ok(out) => out.trim().to_string(),
        Err(e) => {
            log::debug!("Status probe failed: {}", e);
            String::new()
        }
    }
}
