//! # Config Parser
//!
//! Turns the line-oriented config file into a typed [`Config`]. The grammar is small:
//! `[type]` / `[type:name]` section headers, `key = value` pairs, values continued
//! with a trailing backslash, `#` comments, and bare item names inside `[order]`
//! sections. Unknown section types and unknown keys are ignored.
use crate::core::keys;
use crate::models::{Action, App, Config, Dirbrowser, Menu, Settings, TaskrunnerConfig};
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};
use thiserror::Error;

lazy_static! {
    static ref SECTION_RE: Regex = Regex::new(r"^\[([^\]]+)\]$").unwrap();
    static ref KEY_VALUE_RE: Regex = Regex::new(r"^([^=]+)=(.*)$").unwrap();
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not open config file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),
}

/// Reads and parses the config file at `path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    log::debug!("Loading config from '{}'", path.display());
    let file = File::open(path).map_err(|source| ConfigError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_reader(BufReader::new(file))
}

/// Parses config text held in memory.
pub fn parse_str(text: &str) -> Config {
    let mut parser = Parser::new();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Parses config text from any buffered reader.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Config, ConfigError> {
    let mut parser = Parser::new();
    for line in reader.lines() {
        parser.feed(&line?);
    }
    Ok(parser.finish())
}

/// A section header split into its type and optional name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Section {
    kind: String,
    name: String,
}

impl Section {
    fn parse(header: &str) -> Self {
        match header.split_once(':') {
            Some((kind, name)) => Self {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            None => Self {
                kind: header.to_string(),
                name: String::new(),
            },
        }
    }

    fn is_settings(&self) -> bool {
        self.kind == "settings" && self.name.is_empty()
    }

    fn is_global_taskrunner(&self) -> bool {
        self.kind == "taskrunner" && self.name.is_empty()
    }

    fn is_order(&self) -> bool {
        self.kind == "order"
    }
}

/// A value being continued across physical lines.
#[derive(Debug)]
struct Continuation {
    key: String,
    fragments: Vec<String>,
}

/// Streaming parser state. Feed it physical lines, then call `finish`.
#[derive(Debug)]
struct Parser {
    config: Config,
    section: Option<Section>,
    data: HashMap<String, String>,
    continuation: Option<Continuation>,
}

impl Parser {
    fn new() -> Self {
        Self {
            config: Config::default(),
            section: None,
            data: HashMap::new(),
            continuation: None,
        }
    }

    fn feed(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return;
        }

        if let Some(mut continuation) = self.continuation.take() {
            match trimmed.strip_suffix('\\') {
                Some(fragment) => {
                    continuation.fragments.push(fragment.trim_end().to_string());
                    self.continuation = Some(continuation);
                }
                None => {
                    continuation.fragments.push(trimmed.to_string());
                    let value = continuation.fragments.join(" ");
                    self.assign(continuation.key, value);
                }
            }
            return;
        }

        if let Some(caps) = SECTION_RE.captures(trimmed) {
            self.flush();
            self.section = Some(Section::parse(&caps[1]));
            return;
        }

        if let Some(caps) = KEY_VALUE_RE.captures(trimmed) {
            let key = caps[1].trim().to_string();
            let value = caps[2].trim();
            match value.strip_suffix('\\') {
                Some(fragment) => {
                    self.continuation = Some(Continuation {
                        key,
                        fragments: vec![fragment.trim_end().to_string()],
                    });
                }
                None => self.assign(key, value.to_string()),
            }
            return;
        }

        // Bare lines only mean something inside [order] sections.
        if let Some(section) = &self.section {
            if section.is_order() {
                let entry = trimmed.to_string();
                if section.name.is_empty() {
                    self.config.order.main.push(entry);
                } else {
                    self.config
                        .order
                        .submenus
                        .entry(section.name.clone())
                        .or_default()
                        .push(entry);
                }
            }
        }
    }

    /// Routes a completed `key = value` pair.
    fn assign(&mut self, key: String, value: String) {
        match &self.section {
            Some(section) if section.is_settings() => {
                apply_setting(&mut self.config.settings, &key, &value);
            }
            Some(section) if section.is_global_taskrunner() => {
                apply_taskrunner_global(&mut self.config.settings, &key, &value);
            }
            Some(_) => {
                self.data.insert(key, value);
            }
            None => log::debug!("Ignoring '{}' outside of any section", key),
        }
    }

    /// Turns the open section's collected data into an entity.
    fn flush(&mut self) {
        let data = std::mem::take(&mut self.data);
        let Some(section) = self.section.take() else {
            return;
        };
        if data.is_empty() && !section.is_order() {
            log::debug!("Skipping empty section [{}:{}]", section.kind, section.name);
            return;
        }
        let config = &mut self.config;
        match section.kind.as_str() {
            "app" => config.apps.push(parse_app(&section.name, &data)),
            "menu" => config.menus.push(parse_menu(&section.name, &data)),
            "dirbrowser" => config
                .dirbrowsers
                .push(parse_dirbrowser(&section.name, &data)),
            "taskrunner" if !section.name.is_empty() => config
                .taskrunners
                .push(parse_taskrunner(&section.name, &data)),
            "settings" | "taskrunner" | "order" => {}
            other => log::debug!("Dropping section of unknown type '{}'", other),
        }
    }

    fn finish(mut self) -> Config {
        if let Some(continuation) = self.continuation.take() {
            // Input ended mid-continuation; keep what was collected.
            let value = continuation.fragments.join(" ");
            self.assign(continuation.key, value);
        }
        self.flush();

        for app in &mut self.config.apps {
            if let Some((parent, _)) = app.name.split_once('/') {
                app.parent = parent.to_string();
            }
        }
        self.config
    }
}

// --- Field dispatch ---

fn parse_int(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

fn parse_bool(value: &str) -> bool {
    value == "true"
}

fn parse_app(name: &str, data: &HashMap<String, String>) -> App {
    let mut app = App {
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in data {
        match key.as_str() {
            "cmd" => app.cmd = value.clone(),
            "desc" => app.desc = value.clone(),
            "width" => app.width = value.clone(),
            "height" => app.height = value.clone(),
            "status" => app.status = value.clone(),
            "status_script" => app.status_script = value.clone(),
            "on_exit" => app.on_exit = value.clone(),
            "shortcut" => app.shortcut = value.clone(),
            "primary_action" => app.primary_action = Some(Action::parse(value)),
            "secondary_action" => app.secondary_action = Some(Action::parse(value)),
            _ => {}
        }
    }
    app
}

fn parse_menu(name: &str, data: &HashMap<String, String>) -> Menu {
    let mut menu = Menu {
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in data {
        match key.as_str() {
            "desc" => menu.desc = value.clone(),
            "status" => menu.status = value.clone(),
            "cache_ttl" => menu.cache_ttl = parse_int(value),
            "shortcut" => menu.shortcut = value.clone(),
            _ => {}
        }
    }
    menu
}

fn parse_dirbrowser(name: &str, data: &HashMap<String, String>) -> Dirbrowser {
    let mut db = Dirbrowser {
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in data {
        match key.as_str() {
            "directory" => db.directory = value.clone(),
            "depth" => db.depth = parse_int(value),
            "sort" => db.sort = value.clone(),
            "sort_direction" => db.sort_direction = value.clone(),
            "glob" => db.glob = value.clone(),
            "width" => db.width = value.clone(),
            "height" => db.height = value.clone(),
            "cache_ttl" => db.cache_ttl = parse_int(value),
            "shortcut" => db.shortcut = value.clone(),
            "primary_action" => db.primary_action = Some(Action::parse(value)),
            "secondary_action" => db.secondary_action = Some(Action::parse(value)),
            _ => {}
        }
    }
    db
}

fn parse_taskrunner(name: &str, data: &HashMap<String, String>) -> TaskrunnerConfig {
    let mut tr = TaskrunnerConfig::new(name);
    for (key, value) in data {
        match key.as_str() {
            "enabled" => tr.enabled = parse_bool(value),
            "icon" => tr.icon = value.clone(),
            "label" => tr.label = value.clone(),
            "primary_action" => tr.primary_action = Action::parse(value),
            "secondary_action" => tr.secondary_action = Action::parse(value),
            _ => {}
        }
    }
    tr
}

/// Applies one `[settings]` key. Unknown keys are ignored.
///
/// Key bindings are stored normalized so they compare equal to what the picker reports.
pub fn apply_setting(s: &mut Settings, key: &str, value: &str) {
    let value = if key.ends_with("_key") {
        keys::normalize(value)
    } else {
        value.to_string()
    };
    match key {
        "icon_running" => s.icon_running = value,
        "icon_stopped" => s.icon_stopped = value,
        "menu_width" => s.menu_width = value,
        "menu_height" => s.menu_height = value,
        "max_menu_width" => s.max_menu_width = value,
        "max_menu_height" => s.max_menu_height = value,
        "popup_width" => s.popup_width = value,
        "popup_height" => s.popup_height = value,
        "max_popup_width" => s.max_popup_width = value,
        "max_popup_height" => s.max_popup_height = value,
        "primary_key" => s.primary_key = value,
        "secondary_key" => s.secondary_key = value,
        "primary_action" => s.primary_action = Action::parse(&value),
        "secondary_action" => s.secondary_action = Action::parse(&value),
        "popup_key" => s.popup_key = value,
        "window_key" => s.window_key = value,
        "background_window_key" => s.background_window_key = value,
        "pane_right_key" => s.pane_right_key = value,
        "pane_left_key" => s.pane_left_key = value,
        "pane_above_key" => s.pane_above_key = value,
        "pane_below_key" => s.pane_below_key = value,
        "action_menu_key" => s.action_menu_key = value,
        "toggle_shortcuts_key" => s.toggle_shortcuts_key = value,
        "label" => s.label = value,
        "show_help" => s.show_help = parse_bool(&value),
        "show_cwd" => s.show_cwd = parse_bool(&value),
        "cache_ttl" => s.cache_ttl = parse_int(&value),
        "fzf_prompt" => s.fzf_prompt = value,
        "fzf_pointer" => s.fzf_pointer = value,
        "fzf_border" => s.fzf_border = value,
        "fzf_colors" => s.fzf_colors = value,
        "exclude_patterns" => s.exclude_patterns = value,
        _ => {}
    }
}

fn apply_taskrunner_global(s: &mut Settings, key: &str, value: &str) {
    match key {
        "icon_running" => s.taskrunner_icon_running = value.to_string(),
        "icon_success" => s.taskrunner_icon_success = value.to_string(),
        "icon_failed" => s.taskrunner_icon_failed = value.to_string(),
        _ => {}
    }
}
