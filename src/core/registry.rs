// src/core/registry.rs

//! # Item Registry
//!
//! Wraps the parsed entities into [`Item`]s, validates their shortcuts and indexes them.
//! Lookups are linear and first-match: duplicate names across kinds are not rejected, so
//! apps shadow menus, and menus shadow directory browsers.
use crate::constants::DIRBROWSER_PREFIX;
use crate::core::items::{AppItem, DirbrowserItem, Divider, Item, MenuItem, TaskItem};
use crate::core::keys;
use crate::core::shortcuts::{ShortcutError, ShortcutValidator};
use crate::core::taskrunner::TaskProvider;
use crate::models::{Config, OrderConfig, Settings, TaskrunnerConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Registry {
    settings: Arc<Settings>,
    items: Vec<Item>,
    /// Dividers and tasks, replaced on every [`load_taskrunners`](Self::load_taskrunners).
    task_items: Vec<Item>,
    taskrunners: Vec<TaskrunnerConfig>,
    order: OrderConfig,
    /// Normalized key -> item name.
    shortcuts: HashMap<String, String>,
    validation_errors: Vec<ShortcutError>,
}

impl Registry {
    /// Builds the registry. Shortcuts are validated apps first, then menus, then
    /// directory browsers; rejected shortcuts are recorded and left out of the map.
    pub fn build(config: &Config) -> Self {
        let settings = Arc::new(config.settings.clone());
        let mut validator = ShortcutValidator::new(&config.settings);
        let mut items = Vec::with_capacity(
            config.apps.len() + config.menus.len() + config.dirbrowsers.len(),
        );

        for app in &config.apps {
            let _ = validator.register(&app.shortcut, &app.name);
            items.push(Item::App(AppItem {
                app: app.clone(),
                settings: Arc::clone(&settings),
            }));
        }
        for menu in &config.menus {
            let _ = validator.register(&menu.shortcut, &menu.name);
            items.push(Item::Menu(MenuItem {
                menu: menu.clone(),
                settings: Arc::clone(&settings),
            }));
        }
        for db in &config.dirbrowsers {
            let _ = validator.register(&db.shortcut, &db.name);
            items.push(Item::Dirbrowser(DirbrowserItem {
                dirbrowser: db.clone(),
                settings: Arc::clone(&settings),
            }));
        }

        if validator.has_errors() {
            log::warn!("Some shortcuts were rejected, the config error report lists them");
        }
        let (shortcuts, validation_errors) = validator.into_parts();
        log::debug!(
            "Registry built: {} items, {} shortcuts, {} shortcut errors",
            items.len(),
            shortcuts.len(),
            validation_errors.len()
        );

        Self {
            settings,
            items,
            task_items: Vec::new(),
            taskrunners: config.taskrunners.clone(),
            order: config.order.clone(),
            shortcuts,
            validation_errors,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn task_items(&self) -> &[Item] {
        &self.task_items
    }

    pub fn order(&self) -> &OrderConfig {
        &self.order
    }

    pub fn shortcuts(&self) -> &HashMap<String, String> {
        &self.shortcuts
    }

    pub fn validation_errors(&self) -> &[ShortcutError] {
        &self.validation_errors
    }

    /// Finds an app, menu or directory browser. A `dirbrowser:` prefix is ignored.
    pub fn find_item(&self, name: &str) -> Option<&Item> {
        let name = name.strip_prefix(DIRBROWSER_PREFIX).unwrap_or(name);
        self.items.iter().find(|item| item.name() == name)
    }

    /// Finds a task by its `runner:task` name.
    pub fn find_taskrunner_item(&self, name: &str) -> Option<&TaskItem> {
        self.task_items.iter().find_map(|item| match item {
            Item::Task(task) if task.name() == name => Some(task),
            _ => None,
        })
    }

    /// The item name bound to `key`, if any.
    pub fn item_by_shortcut(&self, key: &str) -> Option<&str> {
        self.shortcuts.get(&keys::normalize(key)).map(String::as_str)
    }

    /// Queries every enabled task runner and replaces the task items.
    ///
    /// A runner that fails or reports no tasks contributes nothing; the others are unaffected.
    pub async fn load_taskrunners(&mut self, provider: &dyn TaskProvider, cancel: &CancellationToken) {
        let mut loaded = Vec::new();

        for runner in self.taskrunners.iter().filter(|r| r.enabled) {
            let output = match provider.load(runner, cancel).await {
                Ok(output) => output,
                Err(e) => {
                    log::warn!("Skipping task runner '{}': {}", runner.name, e);
                    continue;
                }
            };
            if output.tasks.is_empty() {
                log::debug!("Task runner '{}' has no tasks here", runner.name);
                continue;
            }

            loaded.push(Item::Divider(Divider {
                runner: runner.name.clone(),
                icon: output.icon,
                label: output.label.clone(),
            }));
            for task in output.tasks {
                loaded.push(Item::Task(TaskItem {
                    runner: runner.clone(),
                    task,
                    label: output.label.clone(),
                    settings: Arc::clone(&self.settings),
                }));
            }
        }

        self.task_items = loaded;
    }
}
