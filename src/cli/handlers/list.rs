// src/cli/handlers/list.rs

use crate::{
    constants::{FILE_ICON, MENU_ICON},
    core::{items::Item, registry::Registry},
};

/// `--list`: one line per configured app, menu and directory browser.
pub fn handle(registry: &Registry) {
    for line in list_lines(registry) {
        println!("{}", line);
    }
}

pub fn list_lines(registry: &Registry) -> Vec<String> {
    registry
        .items()
        .iter()
        .filter_map(|item| match item {
            Item::App(a) => Some(format!("{} {} - {}", FILE_ICON, a.app.name, a.app.desc)),
            Item::Menu(m) => Some(format!("{} {} - {}", MENU_ICON, m.menu.name, m.menu.desc)),
            Item::Dirbrowser(d) => Some(format!(
                "📁 {} - {}",
                d.dirbrowser.name, d.dirbrowser.directory
            )),
            Item::Task(_) | Item::Divider(_) => None,
        })
        .collect()
}
