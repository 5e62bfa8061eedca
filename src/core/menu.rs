// src/core/menu.rs

//! # Menu Composition
//!
//! Builds the text handed to the picker for one menu scope:
//!
//! 1. Keep the items whose parent is the scope (`""` is the root menu).
//! 2. Measure the widest display name, counting characters, not bytes. The root menu also
//!    measures the task-runner items.
//! 3. Render every item concurrently. Each render bounds its own probes, and results are
//!    stored by position, not by completion order.
//! 4. Sort: names in the scope's order list first, by position; the rest by name.
//! 5. Pad the display segment to the common width, then optionally prefix the shortcut column.
//! 6. At the root, append the task-runner dividers and tasks in registry order.
use crate::constants::{DIM_END, DIM_START, EDIT_CONFIG_SENTINEL, OPEN_DOCS_SENTINEL};
use crate::core::items::{DISPLAY_SEPARATOR, Item, RenderContext};
use crate::core::registry::Registry;
use futures::future::join_all;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A rendered item awaiting ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rendered {
    name: String,
    line: String,
}

/// Composes the picker input for `scope`.
pub async fn build_menu(
    registry: &Registry,
    running_windows: &HashSet<String>,
    scope: &str,
    ctx: RenderContext<'_>,
) -> String {
    let filtered: Vec<&Item> = registry
        .items()
        .iter()
        .filter(|item| item.parent() == scope)
        .collect();

    let mut width = max_display_width(filtered.iter().copied());
    if scope.is_empty() {
        width = width.max(max_display_width(registry.task_items().iter()));
    }

    let renders = filtered.iter().map(|item| async move {
        let running = item
            .window_name()
            .is_some_and(|w| running_windows.contains(&w));
        Rendered {
            name: item.name(),
            line: item.render(ctx, running).await,
        }
    });
    let mut results = join_all(renders).await;

    sort_results(&mut results, registry.order().for_scope(scope));

    let show_shortcuts = registry.settings().show_help;
    let mut lines: Vec<String> = results
        .into_iter()
        .map(|r| finish_line(&align_display_column(&r.line, width), show_shortcuts))
        .collect();

    if scope.is_empty() {
        for item in registry.task_items() {
            let running = item
                .window_name()
                .is_some_and(|w| running_windows.contains(&w));
            let line = item.render(ctx, running).await;
            let line = if item.is_divider() {
                line
            } else {
                align_display_column(&line, width)
            };
            lines.push(finish_line(&line, show_shortcuts));
        }
    }

    log::debug!("Composed {} menu lines for scope '{}'", lines.len(), scope);
    lines.join("\n")
}

/// The two synthetic rows shown when nothing is configured.
pub fn empty_config_menu() -> String {
    format!(
        "Edit config file\t\t{}\nOpen documentation\t\t{}",
        EDIT_CONFIG_SENTINEL, OPEN_DOCS_SENTINEL
    )
}

fn max_display_width<'a>(items: impl Iterator<Item = &'a Item>) -> usize {
    items
        .map(|item| item.display_name().chars().count())
        .max()
        .unwrap_or(0)
}

fn sort_results(results: &mut [Rendered], order: &[String]) {
    let mut position: HashMap<&str, usize> = HashMap::new();
    for (i, name) in order.iter().enumerate() {
        position.entry(name.as_str()).or_insert(i);
    }

    results.sort_by(|a, b| {
        match (position.get(a.name.as_str()), position.get(b.name.as_str())) {
            (Some(pa), Some(pb)) => pa.cmp(pb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        }
    });
}

/// Replaces the NUL separator with padding: `icon name<pad>  desc`.
///
/// The icon is the first two characters of the display segment (glyph plus space).
pub fn align_display_column(line: &str, width: usize) -> String {
    let Some((display, rest)) = line.split_once('\t') else {
        return line.to_string();
    };
    let Some((prefix, desc)) = display.split_once(DISPLAY_SEPARATOR) else {
        return line.to_string();
    };

    let mut chars = prefix.chars();
    let icon: String = chars.by_ref().take(2).collect();
    let name = chars.as_str();
    if icon.chars().count() < 2 || name.is_empty() {
        return format!("{}  {}\t{}", prefix, desc, rest);
    }
    format!("{}{:<width$}  {}\t{}", icon, name, desc, rest, width = width)
}

/// Prefixes the 9-wide shortcut column followed by a separator glyph.
pub fn add_shortcut_prefix(line: &str) -> String {
    let mut fields = line.splitn(3, '\t');
    let display = fields.next().unwrap_or_default();
    let Some(shortcut) = fields.next() else {
        return line.to_string();
    };
    let rest = fields.next().unwrap_or_default();

    let column = if shortcut.is_empty() {
        format!("{:9}│ ", "")
    } else {
        format!("{}{:<9}{}│ ", DIM_START, format!("[{}]", shortcut), DIM_END)
    };
    format!("{}{}\t{}\t{}", column, display, shortcut, rest)
}

fn finish_line(line: &str, show_shortcuts: bool) -> String {
    if show_shortcuts {
        add_shortcut_prefix(line)
    } else {
        line.to_string()
    }
}
