// src/cli/handlers/config_errors.rs

//! Reports shortcut validation errors and offers to fix them in the editor.
use anyhow::Result;
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};

use super::commons::Session;
use super::menu;
use crate::core::shortcuts::ShortcutError;

/// `item: message` lines, in registration order.
pub fn error_lines(errors: &[ShortcutError]) -> Vec<String> {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.item_name(), e))
        .collect()
}

/// Prints the errors, then asks whether to open the config file.
pub async fn handle(session: &Session) -> Result<()> {
    let errors = session.registry.validation_errors();
    for err in errors {
        log::error!("Shortcut validation: {} ({})", err, err.item_name());
    }

    println!("\n{}", "Config has problems:".red().bold());
    for line in error_lines(errors) {
        println!("  {} {}", "•".red(), line);
    }
    if let Some(path) = &session.config_path {
        println!("\n{}", path.display().to_string().dimmed());
    }
    println!();

    let edit = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Open the config file in your editor?")
        .default(true)
        .interact()?;
    if edit {
        menu::open_config_in_editor(session).await?;
    }
    Ok(())
}
