// src/cli/handlers/mod.rs

// One module per CLI mode.

pub mod commons;
pub mod config_errors;
pub mod diagnostics;
pub mod launch;
pub mod list;
pub mod menu;
pub mod shell_init;
