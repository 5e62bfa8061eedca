//! # System Interaction Layer
//!
//! Abstractions over the external programs the launcher drives. Each collaborator sits
//! behind a trait so the core can be exercised with fakes.
//!
//! ## Modules
//!
//! - **`executor`**: runs shell snippets (status probes, provider scripts) with a timeout
//!   and a cancellation token.
//! - **`file_lister`**: bounded recursive file listing for directory browsers.
//! - **`fzf`**: builds picker options and runs fzf.
//! - **`tmux`**: lists, selects, kills and launches windows, popups and panes.

pub mod executor;
pub mod file_lister;
pub mod fzf;
pub mod tmux;
