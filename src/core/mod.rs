// src/core/mod.rs

pub mod actions;
pub mod config_parser;
pub mod dirbrowser;
pub mod items;
pub mod keys;
pub mod menu;
pub mod paths;
pub mod picker;
pub mod registry;
pub mod shortcuts;
pub mod taskrunner;
