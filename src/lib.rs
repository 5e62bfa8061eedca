// src/lib.rs

pub use tokio_util::sync::CancellationToken;

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
