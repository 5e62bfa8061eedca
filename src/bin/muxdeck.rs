// src/bin/muxdeck.rs

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::*;
use muxdeck::{
    CancellationToken,
    cli::{
        Cli,
        handlers::{
            self,
            commons::{self, Session},
        },
    },
    core::{config_parser, paths, registry::Registry, taskrunner::ScriptProvider},
    models::Config,
    system::{
        executor::{BashRunner, ShellRunner},
        file_lister::WalkdirLister,
        fzf::FzfPicker,
        tmux::{TmuxClient, WindowControl},
    },
};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

// --- Logging ---

/// Copies every log record to stderr as well as the log file.
#[derive(Debug)]
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}

/// Sends the log to the append-only log file; the terminal belongs to the picker.
/// `RUST_LOG` overrides the level.
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_secs();

    let file = paths::ensure_log_file_path().ok().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match file {
        Some(file) if debug => {
            builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
        }
        Some(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }
    builder.init();
}

// --- Startup ---

/// The launcher needs tmux and, for interactive modes, fzf.
fn preflight(needs_picker: bool) -> Result<()> {
    if !TmuxClient::in_session() {
        return Err(anyhow!("muxdeck must be run inside a tmux session."));
    }
    if needs_picker && !FzfPicker::is_available() {
        return Err(anyhow!("fzf is not installed."));
    }
    Ok(())
}

/// `--config` with `~` expanded, else the discovered config file.
fn config_location(cli: &Cli) -> Option<PathBuf> {
    match &cli.config {
        Some(explicit) => Some(PathBuf::from(
            shellexpand::tilde(&explicit.to_string_lossy()).into_owned(),
        )),
        None => paths::find_config_file(),
    }
}

fn load_config(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    let Some(path) = config_location(cli) else {
        log::info!("No config file found, starting with an empty menu");
        return Ok((Config::default(), None));
    };

    log::debug!("Loading config from {}", path.display());
    let config = config_parser::load(&path)
        .with_context(|| format!("Error loading config '{}'", path.display()))?;
    Ok((config, Some(path)))
}

/// The main entry point of `muxdeck`. Sets up logging, runs the requested mode and
/// performs centralized error handling.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.log {
        match paths::log_file_path() {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(shell) = cli.shell_init {
        handlers::shell_init::handle(shell);
        return;
    }

    init_logging(cli.debug);
    log::info!("muxdeck {} started", env!("CARGO_PKG_VERSION"));

    if cli.wants_diagnostics() {
        let bin_dir = paths::find_bin_dir();
        handlers::diagnostics::handle(config_location(&cli).as_deref(), bin_dir.as_deref());
        return;
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if let Err(e) = run_cli(cli, cancel).await {
        // --- Centralized Error Handling ---
        commons::show_error(&e);
        std::process::exit(1);
    }
}

/// Builds the session and routes to the handler for the requested mode.
async fn run_cli(cli: Cli, cancel: CancellationToken) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let needs_picker = cli.kill.is_none() && !cli.menu;
    if !cli.list {
        preflight(needs_picker)?;
    }

    let (mut config, config_path) = load_config(&cli)?;
    if let Some(show) = cli.shortcuts_override() {
        config.settings.show_help = show;
    }
    let bin_dir = paths::find_bin_dir();
    log::debug!("Helper directory: {:?}", bin_dir);
    config.settings.bin_dir = bin_dir.clone();

    let shell: Arc<dyn ShellRunner> = Arc::new(BashRunner);
    let windows: Arc<dyn WindowControl> = Arc::new(TmuxClient::new(bin_dir.clone()));
    let mut session = Session {
        registry: Registry::build(&config),
        windows,
        picker: Arc::new(FzfPicker),
        shell: shell.clone(),
        files: Arc::new(WalkdirLister),
        exe: std::env::current_exe().context("Could not locate the muxdeck executable")?,
        config_path,
        cancel,
    };

    if !session.registry.validation_errors().is_empty() {
        return handlers::config_errors::handle(&session).await;
    }

    if cli.list {
        handlers::list::handle(&session.registry);
        return Ok(());
    }

    if let Some(name) = &cli.kill {
        return handlers::launch::kill(&session, name).await;
    }

    let work_dir = session.windows.current_path().await;
    let provider = ScriptProvider::new(shell, bin_dir, work_dir);
    session
        .registry
        .load_taskrunners(&provider, &session.cancel)
        .await;

    if cli.menu {
        return handlers::menu::print_menu(&session, &cli.submenu).await;
    }

    if let Some(name) = &cli.launch_shortcut {
        return handlers::launch::launch_by_name(&session, name).await;
    }

    handlers::menu::run_menu(&session, &cli.submenu).await
}
