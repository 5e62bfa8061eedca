// src/cli/handlers/menu.rs

//! # Menu Loop
//!
//! Shows the menu for the current scope, classifies the pick, and either moves between
//! scopes or hands the pick to the launcher. Cancellation ends the loop; the back key pops
//! one level.
use anyhow::{Context, Result};
use std::path::PathBuf;

use super::commons::{self, Session};
use super::launch::{self, Flow};
use crate::{
    constants::{DOCS_URL, EDIT_CONFIG_SENTINEL, OPEN_DOCS_SENTINEL},
    core::{
        menu::{build_menu, empty_config_menu},
        paths,
        picker::{MenuEvent, back_target},
    },
    models::Action,
    system::{fzf, tmux::LaunchRequest},
};

/// Column of the item name in a menu line.
const NAME_FIELD: usize = 2;

/// Runs the interactive menu starting at `scope` (empty for the root menu).
pub async fn run_menu(session: &Session, scope: &str) -> Result<()> {
    let settings = session.settings();
    let mut scope = scope.to_string();
    log::debug!(
        "Starting menu loop at '{}', items: {}",
        scope,
        session.registry.items().len()
    );

    loop {
        let running = session.windows.running_windows().await;
        let content = build_menu(&session.registry, &running, &scope, session.render_context()).await;

        let (content, options) = if !content.is_empty() {
            let cwd = if settings.show_cwd {
                session
                    .windows
                    .current_path()
                    .await
                    .map(|p| paths::tildify(&p.to_string_lossy()))
            } else {
                None
            };
            let options = fzf::menu_options(
                settings,
                &scope,
                session.registry.shortcuts(),
                &session.exe,
                cwd.as_deref(),
            );
            (content, options)
        } else if scope.is_empty() {
            (empty_config_menu(), fzf::empty_menu_options(settings))
        } else {
            log::debug!("Submenu '{}' is empty", scope);
            return Ok(());
        };

        let response = session.picker.pick(&content, &options).await?;
        let (key, name) = match MenuEvent::classify(response, NAME_FIELD) {
            MenuEvent::Canceled => return Ok(()),
            MenuEvent::Back => match back_target(&scope) {
                Some(parent) => {
                    scope = parent;
                    continue;
                }
                None => return Ok(()),
            },
            MenuEvent::Ignored => continue,
            MenuEvent::Picked { key, name } => (key, name),
        };

        let flow = match name.as_str() {
            EDIT_CONFIG_SENTINEL => {
                open_config_in_editor(session).await?;
                Flow::Done
            }
            OPEN_DOCS_SENTINEL => {
                open_docs().await?;
                Flow::Done
            }
            _ => launch::launch_selection(session, &name, &key).await?,
        };

        match flow {
            Flow::Done => return Ok(()),
            Flow::Reshow => continue,
            Flow::Enter(submenu) => scope = submenu,
        }
    }
}

/// `--menu`: prints the composed menu, used by the picker's reload binding.
pub async fn print_menu(session: &Session, scope: &str) -> Result<()> {
    let running = session.windows.running_windows().await;
    let content = build_menu(&session.registry, &running, scope, session.render_context()).await;
    print!("{}", content);
    Ok(())
}

/// The config file being used, or the conventional location for a new one.
fn config_target(session: &Session) -> Result<PathBuf> {
    session
        .config_path
        .clone()
        .or_else(paths::default_config_path)
        .context("Could not determine where the config file lives")
}

/// Opens the config file in the user's editor inside a popup.
pub async fn open_config_in_editor(session: &Session) -> Result<()> {
    let path = config_target(session)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Could not create config directory '{}'", dir.display()))?;
    }

    let settings = session.settings();
    log::info!("Editing config '{}'", path.display());
    session
        .windows
        .launch(&LaunchRequest {
            action: Action::Popup,
            name: "config".to_string(),
            cmd: commons::edit_file_command(&path.to_string_lossy())?,
            width: settings.popup_width.clone(),
            height: settings.popup_height.clone(),
            max_width: settings.max_popup_width.clone(),
            max_height: settings.max_popup_height.clone(),
            ..Default::default()
        })
        .await?;
    Ok(())
}

async fn open_docs() -> Result<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    tokio::process::Command::new(opener)
        .arg(DOCS_URL)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .with_context(|| format!("Could not run '{}'", opener))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::handlers::commons::fakes::*;
    use std::sync::Arc;

    const CONFIG: &str = "\
[app:vim]
cmd = nvim

[menu:finance]
desc = Money

[app:finance/ledger]
cmd = hledger-ui
";

    fn setup(config: &str, outputs: &[Option<&str>]) -> (Session, Arc<ScriptedPicker>, Arc<RecordingWindows>) {
        let picker = Arc::new(ScriptedPicker::new(outputs));
        let windows = Arc::new(RecordingWindows::default());
        let session = session(config, picker.clone(), windows.clone(), FixedFiles::default());
        (session, picker, windows)
    }

    #[tokio::test]
    async fn test_cancel_ends_loop() {
        let (session, picker, windows) = setup(CONFIG, &[None]);
        run_menu(&session, "").await.unwrap();
        assert_eq!(picker.inputs.lock().unwrap().len(), 1);
        assert!(windows.launched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submenu_then_launch() {
        let (session, picker, windows) = setup(
            CONFIG,
            &[
                Some("\n▸ finance\t\tfinance\n"),
                Some("\n○ ledger\t\tfinance/ledger\n"),
            ],
        );
        run_menu(&session, "").await.unwrap();

        let inputs = picker.inputs.lock().unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs[1].contains("finance/ledger"));
        assert!(!inputs[1].contains("\tvim"));
        assert_eq!(windows.launched.lock().unwrap()[0].cmd, "hledger-ui");
    }

    #[tokio::test]
    async fn test_back_from_submenu_returns_to_root_then_exits() {
        let (session, picker, _) = setup(CONFIG, &[Some("esc\n"), Some("esc\n")]);
        run_menu(&session, "finance").await.unwrap();

        let inputs = picker.inputs.lock().unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs[0].contains("finance/ledger"));
        assert!(inputs[1].contains("\tvim"));
    }

    #[tokio::test]
    async fn test_divider_pick_reshows_menu() {
        let (session, picker, _) = setup(CONFIG, &[Some("\n   ─── just ───\t\t\t\n"), None]);
        run_menu(&session, "").await.unwrap();
        assert_eq!(picker.inputs.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_config_offers_editor() {
        let (session, picker, windows) = setup("", &[Some("\nEdit config file\t\t__edit_config\n")]);
        let dir = tempfile::tempdir().unwrap();
        let session = Session {
            config_path: Some(dir.path().join("muxdeck/config")),
            ..session
        };

        run_menu(&session, "").await.unwrap();
        assert!(picker.inputs.lock().unwrap()[0].contains(EDIT_CONFIG_SENTINEL));

        let launched = windows.launched.lock().unwrap();
        assert_eq!(launched[0].name, "config");
        assert_eq!(launched[0].action, Action::Popup);
        assert!(launched[0].cmd.contains("muxdeck/config"));
        assert!(dir.path().join("muxdeck").is_dir());
    }

    #[tokio::test]
    async fn test_empty_submenu_exits() {
        let (session, picker, _) = setup("[menu:empty]\ndesc = Nothing here\n", &[]);
        run_menu(&session, "empty").await.unwrap();
        assert!(picker.inputs.lock().unwrap().is_empty());
    }
}
