// src/cli/handlers/launch.rs

//! # Launching Items
//!
//! Turns a picked item and the key that picked it into a [`LaunchRequest`] for the window
//! controller. Apps that already have a window are focused instead of launched again.
use anyhow::{Result, anyhow};
use std::path::Path;
use std::time::SystemTime;

use super::commons::{self, Session};
use super::menu;
use crate::{
    constants::DIRBROWSER_PREFIX,
    core::{
        actions,
        dirbrowser,
        items::{AppItem, DirbrowserItem, Item, TaskItem},
        picker::MenuEvent,
    },
    models::{Action, Settings},
    system::{
        fzf,
        tmux::{self, LaunchRequest, TaskLaunch},
    },
};

/// What the menu loop does after a pick was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Something was launched or focused: leave the menu.
    Done,
    /// Show the same menu again.
    Reshow,
    /// Descend into a submenu.
    Enter(String),
}

/// Resolves the action for `item`, showing the action menu when its key was pressed.
/// `None` means the user backed out of the action menu.
async fn pick_action(
    session: &Session,
    key: &str,
    item: &Item,
    label: &str,
) -> Result<Option<Action>> {
    let settings = session.settings();
    if !settings.action_menu_key.is_empty() && key == settings.action_menu_key {
        return commons::choose_action(session, label).await;
    }
    Ok(Some(actions::resolve_for_item(key, settings, item)))
}

fn popup_limits(settings: &Settings) -> (String, String) {
    (
        settings.max_popup_width.clone(),
        settings.max_popup_height.clone(),
    )
}

// --- Apps ---

pub async fn launch_app(session: &Session, item: &Item, app: &AppItem, key: &str) -> Result<Flow> {
    let name = &app.app.name;
    let Some(action) = pick_action(session, key, item, name).await? else {
        return Ok(Flow::Reshow);
    };

    if action != Action::BackgroundWindow && session.windows.is_window_running(name).await {
        log::debug!("'{}' already has a window, selecting it", name);
        session.windows.select_window(name).await?;
        return Ok(Flow::Done);
    }

    let (max_width, max_height) = popup_limits(session.settings());
    log::debug!(
        "App cmd={:?}, width={}, height={}",
        app.app.cmd,
        app.width(),
        app.height()
    );
    session
        .windows
        .launch(&LaunchRequest {
            action,
            name: name.clone(),
            cmd: app.app.cmd.clone(),
            width: app.width().to_string(),
            height: app.height().to_string(),
            max_width,
            max_height,
            on_exit: app.app.on_exit.clone(),
            is_app: true,
            ..Default::default()
        })
        .await?;
    Ok(Flow::Done)
}

// --- Task runners ---

pub async fn launch_task(session: &Session, task: &TaskItem, key: &str) -> Result<Flow> {
    let settings = session.settings();
    let window_name = task.window_name();
    let is_running = session.windows.is_window_running(&window_name).await;

    let item = Item::Task(task.clone());
    let Some(action) = pick_action(session, key, &item, &window_name).await? else {
        return Ok(Flow::Done);
    };

    let launch = TaskLaunch {
        reuse_window: is_running,
        running_icon: settings.taskrunner_icon_running.clone(),
        success_icon: settings.taskrunner_icon_success.clone(),
        failed_icon: settings.taskrunner_icon_failed.clone(),
    };
    log::info!(
        "Launching task '{}' ({}), running={}",
        task.name(),
        action,
        is_running
    );

    let (max_width, max_height) = popup_limits(settings);
    session
        .windows
        .launch(&LaunchRequest {
            action,
            cmd: tmux::task_command(
                settings.bin_dir.as_deref(),
                &task.task.cmd,
                &window_name,
                &launch,
            ),
            name: window_name,
            width: settings.popup_width.clone(),
            height: settings.popup_height.clone(),
            max_width,
            max_height,
            task: Some(launch),
            ..Default::default()
        })
        .await?;
    Ok(Flow::Done)
}

// --- Directory browsers ---

/// Lists the browser's files, lets the user pick one and opens it in the editor.
///
/// Backing out, or an empty listing, returns to the menu.
pub async fn launch_dirbrowser(
    session: &Session,
    item: &Item,
    db: &DirbrowserItem,
) -> Result<Flow> {
    let settings = session.settings();
    loop {
        let entries = dirbrowser::list_files(
            &db.dirbrowser,
            settings,
            session.files.as_ref(),
            &session.cancel,
        )
        .await?;
        if entries.is_empty() {
            log::info!("Dirbrowser '{}' has no files", db.dirbrowser.name);
            return Ok(Flow::Reshow);
        }

        let now = SystemTime::now();
        let content = entries
            .iter()
            .map(|e| dirbrowser::format_file_entry(e, now, db.width(), db.height()))
            .collect::<Vec<_>>()
            .join("\n");
        let options = fzf::dirbrowser_options(settings, &db.dirbrowser.name);
        let response = session.picker.pick(&content, &options).await?;

        let (key, path) = match MenuEvent::classify(response, 1) {
            MenuEvent::Canceled => return Ok(Flow::Done),
            MenuEvent::Back | MenuEvent::Ignored => return Ok(Flow::Reshow),
            MenuEvent::Picked { key, name } => (key, name),
        };

        let filename = Path::new(&path)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        let Some(action) = pick_action(session, &key, item, &filename).await? else {
            continue;
        };

        let window_name = if action == Action::Popup {
            format!("{} | {}", db.dirbrowser.name, filename)
        } else {
            filename
        };
        log::info!("Opening '{}' ({})", path, action);

        let (max_width, max_height) = popup_limits(settings);
        session
            .windows
            .launch(&LaunchRequest {
                action,
                name: window_name,
                cmd: commons::edit_file_command(&path)?,
                width: db.width().to_string(),
                height: db.height().to_string(),
                max_width,
                max_height,
                ..Default::default()
            })
            .await?;
        return Ok(Flow::Done);
    }
}

// --- Direct entry points ---

/// Handles a picked line by name: task-runner tasks first, then apps, menus and browsers.
pub async fn launch_selection(session: &Session, name: &str, key: &str) -> Result<Flow> {
    if name.contains(':') && !name.starts_with(DIRBROWSER_PREFIX) {
        if let Some(task) = session.registry.find_taskrunner_item(name) {
            return launch_task(session, task, key).await;
        }
    }

    let item = session
        .registry
        .find_item(name)
        .ok_or_else(|| anyhow!("Item not found: {}", name))?;
    log::debug!("Selected '{}' ({:?})", name, item.kind());

    match item {
        Item::Menu(m) => Ok(Flow::Enter(m.menu.name.clone())),
        Item::App(app) => launch_app(session, item, app, key).await,
        Item::Dirbrowser(db) => launch_dirbrowser(session, item, db).await,
        Item::Task(task) => launch_task(session, task, key).await,
        Item::Divider(_) => Ok(Flow::Reshow),
    }
}

/// `--launch-shortcut`: opens an item with its primary action, or opens a submenu.
pub async fn launch_by_name(session: &Session, name: &str) -> Result<()> {
    log::info!("Launching '{}' via shortcut", name);
    match launch_selection(session, name, "").await? {
        Flow::Enter(scope) => menu::run_menu(session, &scope).await,
        Flow::Done | Flow::Reshow => Ok(()),
    }
}

/// `--kill`: closes a window by name.
pub async fn kill(session: &Session, name: &str) -> Result<()> {
    log::info!("Killing window '{}'", name);
    session.windows.kill_window(name).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::handlers::commons::fakes::*;
    use crate::core::taskrunner::{ProviderError, ProviderOutput, Task, TaskProvider};
    use crate::models::TaskrunnerConfig;
    use std::collections::HashSet;
    use tokio_util::sync::CancellationToken;
    use std::sync::Arc;

    const CONFIG: &str = "\
[settings]
pane_right_key = ctrl-l

[app:vim]
cmd = nvim
desc = Editor
on_exit = echo done

[app:btop]
cmd = btop
primary_action = window

[menu:dev]
desc = Development

[dirbrowser:notes]
directory = /notes
";

    fn setup(
        outputs: &[Option<&str>],
        running: &[&str],
        files: Vec<&'static str>,
    ) -> (Session, Arc<ScriptedPicker>, Arc<RecordingWindows>) {
        let picker = Arc::new(ScriptedPicker::new(outputs));
        let windows = Arc::new(RecordingWindows {
            running: running.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
            ..Default::default()
        });
        let session = session(CONFIG, picker.clone(), windows.clone(), FixedFiles(files));
        (session, picker, windows)
    }

    #[tokio::test]
    async fn test_accept_launches_app_as_popup() {
        let (session, _, windows) = setup(&[], &[], vec![]);
        let flow = launch_selection(&session, "vim", "").await.unwrap();
        assert_eq!(flow, Flow::Done);

        let launched = windows.launched.lock().unwrap();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].action, Action::Popup);
        assert_eq!(launched[0].cmd, "nvim");
        assert_eq!(launched[0].on_exit, "echo done");
        assert!(launched[0].is_app);
    }

    #[tokio::test]
    async fn test_item_primary_action_and_direct_key() {
        let (session, _, windows) = setup(&[], &[], vec![]);
        launch_selection(&session, "btop", "").await.unwrap();
        launch_selection(&session, "btop", "ctrl-l").await.unwrap();

        let launched = windows.launched.lock().unwrap();
        assert_eq!(launched[0].action, Action::Window);
        assert_eq!(launched[1].action, Action::PaneRight);
    }

    #[tokio::test]
    async fn test_running_app_is_selected_unless_backgrounded() {
        let (session, _, windows) = setup(&[], &["vim"], vec![]);
        launch_selection(&session, "vim", "").await.unwrap();
        assert_eq!(*windows.selected.lock().unwrap(), ["vim"]);
        assert!(windows.launched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_action_menu_choice_and_back_out() {
        let (session, _, windows) = setup(
            &[Some("enter\npane_left\tOpen in pane to the left\n"), Some("esc\n")],
            &[],
            vec![],
        );
        let flow = launch_selection(&session, "vim", "ctrl-j").await.unwrap();
        assert_eq!(flow, Flow::Done);
        assert_eq!(windows.launched.lock().unwrap()[0].action, Action::PaneLeft);

        let flow = launch_selection(&session, "vim", "ctrl-j").await.unwrap();
        assert_eq!(flow, Flow::Reshow);
        assert_eq!(windows.launched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_menu_selection_enters_submenu() {
        let (session, _, _) = setup(&[], &[], vec![]);
        let flow = launch_selection(&session, "dev", "").await.unwrap();
        assert_eq!(flow, Flow::Enter("dev".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_item_is_an_error() {
        let (session, _, _) = setup(&[], &[], vec![]);
        let err = launch_selection(&session, "missing", "").await.unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_dirbrowser_opens_picked_file_in_editor_popup() {
        let (session, picker, windows) = setup(
            &[Some("\n○  entry\t/notes/todo.md\t90%\t80%\n")],
            &[],
            vec!["todo.md", "ideas.md"],
        );
        let flow = launch_selection(&session, "dirbrowser:notes", "").await.unwrap();
        assert_eq!(flow, Flow::Done);
        assert_eq!(picker.inputs.lock().unwrap()[0].lines().count(), 2);

        let launched = windows.launched.lock().unwrap();
        assert_eq!(launched[0].action, Action::Popup);
        assert_eq!(launched[0].name, "notes | todo.md");
        assert!(launched[0].cmd.ends_with("/notes/todo.md"));
        assert_eq!(launched[0].width, "90%");
        assert_eq!(launched[0].height, "80%");
        assert!(!launched[0].is_app);
    }

    #[tokio::test]
    async fn test_empty_dirbrowser_goes_back() {
        let (session, picker, _) = setup(&[], &[], vec![]);
        let flow = launch_selection(&session, "dirbrowser:notes", "").await.unwrap();
        assert_eq!(flow, Flow::Reshow);
        assert!(picker.inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dirbrowser_back_key() {
        let (session, _, windows) = setup(&[Some("esc\n")], &[], vec!["a.md"]);
        let flow = launch_selection(&session, "dirbrowser:notes", "").await.unwrap();
        assert_eq!(flow, Flow::Reshow);
        assert!(windows.launched.lock().unwrap().is_empty());
    }

    #[derive(Debug)]
    struct JustProvider;

    #[async_trait::async_trait]
    impl TaskProvider for JustProvider {
        async fn load(
            &self,
            _runner: &TaskrunnerConfig,
            _cancel: &CancellationToken,
        ) -> Result<ProviderOutput, ProviderError> {
            Ok(ProviderOutput {
                icon: String::new(),
                label: "just".to_string(),
                tasks: vec![Task {
                    name: "build".to_string(),
                    cmd: "just build".to_string(),
                    description: String::new(),
                }],
            })
        }
    }

    #[tokio::test]
    async fn test_task_reuses_running_window() {
        let picker = Arc::new(ScriptedPicker::new(&[]));
        let windows = Arc::new(RecordingWindows {
            running: ["just » build".to_string()].into_iter().collect(),
            ..Default::default()
        });
        let mut session = session(
            "[taskrunner:just]\nenabled = true\n",
            picker,
            windows.clone(),
            FixedFiles::default(),
        );
        session
            .registry
            .load_taskrunners(&JustProvider, &session.cancel)
            .await;

        let flow = launch_selection(&session, "just:build", "").await.unwrap();
        assert_eq!(flow, Flow::Done);

        let launched = windows.launched.lock().unwrap();
        assert_eq!(launched[0].action, Action::Window);
        assert_eq!(launched[0].name, "just » build");
        assert!(launched[0].cmd.starts_with("just build\nexit_code=$?"));
        let task = launched[0].task.as_ref().unwrap();
        assert!(task.reuse_window);
        assert_eq!(task.success_icon, "✅");
    }

    #[tokio::test]
    async fn test_kill_forwards_window_name() {
        let (session, _, windows) = setup(&[], &[], vec![]);
        kill(&session, "vim").await.unwrap();
        assert_eq!(*windows.killed.lock().unwrap(), ["vim"]);
    }
}
