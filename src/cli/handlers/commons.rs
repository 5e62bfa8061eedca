// src/cli/handlers/commons.rs

// Shared state and helpers used by multiple handlers.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{actions, items::RenderContext, registry::Registry},
    models::{Action, Settings},
    system::{
        executor::ShellRunner,
        file_lister::FileLister,
        fzf::{self, Picker},
        tmux::WindowControl,
    },
};

/// Everything a handler needs for one invocation: the built registry and the collaborators
/// that talk to the outside world.
#[derive(Debug)]
pub struct Session {
    pub registry: Registry,
    pub windows: Arc<dyn WindowControl>,
    pub picker: Arc<dyn Picker>,
    pub shell: Arc<dyn ShellRunner>,
    pub files: Arc<dyn FileLister>,
    /// This binary, re-invoked by picker key bindings.
    pub exe: PathBuf,
    pub config_path: Option<PathBuf>,
    pub cancel: CancellationToken,
}

impl Session {
    pub fn settings(&self) -> &Settings {
        self.registry.settings()
    }

    pub fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            shell: self.shell.as_ref(),
            files: self.files.as_ref(),
            cancel: &self.cancel,
        }
    }
}

/// The user's editor: `$VISUAL`, then `$EDITOR`, then `nvim`.
pub fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "nvim".to_string())
}

/// `<editor> '<path>'`, quoted for the shell.
pub fn edit_file_command(path: &str) -> Result<String> {
    let quoted = shlex::try_quote(path)
        .with_context(|| format!("Path '{}' cannot be passed to the editor", path))?;
    Ok(format!("{} {}", editor_command(), quoted))
}

/// Shows the action menu for `item_name`. `None` means the user backed out.
pub async fn choose_action(session: &Session, item_name: &str) -> Result<Option<Action>> {
    let options = fzf::action_menu_options(session.settings(), item_name);
    let response = session
        .picker
        .pick(&actions::action_menu_lines(), &options)
        .await?;

    Ok(response
        .filter(|r| r.key != crate::constants::BACK_KEY)
        .and_then(|r| actions::parse_action_menu_choice(&r.fields)))
}

/// Logs and prints a fatal error, then waits for Enter so a popup does not vanish
/// before the message is read.
pub fn show_error(err: &anyhow::Error) {
    log::error!("{:#}", err);
    eprintln!("\n{}: {:#}\n", "Error".red().bold(), err);
    wait_for_enter();
}

fn wait_for_enter() {
    eprint!("{}", "Press Enter to continue...".dimmed());
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

#[cfg(test)]
pub(crate) mod fakes {
    //! Scripted collaborators shared by the handler tests.
    use super::*;
    use crate::core::picker::{PickerResponse, parse_picker_output};
    use crate::system::executor::{ExecutionError, ShellRequest};
    use crate::system::file_lister::{ListQuery, ListedFile, ListingError};
    use crate::system::fzf::PickerError;
    use crate::system::tmux::{LaunchError, LaunchRequest};
    use async_trait::async_trait;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;
    use std::time::SystemTime;

    /// Replays raw picker outputs in order and records the inputs it was shown.
    #[derive(Debug, Default)]
    pub struct ScriptedPicker {
        outputs: Mutex<VecDeque<Option<String>>>,
        pub inputs: Mutex<Vec<String>>,
    }

    impl ScriptedPicker {
        /// `None` replays a cancellation.
        pub fn new(outputs: &[Option<&str>]) -> Self {
            Self {
                outputs: Mutex::new(outputs.iter().map(|o| o.map(str::to_string)).collect()),
                inputs: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Picker for ScriptedPicker {
        async fn pick(
            &self,
            input: &str,
            _options: &[String],
        ) -> Result<Option<PickerResponse>, PickerError> {
            self.inputs.lock().unwrap().push(input.to_string());
            let next = self.outputs.lock().unwrap().pop_front().flatten();
            Ok(next.and_then(|raw| parse_picker_output(&raw)))
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingWindows {
        pub running: HashSet<String>,
        pub launched: Mutex<Vec<LaunchRequest>>,
        pub selected: Mutex<Vec<String>>,
        pub killed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WindowControl for RecordingWindows {
        async fn running_windows(&self) -> HashSet<String> {
            self.running.clone()
        }

        async fn select_window(&self, name: &str) -> Result<(), LaunchError> {
            self.selected.lock().unwrap().push(name.to_string());
            Ok(())
        }

        async fn kill_window(&self, name: &str) -> Result<(), LaunchError> {
            self.killed.lock().unwrap().push(name.to_string());
            Ok(())
        }

        async fn current_path(&self) -> Option<PathBuf> {
            Some(PathBuf::from("/work"))
        }

        async fn launch(&self, request: &LaunchRequest) -> Result<(), LaunchError> {
            self.launched.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    #[derive(Debug)]
    pub struct SilentShell;

    #[async_trait]
    impl ShellRunner for SilentShell {
        async fn capture(
            &self,
            _request: &ShellRequest,
            _cancel: &CancellationToken,
        ) -> Result<String, ExecutionError> {
            Ok(String::new())
        }
    }

    /// Lists a fixed set of relative paths below the query root.
    #[derive(Debug, Default)]
    pub struct FixedFiles(pub Vec<&'static str>);

    #[async_trait]
    impl FileLister for FixedFiles {
        async fn list(
            &self,
            query: &ListQuery,
            _cancel: &CancellationToken,
        ) -> Result<Vec<ListedFile>, ListingError> {
            Ok(self
                .0
                .iter()
                .map(|rel| ListedFile {
                    path: query.root.join(rel),
                    modified: SystemTime::UNIX_EPOCH,
                })
                .collect())
        }
    }

    pub fn session(
        config: &str,
        picker: Arc<ScriptedPicker>,
        windows: Arc<RecordingWindows>,
        files: FixedFiles,
    ) -> Session {
        let config = crate::core::config_parser::parse_str(config);
        Session {
            registry: Registry::build(&config),
            windows,
            picker,
            shell: Arc::new(SilentShell),
            files: Arc::new(files),
            exe: PathBuf::from("/usr/bin/muxdeck"),
            config_path: Some(PathBuf::from("/home/u/.config/muxdeck/config")),
            cancel: CancellationToken::new(),
        }
    }
}
