// src/core/taskrunner.rs

//! # Task-Runner Providers
//!
//! A task runner (`just`, `npm`, `make`, ...) is backed by a provider script exposing three
//! shell functions: `plugin_icon`, `plugin_label` and `plugin_items`. The last one prints one
//! task per line as `name<TAB>command[<TAB>description]`.
use crate::constants::{PROVIDER_QUERY_TIMEOUT, PROVIDER_TASKS_TIMEOUT, TASKRUNNERS_DIR};
use crate::models::TaskrunnerConfig;
use crate::system::executor::{ExecutionError, ShellRequest, ShellRunner};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No provider script found for task runner '{0}'.")]
    ScriptNotFound(String),
    #[error("Provider script path '{0}' cannot be quoted for the shell.")]
    UnquotablePath(PathBuf),
    #[error("Task listing for '{runner}' failed: {source}")]
    Listing {
        runner: String,
        #[source]
        source: ExecutionError,
    },
}

/// One task reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub cmd: String,
    pub description: String,
}

/// Everything a provider reports for one runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutput {
    pub icon: String,
    pub label: String,
    pub tasks: Vec<Task>,
}

/// Discovers the tasks of one enabled task runner.
#[async_trait]
pub trait TaskProvider: Send + Sync + std::fmt::Debug {
    async fn load(
        &self,
        runner: &TaskrunnerConfig,
        cancel: &CancellationToken,
    ) -> Result<ProviderOutput, ProviderError>;
}

/// Parses `plugin_items` output. Blank lines and records with fewer than two fields are skipped.
pub fn parse_task_listing(output: &str) -> Vec<Task> {
    output
        .trim()
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut fields = line.splitn(3, '\t');
            let name = fields.next()?;
            let cmd = fields.next()?;
            Some(Task {
                name: name.to_string(),
                cmd: cmd.to_string(),
                description: fields.next().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Candidate locations for `<name>.sh`, most specific first.
pub fn provider_script_candidates(name: &str, bin_dir: Option<&Path>) -> Vec<PathBuf> {
    let file = format!("{}.sh", name);
    let mut candidates = Vec::new();
    if let Some(dir) = bin_dir {
        candidates.push(dir.join(&file));
        candidates.push(dir.join(TASKRUNNERS_DIR).join(&file));
    }
    if let Some(data) = dirs::data_dir() {
        candidates.push(
            data.join(crate::constants::APP_NAME)
                .join(TASKRUNNERS_DIR)
                .join(&file),
        );
    }
    if let Some(config) = dirs::config_dir() {
        candidates.push(
            config
                .join(crate::constants::APP_NAME)
                .join(TASKRUNNERS_DIR)
                .join(&file),
        );
    }
    candidates
}

/// Returns the first existing provider script for `name`.
pub fn locate_provider_script(name: &str, bin_dir: Option<&Path>) -> Option<PathBuf> {
    provider_script_candidates(name, bin_dir)
        .into_iter()
        .find(|p| p.is_file())
}

// --- Script-backed provider ---

/// Sources provider scripts through a [`ShellRunner`].
#[derive(Debug, Clone)]
pub struct ScriptProvider {
    shell: Arc<dyn ShellRunner>,
    bin_dir: Option<PathBuf>,
    /// Directory `plugin_items` runs in, normally the active pane's.
    work_dir: Option<PathBuf>,
}

impl ScriptProvider {
    pub fn new(shell: Arc<dyn ShellRunner>, bin_dir: Option<PathBuf>, work_dir: Option<PathBuf>) -> Self {
        Self {
            shell,
            bin_dir,
            work_dir,
        }
    }

    /// Calls a provider function that prints one value. Failures yield an empty string.
    async fn query(&self, quoted_script: &str, function: &str, cancel: &CancellationToken) -> String {
        let request = ShellRequest::new(
            format!("source {} && {} 2>/dev/null", quoted_script, function),
            PROVIDER_QUERY_TIMEOUT,
        );
        match self.shell.capture(&request, cancel).await {
            Ok(out) => out.trim().to_string(),
            Err(e) => {
                log::debug!("Provider query '{}' failed: {}", function, e);
                String::new()
            }
        }
    }
}

#[async_trait]
impl TaskProvider for ScriptProvider {
    async fn load(
        &self,
        runner: &TaskrunnerConfig,
        cancel: &CancellationToken,
    ) -> Result<ProviderOutput, ProviderError> {
        let script = locate_provider_script(&runner.name, self.bin_dir.as_deref())
            .ok_or_else(|| ProviderError::ScriptNotFound(runner.name.clone()))?;
        let quoted = shlex::try_quote(&script.to_string_lossy())
            .map_err(|_| ProviderError::UnquotablePath(script.clone()))?
            .into_owned();

        let mut icon = runner.icon.clone();
        if icon.is_empty() {
            icon = self.query(&quoted, "plugin_icon", cancel).await;
        }
        let mut label = runner.label.clone();
        if label.is_empty() || label == runner.name {
            let reported = self.query(&quoted, "plugin_label", cancel).await;
            if !reported.is_empty() {
                label = reported;
            }
        }

        let request = ShellRequest::new(
            format!("source {} && plugin_items 2>/dev/null", quoted),
            PROVIDER_TASKS_TIMEOUT,
        )
        .cwd(self.work_dir.clone());
        let output = self
            .shell
            .capture(&request, cancel)
            .await
            .map_err(|source| ProviderError::Listing {
                runner: runner.name.clone(),
                source,
            })?;

        let tasks = parse_task_listing(&output);
        log::debug!(
            "Task runner '{}' reported {} tasks from '{}'",
            runner.name,
            tasks.len(),
            script.display()
        );
        Ok(ProviderOutput { icon, label, tasks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    /// Answers each function name with canned output and records the scripts it saw.
    #[derive(Debug, Default)]
    struct FakeShell {
        seen: Mutex<Vec<String>>,
        fail_items: bool,
    }

    #[async_trait]
    impl ShellRunner for FakeShell {
        async fn capture(
            &self,
            request: &ShellRequest,
            _cancel: &CancellationToken,
        ) -> Result<String, ExecutionError> {
            self.seen.lock().unwrap().push(request.script.clone());
            if request.script.contains("plugin_icon") {
                Ok("🔨\n".to_string())
            } else if request.script.contains("plugin_label") {
                Ok("Just\n".to_string())
            } else if self.fail_items {
                Err(ExecutionError::NonZeroExitStatus(request.script.clone()))
            } else {
                Ok("build\tjust build\tCompile\ntest\tjust test\n".to_string())
            }
        }
    }

    fn bin_dir_with_script(name: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(TASKRUNNERS_DIR)).unwrap();
        fs::write(dir.path().join(TASKRUNNERS_DIR).join(format!("{}.sh", name)), "").unwrap();
        dir
    }

    #[test]
    fn test_parse_task_listing_skips_short_records() {
        let tasks = parse_task_listing("build\tcargo build\tCompile it\n\nlonely\nfmt\tcargo fmt\n");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "build");
        assert_eq!(tasks[0].description, "Compile it");
        assert_eq!(tasks[1].cmd, "cargo fmt");
        assert_eq!(tasks[1].description, "");
    }

    #[test]
    fn test_parse_task_listing_keeps_tabs_in_description() {
        let tasks = parse_task_listing("a\tb\tc\td");
        assert_eq!(tasks[0].description, "c\td");
    }

    #[test]
    fn test_locate_prefers_bin_dir_over_subdirectory() {
        let dir = bin_dir_with_script("just");
        fs::write(dir.path().join("just.sh"), "").unwrap();
        let found = locate_provider_script("just", Some(dir.path())).unwrap();
        assert_eq!(found, dir.path().join("just.sh"));
    }

    #[test]
    fn test_locate_falls_back_to_taskrunners_subdirectory() {
        let dir = bin_dir_with_script("npm");
        let found = locate_provider_script("npm", Some(dir.path())).unwrap();
        assert_eq!(found, dir.path().join(TASKRUNNERS_DIR).join("npm.sh"));
    }

    #[tokio::test]
    async fn test_load_queries_icon_and_label_when_unset() {
        let dir = bin_dir_with_script("just");
        let shell = Arc::new(FakeShell::default());
        let provider = ScriptProvider::new(shell.clone(), Some(dir.path().to_path_buf()), None);

        let out = provider
            .load(&TaskrunnerConfig::new("just"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.icon, "🔨");
        assert_eq!(out.label, "Just");
        assert_eq!(out.tasks.len(), 2);
        assert_eq!(shell.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_load_keeps_configured_icon_and_label() {
        let dir = bin_dir_with_script("just");
        let shell = Arc::new(FakeShell::default());
        let provider = ScriptProvider::new(shell.clone(), Some(dir.path().to_path_buf()), None);

        let mut runner = TaskrunnerConfig::new("just");
        runner.icon = "J".to_string();
        runner.label = "recipes".to_string();
        let out = provider.load(&runner, &CancellationToken::new()).await.unwrap();

        assert_eq!(out.icon, "J");
        assert_eq!(out.label, "recipes");
        assert_eq!(shell.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_listing_failure_is_an_error() {
        let dir = bin_dir_with_script("just");
        let shell = Arc::new(FakeShell {
            fail_items: true,
            ..Default::default()
        });
        let provider = ScriptProvider::new(shell, Some(dir.path().to_path_buf()), None);
        let result = provider
            .load(&TaskrunnerConfig::new("just"), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ProviderError::Listing { .. })));
    }

    #[tokio::test]
    async fn test_missing_script_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptProvider::new(
            Arc::new(FakeShell::default()),
            Some(dir.path().to_path_buf()),
            None,
        );
        let result = provider
            .load(
                &TaskrunnerConfig::new("no-such-runner-xyz"),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(ProviderError::ScriptNotFound(_))));
    }
}
