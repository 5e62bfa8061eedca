// src/system/tmux.rs

//! # tmux Process Control
//!
//! Everything that creates, finds or kills multiplexer windows lives behind [`WindowControl`].
//! The core hands over fully resolved actions, names and commands; this module owns the tmux
//! syntax: popups, windows, split panes, dimension clamping and the run wrapper.
use crate::constants::{APP_NAME, RUN_WRAPPER_FILENAME};
use crate::models::Action;
use async_trait::async_trait;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Unknown launch action '{0}'.")]
    UnknownAction(String),
    #[error("Could not run tmux: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("tmux {command} failed: {stderr}")]
    Tmux { command: String, stderr: String },
    #[error("Could not write launch script '{path}': {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Command cannot be quoted for the shell: {0}")]
    Unquotable(String),
}

/// Extra state for launching a task-runner task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskLaunch {
    /// Respawn the existing window instead of opening a new one.
    pub reuse_window: bool,
    pub running_icon: String,
    pub success_icon: String,
    pub failed_icon: String,
}

/// A fully resolved launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchRequest {
    pub action: Action,
    /// Window name or popup title.
    pub name: String,
    pub cmd: String,
    /// Working directory. Defaults to the active pane's.
    pub dir: Option<PathBuf>,
    pub width: String,
    pub height: String,
    pub max_width: String,
    pub max_height: String,
    /// Runs after the command, apps only.
    pub on_exit: String,
    /// Apps get failure reporting in popups.
    pub is_app: bool,
    pub task: Option<TaskLaunch>,
}

/// Process control consumed by the menu loop.
#[async_trait]
pub trait WindowControl: Send + Sync + std::fmt::Debug {
    /// Names of the windows in the current session. Errors yield an empty set.
    async fn running_windows(&self) -> HashSet<String>;

    async fn is_window_running(&self, name: &str) -> bool {
        self.running_windows().await.contains(name)
    }

    async fn select_window(&self, name: &str) -> Result<(), LaunchError>;

    async fn kill_window(&self, name: &str) -> Result<(), LaunchError>;

    /// Working directory of the active pane.
    async fn current_path(&self) -> Option<PathBuf>;

    async fn launch(&self, request: &LaunchRequest) -> Result<(), LaunchError>;
}

/// Talks to the tmux server of the current session.
#[derive(Debug, Clone, Default)]
pub struct TmuxClient {
    bin_dir: Option<PathBuf>,
}

impl TmuxClient {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    /// Whether this process runs inside a tmux session.
    pub fn in_session() -> bool {
        std::env::var_os("TMUX").is_some_and(|v| !v.is_empty())
    }

    async fn run(&self, args: &[&str]) -> Result<String, LaunchError> {
        log::debug!("tmux {}", args.join(" "));
        let output = Command::new("tmux")
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(LaunchError::Spawn)?;
        if !output.status.success() {
            return Err(LaunchError::Tmux {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn display(&self, format: &str) -> Option<String> {
        self.run(&["display-message", "-p", format]).await.ok()
    }

    async fn client_size(&self) -> Option<(u32, u32)> {
        let out = self.display("#{window_width} #{window_height}").await?;
        let (w, h) = out.split_once(' ')?;
        Some((leading_number(w)?, leading_number(h)?))
    }

    async fn find_window_by_prefix(&self, prefix: &str) -> Option<String> {
        let out = self
            .run(&["list-windows", "-F", "#{window_id} #{window_name}"])
            .await
            .ok()?;
        out.lines()
            .filter_map(|line| line.split_once(' '))
            .find(|(_, name)| name.starts_with(prefix))
            .map(|(id, _)| id.to_string())
    }

    fn wrap(&self, cmd: &str) -> Result<String, LaunchError> {
        wrap_command(self.bin_dir.as_deref(), cmd)
    }

    async fn launch_popup(&self, req: &LaunchRequest, dir: &str) -> Result<(), LaunchError> {
        let pane_id = self.display("#{pane_id}").await.unwrap_or_default();
        let (mut file, script_path) = tempfile::Builder::new()
            .prefix(&format!("{}-popup-", APP_NAME))
            .suffix(".sh")
            .tempfile()
            .and_then(|f| f.keep().map_err(|e| e.error))
            .map_err(|source| LaunchError::Script {
                path: std::env::temp_dir(),
                source,
            })?;
        let tmp_path =
            std::env::temp_dir().join(format!("{}-tmp-{}", APP_NAME, std::process::id()));
        let placeholders = Placeholders {
            pane_id: &pane_id,
            tmp: &tmp_path.to_string_lossy(),
            dir,
        };
        let script = popup_script(req, self.bin_dir.as_deref(), dir, &placeholders, &script_path);
        file.write_all(script.as_bytes())
            .map_err(|source| LaunchError::Script {
                path: script_path.clone(),
                source,
            })?;

        let title = format!(" {}: {} ", APP_NAME, req.name);
        let popup = format!(
            "sleep 0.05; tmux display-popup -E -b rounded -T {} -w {} -h {} {}",
            quote(&title)?,
            quote(&req.width)?,
            quote(&req.height)?,
            quote(&format!("bash {}", quote(&script_path.to_string_lossy())?))?
        );
        // Detached so the popup outlives the menu popup that requested it.
        self.run(&["run-shell", "-b", &popup]).await.map(|_| ())
    }

    async fn launch_window(
        &self,
        req: &LaunchRequest,
        dir: &str,
        background: bool,
    ) -> Result<(), LaunchError> {
        if let Some(task) = req.task.as_ref().filter(|t| t.reuse_window) {
            if let Some(window_id) = self.find_window_by_prefix(&req.name).await {
                return self.respawn_window(req, task, &window_id, dir, background).await;
            }
        }

        let name = window_title(req);
        let wrapped = self.wrap(&req.cmd)?;
        let mut args = vec!["new-window", "-n", name.as_str(), "-c", dir];
        if background {
            args.push("-d");
        }
        args.push(&wrapped);
        self.run(&args).await.map(|_| ())
    }

    async fn respawn_window(
        &self,
        req: &LaunchRequest,
        task: &TaskLaunch,
        window_id: &str,
        dir: &str,
        background: bool,
    ) -> Result<(), LaunchError> {
        let current = self.display("#{window_id}").await;
        let name = if task.running_icon.is_empty() {
            req.name.clone()
        } else {
            format!("{} {}", req.name, task.running_icon)
        };
        let wrapped = self.wrap(&req.cmd)?;

        if let Err(e) = self.run(&["rename-window", "-t", window_id, &name]).await {
            log::debug!("Could not rename '{}': {}", window_id, e);
        }
        self.run(&["respawn-window", "-k", "-t", window_id, "-c", dir, &wrapped])
            .await?;

        if !background {
            return self.run(&["select-window", "-t", window_id]).await.map(|_| ());
        }
        if let Some(current) = current.filter(|c| !c.is_empty()) {
            let _ = self.run(&["select-window", "-t", &current]).await;
        }
        Ok(())
    }

    async fn launch_pane(
        &self,
        req: &LaunchRequest,
        dir: &str,
        direction: &str,
        before: bool,
    ) -> Result<(), LaunchError> {
        let wrapped = self.wrap(&req.cmd)?;
        let mut args = vec!["split-window", direction];
        if before {
            args.push("-b");
        }
        args.extend(["-c", dir, wrapped.as_str()]);
        self.run(&args).await.map(|_| ())
    }
}

#[async_trait]
impl WindowControl for TmuxClient {
    async fn running_windows(&self) -> HashSet<String> {
        match self.run(&["list-windows", "-F", "#{window_name}"]).await {
            Ok(out) => out
                .lines()
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                log::debug!("Could not list windows: {}", e);
                HashSet::new()
            }
        }
    }

    async fn select_window(&self, name: &str) -> Result<(), LaunchError> {
        self.run(&["select-window", "-t", name]).await.map(|_| ())
    }

    async fn kill_window(&self, name: &str) -> Result<(), LaunchError> {
        self.run(&["kill-window", "-t", name]).await.map(|_| ())
    }

    async fn current_path(&self) -> Option<PathBuf> {
        self.display("#{pane_current_path}")
            .await
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
    }

    async fn launch(&self, request: &LaunchRequest) -> Result<(), LaunchError> {
        let mut req = request.clone();
        let dir = match req.dir.take() {
            Some(dir) => dir,
            None => self.current_path().await.unwrap_or_else(|| PathBuf::from(".")),
        };
        let dir = dir.to_string_lossy().into_owned();

        req.width = normalize_dimension(&req.width);
        req.height = normalize_dimension(&req.height);
        if let Some((cols, rows)) = self.client_size().await {
            req.width = clamp_dimension(&req.width, &req.max_width, cols);
            req.height = clamp_dimension(&req.height, &req.max_height, rows);
        }

        log::info!("Launching '{}' as {}", req.name, req.action);
        match &req.action {
            Action::Popup => self.launch_popup(&req, &dir).await,
            Action::Window => self.launch_window(&req, &dir, false).await,
            Action::BackgroundWindow => self.launch_window(&req, &dir, true).await,
            Action::PaneRight => self.launch_pane(&req, &dir, "-h", false).await,
            Action::PaneLeft => self.launch_pane(&req, &dir, "-h", true).await,
            Action::PaneBelow => self.launch_pane(&req, &dir, "-v", false).await,
            Action::PaneAbove => self.launch_pane(&req, &dir, "-v", true).await,
            Action::Other(raw) => Err(LaunchError::UnknownAction(raw.clone())),
        }
    }
}

// --- Command construction ---

fn quote(value: &str) -> Result<String, LaunchError> {
    shlex::try_quote(value)
        .map(|q| q.into_owned())
        .map_err(|_| LaunchError::Unquotable(value.to_string()))
}

/// Runs `cmd` through bash, sourcing the run wrapper when the helper directory is known.
pub fn wrap_command(bin_dir: Option<&Path>, cmd: &str) -> Result<String, LaunchError> {
    let quoted = quote(cmd)?;
    Ok(match bin_dir {
        Some(dir) => format!(
            "{} bash -c {}",
            quote(&dir.join(RUN_WRAPPER_FILENAME).to_string_lossy())?,
            quoted
        ),
        None => format!("bash -c {}", quoted),
    })
}

fn window_title(req: &LaunchRequest) -> String {
    match &req.task {
        Some(task) if !task.running_icon.is_empty() => {
            format!("{} {}", req.name, task.running_icon)
        }
        _ => req.name.clone(),
    }
}

/// Defaults an empty dimension to 90% and turns a bare number into a percentage.
pub fn normalize_dimension(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        "90%".to_string()
    } else if value.chars().all(|c| c.is_ascii_digit()) {
        format!("{}%", value)
    } else {
        value.to_string()
    }
}

fn leading_number(value: &str) -> Option<u32> {
    let digits: String = value.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Replaces a percentage with `max` when it would exceed `max` cells of `total`.
pub fn clamp_dimension(value: &str, max: &str, total: u32) -> String {
    let Some(pct) = value.strip_suffix('%').and_then(leading_number) else {
        return value.to_string();
    };
    let Some(limit) = leading_number(max).filter(|l| *l > 0) else {
        return value.to_string();
    };
    let cells = u64::from(total) * u64::from(pct) / 100;
    if total > 0 && cells > u64::from(limit) {
        max.trim().to_string()
    } else {
        value.to_string()
    }
}

/// Values substituted into `{pane_id}`, `{tmp}` and `{dir}`.
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
    pub pane_id: &'a str,
    pub tmp: &'a str,
    pub dir: &'a str,
}

impl Placeholders<'_> {
    pub fn apply(&self, text: &str) -> String {
        text.replace("{pane_id}", self.pane_id)
            .replace("{tmp}", self.tmp)
            .replace("{dir}", self.dir)
    }
}

/// The bash script a popup runs. Apps report a failing exit status and wait for a key.
pub fn popup_script(
    req: &LaunchRequest,
    bin_dir: Option<&Path>,
    dir: &str,
    placeholders: &Placeholders<'_>,
    script_path: &Path,
) -> String {
    let cmd = placeholders.apply(&req.cmd);
    let on_exit = placeholders.apply(&req.on_exit);
    let mut script = String::from("#!/usr/bin/env bash\n");

    if let Some(bin) = bin_dir {
        script.push_str(&format!(
            "source \"{}\" 2>/dev/null || true\nexport PATH=\"{}:$PATH\"\n",
            bin.join(RUN_WRAPPER_FILENAME).display(),
            bin.display()
        ));
    }
    script.push_str(&format!("cd \"{}\"\n\n", dir));

    if req.is_app {
        script.push_str(&format!("{} 2>/dev/null\nexit_code=$?\n\n", cmd));
        if !on_exit.is_empty() {
            script.push_str(&on_exit);
            script.push_str("\n\n");
        }
        script.push_str("if [[ $exit_code -ne 0 ]]; then\n    echo \"\"\n");
        script.push_str("    if [[ $exit_code -eq 127 ]]; then\n");
        script.push_str(&format!(
            "        echo -e \"\\033[1;31mCommand not found: {}\\033[0m\"\n",
            req.name
        ));
        script.push_str("    else\n");
        script.push_str(&format!(
            "        echo -e \"\\033[1;31m{} exited with code $exit_code\\033[0m\"\n",
            req.name
        ));
        script.push_str("    fi\n    echo \"\"\n    echo \"Press any key...\"\n    read -n 1 -s\nfi\n");
    } else {
        script.push_str(&cmd);
        script.push('\n');
    }

    script.push_str(&format!("rm -f \"{}\"\n", script_path.display()));
    script
}

/// Wraps a task command so its window is renamed with a success or failure icon and
/// stays open until a key is pressed.
pub fn task_command(bin_dir: Option<&Path>, cmd: &str, window_name: &str, task: &TaskLaunch) -> String {
    let source = bin_dir
        .map(|b| {
            format!(
                "source \"{}\" 2>/dev/null || true\n",
                b.join(RUN_WRAPPER_FILENAME).display()
            )
        })
        .unwrap_or_default();
    format!(
        "{source}{cmd}
exit_code=$?
echo
if [[ $exit_code -eq 0 ]]; then
    tmux rename-window -t \"$TMUX_PANE\" \"{name} {ok}\" 2>/dev/null
    echo -e \"\\033[32m✓ Task completed successfully\\033[0m\"
else
    tmux rename-window -t \"$TMUX_PANE\" \"{name} {fail}\" 2>/dev/null
    echo -e \"\\033[31m✗ Task failed with exit code $exit_code\\033[0m\"
fi
echo
echo \"Press any key to close...\"
read -n 1 -s
",
        source = source,
        cmd = cmd,
        name = window_name,
        ok = task.success_icon,
        fail = task.failed_icon
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dimension() {
        assert_eq!(normalize_dimension(""), "90%");
        assert_eq!(normalize_dimension("80"), "80%");
        assert_eq!(normalize_dimension("75%"), "75%");
        assert_eq!(normalize_dimension("120"), "120%");
    }

    #[test]
    fn test_clamp_dimension() {
        // 90% of 200 columns is 180, over the 120 limit.
        assert_eq!(clamp_dimension("90%", "120", 200), "120");
        // 50% of 200 is 100, under the limit.
        assert_eq!(clamp_dimension("50%", "120", 200), "50%");
        // No limit, unknown size, or absolute values are left alone.
        assert_eq!(clamp_dimension("90%", "", 200), "90%");
        assert_eq!(clamp_dimension("90%", "120", 0), "90%");
        assert_eq!(clamp_dimension("100", "50", 200), "100");
    }

    #[test]
    fn test_wrap_command_quotes() {
        let plain = wrap_command(None, "echo 'hi'").unwrap();
        assert!(plain.starts_with("bash -c "));
        assert_eq!(shlex::split(&plain).unwrap(), ["bash", "-c", "echo 'hi'"]);

        let wrapped = wrap_command(Some(Path::new("/opt/muxdeck")), "htop").unwrap();
        assert_eq!(
            shlex::split(&wrapped).unwrap(),
            ["/opt/muxdeck/muxdeck-run", "bash", "-c", "htop"]
        );
    }

    #[test]
    fn test_placeholders() {
        let p = Placeholders {
            pane_id: "%3",
            tmp: "/tmp/x",
            dir: "/src",
        };
        assert_eq!(p.apply("lf -last-dir-path {tmp} {dir} {pane_id}"), "lf -last-dir-path /tmp/x /src %3");
    }

    #[test]
    fn test_popup_script_for_app_runs_on_exit() {
        let req = LaunchRequest {
            name: "lf".to_string(),
            cmd: "lf {dir}".to_string(),
            on_exit: "cat {tmp}".to_string(),
            is_app: true,
            ..Default::default()
        };
        let p = Placeholders {
            pane_id: "%1",
            tmp: "/tmp/t",
            dir: "/work",
        };
        let script = popup_script(&req, None, "/work", &p, Path::new("/tmp/s"));
        assert!(script.contains("cd \"/work\""));
        assert!(script.contains("lf /work 2>/dev/null\nexit_code=$?"));
        assert!(script.contains("cat /tmp/t\n"));
        assert!(script.contains("lf exited with code"));
        assert!(script.ends_with("rm -f \"/tmp/s\"\n"));
    }

    #[test]
    fn test_popup_script_plain_command() {
        let req = LaunchRequest {
            name: "notes".to_string(),
            cmd: "nvim '/n/a.md'".to_string(),
            ..Default::default()
        };
        let p = Placeholders {
            pane_id: "",
            tmp: "",
            dir: "/",
        };
        let script = popup_script(&req, Some(Path::new("/b")), "/", &p, Path::new("/tmp/s"));
        assert!(script.contains("source \"/b/muxdeck-run\""));
        assert!(script.contains("\nnvim '/n/a.md'\n"));
        assert!(!script.contains("exit_code"));
    }

    #[test]
    fn test_window_title_shows_running_icon_for_tasks() {
        let mut req = LaunchRequest {
            name: "just » build".to_string(),
            ..Default::default()
        };
        assert_eq!(window_title(&req), "just » build");
        req.task = Some(TaskLaunch {
            running_icon: "🔄".to_string(),
            ..Default::default()
        });
        assert_eq!(window_title(&req), "just » build 🔄");
    }

    #[test]
    fn test_task_command_renames_on_completion() {
        let task = TaskLaunch {
            success_icon: "✅".to_string(),
            failed_icon: "❌".to_string(),
            ..Default::default()
        };
        let script = task_command(None, "just build", "just » build", &task);
        assert!(script.starts_with("just build\nexit_code=$?"));
        assert!(script.contains("\"just » build ✅\""));
        assert!(script.contains("\"just » build ❌\""));
    }
}
