// src/core/paths.rs

use crate::constants::{
    APP_NAME, LOG_FILENAME, RC_FILE_ENV, RC_FILENAME, RUN_WRAPPER_FILENAME, XDG_CONFIG_FILENAME,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find the system cache directory.")]
    CacheDirNotFound,
    #[error("Could not create directory at '{path}': {source}")]
    DirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where to look for the config file, captured from the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigSearch {
    /// Value of `MUXDECK_RC_FILE`.
    pub env_override: Option<PathBuf>,
    /// Directory the upward `.muxdeckrc` search starts in.
    pub start_dir: Option<PathBuf>,
    /// `$XDG_CONFIG_HOME`, or `~/.config` when unset.
    pub config_home: Option<PathBuf>,
}

impl ConfigSearch {
    pub fn from_env() -> Self {
        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")));
        Self {
            env_override: std::env::var_os(RC_FILE_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            start_dir: std::env::current_dir().ok(),
            config_home,
        }
    }

    /// Resolves the config file: the env override if it exists, then the nearest
    /// `.muxdeckrc` at or above the start directory, then `<config_home>/muxdeck/config`.
    pub fn resolve(&self) -> Option<PathBuf> {
        if let Some(path) = self.env_override.as_ref().filter(|p| p.exists()) {
            return Some(path.clone());
        }

        if let Some(start) = &self.start_dir {
            let found = start
                .ancestors()
                .map(|dir| dir.join(RC_FILENAME))
                .find(|rc| rc.is_file());
            if found.is_some() {
                return found;
            }
        }

        self.config_home
            .as_ref()
            .map(|home| home.join(APP_NAME).join(XDG_CONFIG_FILENAME))
            .filter(|p| p.exists())
    }
}

/// Resolves the config file from the process environment.
pub fn find_config_file() -> Option<PathBuf> {
    ConfigSearch::from_env().resolve()
}

/// The conventional config location, used when offering to create one.
pub fn default_config_path() -> Option<PathBuf> {
    ConfigSearch::from_env()
        .config_home
        .map(|home| home.join(APP_NAME).join(XDG_CONFIG_FILENAME))
}

/// Finds the helper directory: the executable's own directory when it holds the run
/// wrapper, else the first well-known location that does.
pub fn find_bin_dir() -> Option<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    let mut candidates: Vec<PathBuf> = exe_dir.into_iter().collect();
    if let Some(data) = dirs::data_dir() {
        candidates.push(data.join(APP_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("bin"));
    }
    candidates.push(PathBuf::from("/usr/local/share").join(APP_NAME));

    first_with_wrapper(candidates)
}

fn first_with_wrapper(candidates: Vec<PathBuf>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .find(|dir| dir.join(RUN_WRAPPER_FILENAME).is_file())
        .map(|dir| dunce::simplified(&dir).to_path_buf())
}

/// Returns the log file path without touching the filesystem.
pub fn log_file_path() -> Result<PathBuf, PathError> {
    let cache = dirs::cache_dir().ok_or(PathError::CacheDirNotFound)?;
    Ok(cache.join(APP_NAME).join(LOG_FILENAME))
}

/// Returns the log file path, creating its directory.
pub fn ensure_log_file_path() -> Result<PathBuf, PathError> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| PathError::DirCreation {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(path)
}

/// Replaces the home directory prefix with `~` for display.
pub fn tildify(path: &str) -> String {
    match dirs::home_dir() {
        Some(home) => tildify_with(path, &home.to_string_lossy()),
        None => path.to_string(),
    }
}

fn tildify_with(path: &str, home: &str) -> String {
    if home.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(home) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("~{}", rest),
        _ => path.to_string(),
    }
}
