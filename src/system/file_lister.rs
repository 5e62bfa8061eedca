// src/system/file_lister.rs

use crate::core::dirbrowser::ExcludeRules;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Directory '{0}' does not exist.")]
    NotFound(PathBuf),
    #[error("Failed to list '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Listing worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
    #[error("Listing timed out.")]
    TimedOut,
    #[error("Listing was cancelled.")]
    Cancelled,
}

/// What to enumerate.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Absolute root, already home-expanded.
    pub root: PathBuf,
    /// Maximum depth below `root`; files directly in `root` are depth 1.
    pub max_depth: usize,
    /// Listers may use these to skip excluded directories early.
    pub rules: ExcludeRules,
}

/// A regular file found by a lister.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Enumerates regular files below a directory.
#[async_trait]
pub trait FileLister: Send + Sync + std::fmt::Debug {
    async fn list(
        &self,
        query: &ListQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<ListedFile>, ListingError>;
}

/// Walks the filesystem with `walkdir` on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct WalkdirLister;

#[async_trait]
impl FileLister for WalkdirLister {
    async fn list(
        &self,
        query: &ListQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<ListedFile>, ListingError> {
        if !query.root.is_dir() {
            return Err(ListingError::NotFound(query.root.clone()));
        }
        let query = query.clone();
        let token = cancel.clone();
        let worker = tokio::task::spawn_blocking(move || walk(&query, &token));

        tokio::select! {
            _ = cancel.cancelled() => Err(ListingError::Cancelled),
            joined = worker => joined?,
        }
    }
}

fn walk(query: &ListQuery, cancel: &CancellationToken) -> Result<Vec<ListedFile>, ListingError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(&query.root)
        .max_depth(query.max_depth)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !query.rules.prunes_dir(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        if cancel.is_cancelled() {
            return Err(ListingError::Cancelled);
        }
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself failing is fatal; unreadable subtrees are skipped.
            Err(e) if e.depth() == 0 => {
                return Err(ListingError::Walk {
                    path: query.root.clone(),
                    source: e,
                });
            }
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push(ListedFile {
            path: entry.into_path(),
            modified,
        });
    }
    Ok(files)
}
