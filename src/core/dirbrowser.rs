//! # Directory Browser
//!
//! Enumerates the files below a configured root, drops excluded paths, and orders
//! the result with one of three policies:
//!
//! - `alphabetical`: by path relative to the root.
//! - `modified`: by the file's own modification time (the fallback for unknown values).
//! - `modified-folder`: by the newest modification time inside the file's top-level
//!   folder, ties broken by the file's own modification time.
//!
//! `sort_direction = descending` (the default, also used when unset) flips every
//! comparison. Any other value sorts ascending.
use crate::constants::{DIM_END, DIM_START, FILE_ICON};
use crate::models::{Dirbrowser, Settings};
use crate::system::file_lister::{FileLister, ListQuery, ListedFile, ListingError};
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

// --- Glob matching ---

lazy_static! {
    static ref MATCH_NOTHING: Regex = Regex::new(r"[^\s\S]").unwrap();
}

/// A shell-style glob (`*`, `?`, `[...]`) matched against a single path component.
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
}

impl Glob {
    pub fn new(pattern: &str) -> Self {
        let regex = Regex::new(&glob_to_regex(pattern)).unwrap_or_else(|e| {
            log::warn!("Ignoring unusable glob '{}': {}", pattern, e);
            MATCH_NOTHING.clone()
        });
        Self { regex }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                if chars.peek() == Some(&'!') {
                    chars.next();
                    class.push('^');
                }
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    if inner == '\\' || inner == '[' {
                        class.push('\\');
                    }
                    class.push(inner);
                }
                if closed {
                    out.push('[');
                    out.push_str(&class);
                    out.push(']');
                } else {
                    out.push_str(&regex::escape(&format!("[{}", class)));
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

// --- Exclude rules ---

/// One entry of the comma separated `exclude_patterns` setting.
#[derive(Debug, Clone)]
pub enum ExcludeRule {
    /// A pattern starting with `*`: matched against the file name.
    FileGlob(Glob),
    /// Anything else: excludes a directory with this name anywhere below the root,
    /// and a file with this name.
    Name(Glob),
}

/// The ordered exclude list.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    rules: Vec<ExcludeRule>,
}

impl ExcludeRules {
    pub fn parse(patterns: &str) -> Self {
        let rules = patterns
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                if p.starts_with('*') {
                    ExcludeRule::FileGlob(Glob::new(p))
                } else {
                    ExcludeRule::Name(Glob::new(p))
                }
            })
            .collect();
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a directory with this name should not be descended into.
    pub fn prunes_dir(&self, dir_name: &str) -> bool {
        self.rules.iter().any(|rule| match rule {
            ExcludeRule::Name(glob) => glob.is_match(dir_name),
            ExcludeRule::FileGlob(_) => false,
        })
    }

    /// Whether the file at `rel_path` (relative to the browser root) is excluded.
    pub fn excludes(&self, rel_path: &Path) -> bool {
        if self.is_empty() {
            return false;
        }
        let file_name = rel_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dirs: Vec<String> = rel_path
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        self.rules.iter().any(|rule| match rule {
            ExcludeRule::FileGlob(glob) => glob.is_match(&file_name),
            ExcludeRule::Name(glob) => {
                glob.is_match(&file_name) || dirs.iter().any(|d| glob.is_match(d))
            }
        })
    }
}

// --- File entries ---

/// A file shown by a directory browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Path relative to the browser root, `/`-separated.
    pub rel_path: String,
    /// First component of `rel_path`, or the file name for files directly in the root.
    pub folder: String,
    pub filename: String,
    pub modified: SystemTime,
}

impl FileEntry {
    fn from_listed(root: &Path, listed: ListedFile) -> Self {
        let rel = listed
            .path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| listed.path.clone());
        let rel_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let filename = listed
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folder = match rel_path.split_once('/') {
            Some((first, _)) => first.to_string(),
            None => filename.clone(),
        };
        Self {
            path: listed.path,
            rel_path,
            folder,
            filename,
            modified: listed.modified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Alphabetical,
    Modified,
    ModifiedFolder,
}

impl SortMode {
    pub fn parse(value: &str) -> Self {
        match value {
            "alphabetical" => Self::Alphabetical,
            "modified-folder" => Self::ModifiedFolder,
            _ => Self::Modified,
        }
    }
}

/// Expands a leading `~` in the configured directory.
pub fn expand_root(directory: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(directory).into_owned())
}

fn effective_depth(db: &Dirbrowser) -> usize {
    usize::try_from(db.depth).ok().filter(|d| *d > 0).unwrap_or(1)
}

/// Builds the listing query for a directory browser.
pub fn build_query(db: &Dirbrowser, settings: &Settings) -> ListQuery {
    let query = ListQuery {
        root: expand_root(&db.directory),
        max_depth: effective_depth(db),
        rules: ExcludeRules::parse(&settings.exclude_patterns),
    };
    log::trace!(
        "Listing '{}' to depth {} with {} exclude rules",
        query.root.display(),
        query.max_depth,
        query.rules.len()
    );
    query
}

/// Only `descending` and an unset direction sort newest or last first.
fn is_descending(direction: &str) -> bool {
    matches!(direction, "" | "descending")
}

/// Lists, filters and sorts the files of a directory browser.
///
/// A failed listing is an error; an empty result is not.
pub async fn list_files(
    db: &Dirbrowser,
    settings: &Settings,
    lister: &dyn FileLister,
    cancel: &CancellationToken,
) -> Result<Vec<FileEntry>, ListingError> {
    let query = build_query(db, settings);
    let listed = lister.list(&query, cancel).await?;
    let mut entries = filter_entries(&query, &db.glob, listed);
    sort_entries(
        &mut entries,
        SortMode::parse(&db.sort),
        is_descending(&db.sort_direction),
    );
    log::debug!(
        "Dirbrowser '{}' listed {} files under '{}'",
        db.name,
        entries.len(),
        query.root.display()
    );
    Ok(entries)
}

/// Counts the files a browser would show, without sorting.
pub async fn count_files(
    db: &Dirbrowser,
    settings: &Settings,
    lister: &dyn FileLister,
    cancel: &CancellationToken,
) -> Result<usize, ListingError> {
    let query = build_query(db, settings);
    let listed = lister.list(&query, cancel).await?;
    Ok(filter_entries(&query, &db.glob, listed).len())
}

fn filter_entries(query: &ListQuery, glob: &str, listed: Vec<ListedFile>) -> Vec<FileEntry> {
    let only = (!glob.is_empty()).then(|| Glob::new(glob));
    listed
        .into_iter()
        .map(|f| FileEntry::from_listed(&query.root, f))
        .filter(|e| !query.rules.excludes(Path::new(&e.rel_path)))
        .filter(|e| only.as_ref().is_none_or(|g| g.is_match(&e.filename)))
        .collect()
}

/// Orders entries in place.
pub fn sort_entries(entries: &mut [FileEntry], mode: SortMode, descending: bool) {
    let direct = |ord: Ordering| if descending { ord.reverse() } else { ord };

    match mode {
        SortMode::Alphabetical => {
            entries.sort_by(|a, b| direct(a.rel_path.cmp(&b.rel_path)));
        }
        SortMode::Modified => {
            entries.sort_by(|a, b| direct(a.modified.cmp(&b.modified)));
        }
        SortMode::ModifiedFolder => {
            let mut newest: HashMap<String, SystemTime> = HashMap::new();
            for e in entries.iter() {
                newest
                    .entry(e.folder.clone())
                    .and_modify(|t| {
                        if e.modified > *t {
                            *t = e.modified;
                        }
                    })
                    .or_insert(e.modified);
            }
            let folder_time = |e: &FileEntry| {
                newest
                    .get(&e.folder)
                    .copied()
                    .unwrap_or(SystemTime::UNIX_EPOCH)
            };
            entries.sort_by(|a, b| {
                let by_folder = folder_time(a).cmp(&folder_time(b));
                let ord = if by_folder == Ordering::Equal {
                    a.modified.cmp(&b.modified)
                } else {
                    by_folder
                };
                direct(ord)
            });
        }
    }
}

// --- Display ---

/// Formats an elapsed duration as `Ns ago`, `Nm ago`, `Nh ago` or `Nd ago`.
pub fn format_age(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// Renders one picker line: `icon age │ [folder/]file\tpath\twidth\theight`.
pub fn format_file_entry(entry: &FileEntry, now: SystemTime, width: &str, height: &str) -> String {
    let age = format_age(now.duration_since(entry.modified).unwrap_or_default());
    let display = if entry.folder == entry.filename {
        entry.filename.clone()
    } else {
        format!("{}{}/{}{}", DIM_START, entry.folder, DIM_END, entry.filename)
    };
    format!(
        "{}  {:>8} │ {}\t{}\t{}\t{}",
        FILE_ICON,
        age,
        display,
        entry.path.display(),
        width,
        height
    )
}
