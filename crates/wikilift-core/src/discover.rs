//! Batch discovery of Markdown source files.
//!
//! A single file is a batch of one. A directory is walked (recursively
//! by default), file names matched case-insensitively against a glob
//! pattern, exclude patterns applied, and the result sorted into a
//! deterministic lexicographic order so repeated runs over the same
//! tree process files identically.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::debug;

/// Default include pattern.
pub const DEFAULT_PATTERN: &str = "*.md";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Discovery configuration.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Glob pattern matched against file names.
    pub pattern: String,
    /// Recurse into subdirectories.
    pub recursive: bool,
    /// A file matching any exclude pattern (by name or by path relative
    /// to the discovery root) is dropped from the batch.
    pub excludes: Vec<String>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_owned(),
            recursive: true,
            excludes: Vec::new(),
        }
    }
}

/// Discovery error.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    /// Target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// A glob pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    /// Directory traversal failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discover the batch for one invocation.
///
/// # Errors
///
/// Fails when the target path does not exist, a pattern is invalid, or
/// the directory walk hits an IO error.
pub fn discover_files(
    path: &Path,
    options: &DiscoverOptions,
) -> Result<Vec<PathBuf>, DiscoverError> {
    if !path.exists() {
        return Err(DiscoverError::NotFound(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let include = compile(&options.pattern)?;
    let excludes = options
        .excludes
        .iter()
        .map(|p| compile(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut files = Vec::new();
    walk(path, path, &include, &excludes, options.recursive, &mut files)?;
    files.sort();
    debug!("discovered {} file(s) under {}", files.len(), path.display());
    Ok(files)
}

fn compile(pattern: &str) -> Result<Pattern, DiscoverError> {
    Pattern::new(pattern).map_err(|source| DiscoverError::Pattern {
        pattern: pattern.to_owned(),
        source,
    })
}

fn walk(
    root: &Path,
    dir: &Path,
    include: &Pattern,
    excludes: &[Pattern],
    recursive: bool,
    files: &mut Vec<PathBuf>,
) -> Result<(), DiscoverError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();

        // Skip hidden files and directories.
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if recursive {
                walk(root, &path, include, excludes, recursive, files)?;
            }
            continue;
        }

        if !include.matches_with(&name, MATCH_OPTIONS) {
            continue;
        }
        if is_excluded(root, &path, &name, excludes) {
            continue;
        }
        files.push(path);
    }
    Ok(())
}

/// Excludes match against the bare file name and the root-relative
/// path (with forward slashes).
fn is_excluded(root: &Path, path: &Path, name: &str, excludes: &[Pattern]) -> bool {
    let relative = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    excludes
        .iter()
        .any(|p| p.matches_with(name, MATCH_OPTIONS) || p.matches_with(&relative, MATCH_OPTIONS))
}
