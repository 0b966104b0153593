//! Result types for batch upload operations.

use std::path::PathBuf;

/// Report for one successfully processed file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Source file.
    pub path: PathBuf,
    /// Resolved target page name (may contain `/` for nested pages).
    pub page_name: String,
    /// Remote page id; `None` in dry-run.
    pub page_id: Option<u64>,
    /// Whether the page was newly created; `None` in dry-run (existence
    /// is not checked without network access).
    pub created: Option<bool>,
    /// Web URL of the page, when the client can derive one.
    pub page_url: Option<String>,
    /// Attachment file names in upload order (planned names in
    /// dry-run).
    pub uploaded: Vec<String>,
    /// Occurrences rewritten to attachment references.
    pub rewritten: usize,
    /// Diagram blocks rendered successfully.
    pub diagrams_rendered: usize,
    /// Per-block conversion failures; the failed fence is left as-is.
    pub diagram_failures: Vec<String>,
    /// Non-fatal observations (missing local images, etc.).
    pub warnings: Vec<String>,
    /// Whether this was a dry-run.
    pub dry_run: bool,
}

/// Terminal state of one batch item.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Not yet processed.
    Pending,
    /// Processed and written (or planned, in dry-run).
    Succeeded(FileReport),
    /// Processing failed.
    Failed(String),
    /// Not processed because the batch aborted earlier.
    Skipped(String),
}

/// One discovered file and its outcome.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl BatchItem {
    pub(crate) fn pending(path: PathBuf) -> Self {
        Self {
            path,
            outcome: FileOutcome::Pending,
        }
    }
}

/// Ordered outcomes of one orchestrator invocation. Owned by that
/// invocation and discarded after the run; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub items: Vec<BatchItem>,
}

impl BatchResult {
    /// Number of items in the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Number of successfully processed files.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, FileOutcome::Succeeded(_)))
            .count()
    }

    /// Number of failed files.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, FileOutcome::Failed(_)))
            .count()
    }

    /// Number of files skipped after an abort.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, FileOutcome::Skipped(_)))
            .count()
    }

    /// Whether every item was processed without failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }
}
