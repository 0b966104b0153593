//! Batch progress observation.

use std::path::Path;

/// Observer for batch progress.
///
/// Purely observational: implementations are side-effect only and
/// pipeline outcomes never depend on them. All methods default to
/// no-ops.
pub trait Progress {
    /// A file is about to be processed. `index` is zero-based against
    /// `total`.
    fn file_started(&self, _index: usize, _total: usize, _path: &Path) {}

    /// A file reached a terminal state.
    fn file_finished(&self, _index: usize, _total: usize, _path: &Path, _succeeded: bool) {}

    /// A non-fatal observation worth surfacing (ignored page-name
    /// override, missing local image).
    fn warning(&self, _message: &str) {}
}

/// Progress observer that discards everything.
pub struct NullProgress;

impl Progress for NullProgress {}
