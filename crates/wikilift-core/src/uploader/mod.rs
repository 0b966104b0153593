//! Upload orchestrator.
//!
//! Drives one invocation from a discovered batch to a [`BatchResult`]:
//! parse, convert diagram blocks, upload attachments, rewrite content,
//! resolve the page name, and create or update the page. Strictly
//! sequential: files within a batch, blocks within a file, uploads
//! within a file. Batch state is an explicit ordered list of outcomes,
//! which gives continue-on-error and fail-fast from the same loop.

mod progress;
mod result;

pub use progress::{NullProgress, Progress};
pub use result::{BatchItem, BatchResult, FileOutcome, FileReport};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::document::{DiagramBlock, ParsedDocument};
use crate::mermaid::{DiagramRenderer, MermaidConverter};
use crate::sanitize::strip_pictographs;
use crate::wiki::{AttachmentRef, WikiClient, WikiError};

/// Options for one orchestrator invocation.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Target project key.
    pub project: String,
    /// Explicit page name. Honored only for single-file batches;
    /// ignored with a warning otherwise.
    pub page_name: Option<String>,
    /// Run the full local pipeline but perform no network mutation.
    pub dry_run: bool,
    /// Record per-file failures and keep going instead of aborting the
    /// remaining batch.
    pub continue_on_error: bool,
}

/// Per-file pipeline error.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Source file missing or unreadable (including non-UTF-8 input).
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Wiki service failure.
    #[error(transparent)]
    Wiki(#[from] WikiError),
}

/// Backlog wiki attachment reference syntax.
fn attachment_link(name: &str) -> String {
    format!("![image][{name}]")
}

/// Sequential batch uploader.
pub struct Uploader<'a, C, R> {
    client: &'a C,
    converter: MermaidConverter<R>,
    options: UploadOptions,
}

impl<'a, C: WikiClient, R: DiagramRenderer> Uploader<'a, C, R> {
    pub fn new(client: &'a C, converter: MermaidConverter<R>, options: UploadOptions) -> Self {
        Self {
            client,
            converter,
            options,
        }
    }

    /// Process a batch in order, returning one outcome per file.
    ///
    /// Authentication failure aborts the remaining batch regardless of
    /// the continue-on-error flag; any other per-file failure aborts
    /// only when continue-on-error is off. The converter's temp
    /// directory is cleaned up before returning.
    pub fn run(&mut self, files: &[PathBuf], progress: &dyn Progress) -> BatchResult {
        let total = files.len();
        let explicit_name = match (&self.options.page_name, total) {
            (Some(name), 0 | 1) => Some(name.clone()),
            (Some(_), _) => {
                let message = format!(
                    "page name ignored: batch has {total} files; each page uses its own derived name"
                );
                warn!("{message}");
                progress.warning(&message);
                None
            }
            (None, _) => None,
        };

        let mut items: Vec<BatchItem> =
            files.iter().cloned().map(BatchItem::pending).collect();
        let mut abort: Option<String> = None;

        for (index, path) in files.iter().enumerate() {
            if let Some(reason) = &abort {
                items[index].outcome = FileOutcome::Skipped(reason.clone());
                continue;
            }

            progress.file_started(index, total, path);
            match self.upload_file(path, explicit_name.as_deref()) {
                Ok(report) => {
                    progress.file_finished(index, total, path, true);
                    items[index].outcome = FileOutcome::Succeeded(report);
                }
                Err(err) => {
                    progress.file_finished(index, total, path, false);
                    let auth_failure = matches!(&err, UploadError::Wiki(WikiError::Auth(_)));
                    items[index].outcome = FileOutcome::Failed(err.to_string());

                    if auth_failure {
                        warn!("authentication failed; aborting remaining batch");
                        abort = Some("batch aborted: authentication failed".to_owned());
                    } else if !self.options.continue_on_error {
                        abort = Some("batch aborted by earlier failure".to_owned());
                    }
                }
            }
        }

        if let Err(err) = self.converter.cleanup() {
            warn!("temp directory cleanup failed: {err}");
        }

        BatchResult { items }
    }

    /// One file through the pipeline: parse, convert, upload, rewrite,
    /// create-or-update, attach.
    fn upload_file(
        &mut self,
        path: &Path,
        page_name_override: Option<&str>,
    ) -> Result<FileReport, UploadError> {
        let doc = ParsedDocument::from_file(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let warnings: Vec<String> = doc
            .missing_images()
            .map(|img| format!("local image not found, left unchanged: {}", img.path))
            .collect();

        // Rendered diagram outputs become additional local uploads; a
        // failed block keeps its fence and is reported, not fatal.
        let outcomes = self.converter.convert_all(&doc.diagrams);
        let mut rendered: Vec<(&DiagramBlock, PathBuf)> = Vec::new();
        let mut diagram_failures = Vec::new();
        for (block, outcome) in doc.diagrams.iter().zip(outcomes) {
            match outcome {
                Ok(output) => rendered.push((block, output)),
                Err(failure) => diagram_failures.push(format!("{}: {failure}", block.id)),
            }
        }

        let page_name = resolve_page_name(&doc, page_name_override);

        if self.options.dry_run {
            return Ok(self.plan_file(&doc, &rendered, page_name, diagram_failures, warnings));
        }

        // Upload local images, deduplicated by resolved path: one
        // upload per distinct file, every occurrence rewritten.
        let mut by_path: HashMap<PathBuf, AttachmentRef> = HashMap::new();
        let mut replacements: HashMap<String, String> = HashMap::new();
        let mut attachment_ids: Vec<u64> = Vec::new();
        let mut uploaded: Vec<String> = Vec::new();

        for img in doc.uploadable_images() {
            let Some(resolved) = img.resolved.clone() else {
                continue;
            };
            let attachment = if let Some(existing) = by_path.get(&resolved) {
                existing.clone()
            } else {
                let fresh = self.client.upload_attachment(&resolved)?;
                attachment_ids.push(fresh.id);
                uploaded.push(fresh.name.clone());
                by_path.insert(resolved, fresh.clone());
                fresh
            };
            replacements.insert(img.original_text.clone(), attachment_link(&attachment.name));
        }

        for (block, output) in &rendered {
            let attachment = self.client.upload_attachment(output)?;
            attachment_ids.push(attachment.id);
            uploaded.push(attachment.name.clone());
            replacements.insert(block.original_text.clone(), attachment_link(&attachment.name));
        }

        let rewritten = count_rewrites(&doc, &replacements);
        let content = strip_pictographs(&doc.rewrite(&replacements));

        let (page, created) = match self.client.find_page(&self.options.project, &page_name)? {
            Some(existing) => (self.client.update_page(existing.id, &content)?, false),
            None => {
                let project_id = self.client.project_id(&self.options.project)?;
                let page = self.client.create_page(project_id, &page_name, &content)?;
                (page, true)
            }
        };

        if !attachment_ids.is_empty() {
            self.client.attach_to_page(page.id, &attachment_ids)?;
        }

        info!(
            "{} page '{}' ({} attachment(s))",
            if created { "created" } else { "updated" },
            page_name,
            attachment_ids.len()
        );

        Ok(FileReport {
            path: path.to_path_buf(),
            page_url: self.client.page_url(&self.options.project, &page_name),
            page_name,
            page_id: Some(page.id),
            created: Some(created),
            uploaded,
            rewritten,
            diagrams_rendered: rendered.len(),
            diagram_failures,
            warnings,
            dry_run: false,
        })
    }

    /// Dry-run report: same local pipeline, predicted attachment names,
    /// zero client calls.
    fn plan_file(
        &self,
        doc: &ParsedDocument,
        rendered: &[(&DiagramBlock, PathBuf)],
        page_name: String,
        diagram_failures: Vec<String>,
        warnings: Vec<String>,
    ) -> FileReport {
        let mut seen: Vec<PathBuf> = Vec::new();
        let mut replacements: HashMap<String, String> = HashMap::new();
        let mut uploaded: Vec<String> = Vec::new();

        for img in doc.uploadable_images() {
            let Some(resolved) = img.resolved.clone() else {
                continue;
            };
            let name = file_name(&resolved);
            if !seen.contains(&resolved) {
                seen.push(resolved);
                uploaded.push(name.clone());
            }
            replacements.insert(img.original_text.clone(), attachment_link(&name));
        }
        for (block, output) in rendered {
            let name = file_name(output);
            uploaded.push(name.clone());
            replacements.insert(block.original_text.clone(), attachment_link(&name));
        }

        // Exercise the rewrite exactly as a live run would.
        let rewritten = count_rewrites(doc, &replacements);
        let content = strip_pictographs(&doc.rewrite(&replacements));
        debug!(
            "dry-run content for {}: {} bytes, {} occurrence(s) rewritten",
            doc.path.display(),
            content.len(),
            rewritten
        );

        FileReport {
            path: doc.path.clone(),
            page_name,
            page_id: None,
            created: None,
            page_url: None,
            uploaded,
            rewritten,
            diagrams_rendered: rendered.len(),
            diagram_failures,
            warnings,
            dry_run: true,
        }
    }
}

/// Page name precedence: explicit argument, extracted title, file stem.
fn resolve_page_name(doc: &ParsedDocument, explicit: Option<&str>) -> String {
    if let Some(name) = explicit {
        return name.to_owned();
    }
    if let Some(title) = &doc.title {
        return title.clone();
    }
    doc.path
        .file_stem()
        .map_or_else(|| "untitled".to_owned(), |s| s.to_string_lossy().into_owned())
}

/// Occurrences that have a replacement mapping.
fn count_rewrites(doc: &ParsedDocument, replacements: &HashMap<String, String>) -> usize {
    doc.images
        .iter()
        .filter(|img| replacements.contains_key(&img.original_text))
        .count()
        + doc
            .diagrams
            .iter()
            .filter(|block| replacements.contains_key(&block.original_text))
            .count()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
}
