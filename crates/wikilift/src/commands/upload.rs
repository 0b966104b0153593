//! `wikilift upload` command implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;

use wikilift_backlog::BacklogClient;
use wikilift_config::{CredentialSources, PartialCredentials};
use wikilift_core::{
    BatchResult, DiagramFormat, DiscoverOptions, FileOutcome, FileReport, MermaidConverter,
    MmdcRenderer, Progress, RenderOptions, UploadOptions, Uploader, discover_files,
};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the upload command.
#[derive(Args)]
pub(crate) struct UploadArgs {
    /// Markdown file or directory to upload.
    path: PathBuf,

    /// Backlog project key (e.g. MYPROJECT).
    #[arg(short, long)]
    project: String,

    /// Wiki page name. Honored for single-file batches only; defaults
    /// to the H1 title or the file name.
    #[arg(short = 'n', long = "name")]
    page_name: Option<String>,

    /// Backlog space id (overrides BACKLOG_SPACE_ID and env files).
    #[arg(short, long)]
    space_id: Option<String>,

    /// Backlog API key (overrides BACKLOG_API_KEY and env files).
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Backlog domain (default: backlog.jp).
    #[arg(short, long)]
    domain: Option<String>,

    /// Path to a .env file with credentials.
    #[arg(short, long)]
    env_file: Option<PathBuf>,

    /// Run the full local pipeline without any network mutation.
    #[arg(long)]
    dry_run: bool,

    /// Glob pattern for directory discovery.
    #[arg(long, default_value = wikilift_core::DEFAULT_PATTERN)]
    pattern: String,

    /// Do not recurse into subdirectories.
    #[arg(long)]
    no_recursive: bool,

    /// Exclude files matching this pattern (repeatable).
    #[arg(long = "exclude", value_name = "PATTERN")]
    excludes: Vec<String>,

    /// Record per-file failures and continue with the rest of the
    /// batch.
    #[arg(long)]
    continue_on_error: bool,

    /// Rendered diagram format.
    #[arg(long, default_value = "png", value_parser = parse_format)]
    format: DiagramFormat,

    /// Renderer theme (default, dark, forest, neutral).
    #[arg(long, default_value = "default")]
    theme: String,

    /// Renderer background color.
    #[arg(long, default_value = "white")]
    background: String,

    /// Renderer timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Keep rendered diagrams in this directory instead of a temp dir.
    #[arg(long, value_name = "DIR")]
    keep_images: Option<PathBuf>,
}

fn parse_format(s: &str) -> Result<DiagramFormat, String> {
    DiagramFormat::parse(s).ok_or_else(|| format!("unknown format '{s}' (expected png or svg)"))
}

impl UploadArgs {
    /// Execute the upload command.
    ///
    /// # Errors
    ///
    /// Returns an error on configuration problems, a missing renderer,
    /// discovery failures, or a batch with failed files.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let credentials = CredentialSources {
            overrides: PartialCredentials {
                space_id: self.space_id.clone(),
                api_key: self.api_key.clone(),
                domain: self.domain.clone(),
            },
            env_file: self.env_file.clone(),
        }
        .resolve()?;

        let files = discover_files(
            &self.path,
            &DiscoverOptions {
                pattern: self.pattern.clone(),
                recursive: !self.no_recursive,
                excludes: self.excludes.clone(),
            },
        )?;
        if files.is_empty() {
            output.warning("No files matched; nothing to do.");
            return Ok(());
        }

        let renderer = MmdcRenderer::new()?;
        let render_options = RenderOptions {
            format: self.format,
            theme: self.theme.clone(),
            background: self.background.clone(),
            timeout: Duration::from_secs(self.timeout),
        };
        let converter = match &self.keep_images {
            Some(dir) => MermaidConverter::with_output_dir(renderer, render_options, dir.clone()),
            None => MermaidConverter::new(renderer, render_options),
        };

        let client = BacklogClient::new(credentials);

        output.separator();
        output.highlight(&format!(
            "Uploading {} file(s) to project {}",
            files.len(),
            self.project
        ));
        if self.dry_run {
            output.highlight("[DRY RUN] No changes will be made.");
        }
        output.separator();

        let options = UploadOptions {
            project: self.project.clone(),
            page_name: self.page_name.clone(),
            dry_run: self.dry_run,
            continue_on_error: self.continue_on_error,
        };
        let mut uploader = Uploader::new(&client, converter, options);
        let batch = uploader.run(&files, &ConsoleProgress { output });

        print_batch_summary(output, &batch);

        if batch.is_success() {
            Ok(())
        } else {
            Err(CliError::Batch(batch.failed()))
        }
    }
}

/// Live per-file progress with the original's ✓/✗ markers.
struct ConsoleProgress<'a> {
    output: &'a Output,
}

impl Progress for ConsoleProgress<'_> {
    fn file_started(&self, index: usize, total: usize, path: &Path) {
        self.output
            .info(&format!("[{}/{total}] {}", index + 1, path.display()));
    }

    fn file_finished(&self, _index: usize, _total: usize, _path: &Path, succeeded: bool) {
        if succeeded {
            self.output.success("  ✓ done");
        } else {
            self.output.error("  ✗ failed");
        }
    }

    fn warning(&self, message: &str) {
        self.output.warning(&format!("Warning: {message}"));
    }
}

fn print_batch_summary(output: &Output, batch: &BatchResult) {
    output.separator();

    for item in &batch.items {
        match &item.outcome {
            FileOutcome::Succeeded(report) => print_file_report(output, report),
            FileOutcome::Failed(reason) => {
                output.error(&format!("✗ {}: {reason}", item.path.display()));
            }
            FileOutcome::Skipped(reason) => {
                output.warning(&format!("- {}: {reason}", item.path.display()));
            }
            FileOutcome::Pending => {}
        }
    }

    output.separator();
    let totals = format!(
        "{} succeeded, {} failed, {} skipped (of {})",
        batch.succeeded(),
        batch.failed(),
        batch.skipped(),
        batch.total()
    );
    if batch.is_success() {
        output.success(&totals);
    } else {
        output.warning(&totals);
    }
}

fn print_file_report(output: &Output, report: &FileReport) {
    let action = match report.created {
        Some(true) => "created",
        Some(false) => "updated",
        None => "planned",
    };
    output.success(&format!(
        "✓ {} -> \"{}\" ({action}, {} attachment(s), {} reference(s) rewritten)",
        report.path.display(),
        report.page_name,
        report.uploaded.len(),
        report.rewritten
    ));

    if let Some(url) = &report.page_url {
        output.info(&format!("    {url}"));
    }
    for failure in &report.diagram_failures {
        output.warning(&format!("    diagram failed: {failure}"));
    }
    for warning in &report.warnings {
        output.warning(&format!("    {warning}"));
    }
}
