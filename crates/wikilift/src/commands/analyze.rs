//! `wikilift analyze` command implementation.

use std::path::PathBuf;

use clap::Args;

use wikilift_core::ParsedDocument;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the analyze command.
#[derive(Args)]
pub(crate) struct AnalyzeArgs {
    /// Markdown file to analyze.
    file: PathBuf,
}

impl AnalyzeArgs {
    /// Execute the analyze command: print the document's structural
    /// report as JSON. Purely local; no credentials required.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let doc = ParsedDocument::from_file(&self.file)?;
        let summary = doc.summary();
        output.data(&serde_json::to_string_pretty(&summary)?);
        Ok(())
    }
}
