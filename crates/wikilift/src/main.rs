//! Wikilift CLI - upload Markdown documents to a Backlog wiki.
//!
//! Provides commands for:
//! - `upload`: Upload a file or a directory tree, rewriting local
//!   images and mermaid diagrams into wiki attachments
//! - `analyze`: Report a document's structure without network access

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AnalyzeArgs, UploadArgs};
use output::Output;

/// Wikilift - lift Markdown documentation into a Backlog wiki.
#[derive(Parser)]
#[command(name = "wikilift", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload Markdown files to the wiki.
    Upload(UploadArgs),
    /// Analyze a Markdown file without uploading.
    Analyze(AnalyzeArgs),
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let output = Output::new();

    let result = match cli.command {
        Commands::Upload(args) => args.execute(&output),
        Commands::Analyze(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
