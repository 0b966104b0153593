//! Core engine for Wikilift.
//!
//! Takes Markdown documents from disk to a Backlog wiki: structural
//! analysis, mermaid-to-image conversion, batch discovery, content
//! rewriting, and the sequential upload orchestrator.
//!
//! # Quick start
//!
//! ```ignore
//! use wikilift_core::{discover_files, DiscoverOptions, MermaidConverter,
//!     MmdcRenderer, NullProgress, RenderOptions, UploadOptions, Uploader};
//!
//! let files = discover_files(Path::new("docs"), &DiscoverOptions::default())?;
//! let converter = MermaidConverter::new(MmdcRenderer::new()?, RenderOptions::default());
//! let mut uploader = Uploader::new(&client, converter, UploadOptions { /* ... */ });
//! let batch = uploader.run(&files, &NullProgress);
//! println!("{}/{} succeeded", batch.succeeded(), batch.total());
//! ```
//!
//! # Architecture
//!
//! - [`ParsedDocument`]: Markdown analysis and verbatim-substring
//!   rewriting
//! - [`MermaidConverter`] / [`DiagramRenderer`]: external renderer
//!   behind a capability trait
//! - [`discover_files`]: deterministic batch discovery
//! - [`Uploader`]: per-file pipeline and batch bookkeeping
//! - [`WikiClient`]: seam to the remote service

pub mod discover;
pub mod document;
pub mod mermaid;
pub mod sanitize;
pub mod uploader;
pub mod wiki;

pub use discover::{DEFAULT_PATTERN, DiscoverError, DiscoverOptions, discover_files};
pub use document::{
    DiagramBlock, DocumentSummary, ImageKind, ImageReference, ImageSummary, ParsedDocument,
};
pub use mermaid::{
    ConvertError, DEFAULT_TIMEOUT, DiagramFormat, DiagramRenderer, MermaidConverter, MmdcRenderer,
    RenderFailure, RenderOptions,
};
pub use sanitize::strip_pictographs;
pub use uploader::{
    BatchItem, BatchResult, FileOutcome, FileReport, NullProgress, Progress, UploadError,
    UploadOptions, Uploader,
};
pub use wiki::{AttachmentRef, PageRef, WikiClient, WikiError};
