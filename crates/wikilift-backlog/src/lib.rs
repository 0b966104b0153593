//! Backlog integration for Wikilift.
//!
//! Sync client for the Backlog API v2: wiki page CRUD, space attachment
//! upload, and wiki attachment association. Implements
//! [`wikilift_core::WikiClient`] so the upload orchestrator can drive
//! it directly.

mod client;
mod error;
mod types;

pub use client::BacklogClient;
pub use error::BacklogError;
pub use types::{Attachment, Project, Tag, WikiEntry, WikiPage};
