//! Wiki service collaborator interface.
//!
//! The orchestrator drives the remote service through [`WikiClient`]
//! so the network client can be swapped for a fake in tests. Errors
//! are narrowed to the three classes the batch loop distinguishes.

use std::path::Path;

/// Wiki operation error as seen by the orchestrator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WikiError {
    /// Authentication or authorization failure. Fatal for a whole
    /// batch: further files would fail identically.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other request failure.
    #[error("request failed: {0}")]
    Request(String),
}

/// Reference to a remote wiki page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: u64,
    pub name: String,
}

/// Reference to an uploaded attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub id: u64,
    pub name: String,
}

/// CRUD surface of the wiki service consumed by the upload pipeline.
pub trait WikiClient {
    /// Resolve a project key to its numeric id.
    fn project_id(&self, project: &str) -> Result<u64, WikiError>;

    /// Find a page by exact name within a project.
    fn find_page(&self, project: &str, name: &str) -> Result<Option<PageRef>, WikiError>;

    /// Create a page. `name` may contain `/` separators; the service
    /// treats them as a nested page path.
    fn create_page(&self, project_id: u64, name: &str, content: &str)
    -> Result<PageRef, WikiError>;

    /// Replace the content of an existing page.
    fn update_page(&self, page_id: u64, content: &str) -> Result<PageRef, WikiError>;

    /// Upload a file as a space attachment.
    fn upload_attachment(&self, file: &Path) -> Result<AttachmentRef, WikiError>;

    /// Associate previously uploaded attachments with a page.
    fn attach_to_page(
        &self,
        page_id: u64,
        attachment_ids: &[u64],
    ) -> Result<Vec<AttachmentRef>, WikiError>;

    /// Web URL of a page, when the client can derive one.
    fn page_url(&self, _project: &str, _name: &str) -> Option<String> {
        None
    }
}
