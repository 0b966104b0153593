//! Backlog attachment types.

use serde::Deserialize;

/// Uploaded attachment. Returned both by the space upload endpoint and
/// by the wiki attach endpoint (with a fresh id after attaching).
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Attachment id.
    pub id: u64,
    /// File name.
    pub name: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}
