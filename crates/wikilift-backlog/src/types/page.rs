//! Backlog wiki page types.

use serde::Deserialize;

/// Full wiki page as returned by get/create/update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiPage {
    /// Page id.
    pub id: u64,
    /// Owning project id.
    pub project_id: u64,
    /// Page name; `/` separators form a nested page path.
    pub name: String,
    /// Page content (Markdown).
    #[serde(default)]
    pub content: String,
    /// Page tags.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Wiki page tag.
#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
}

/// Entry of the wiki list endpoint (content omitted by the API).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiEntry {
    pub id: u64,
    pub name: String,
}
