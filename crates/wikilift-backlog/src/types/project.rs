//! Backlog project types.

use serde::Deserialize;

/// Project metadata; used to resolve a project key to its numeric id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub project_key: String,
    #[serde(default)]
    pub name: String,
}
