//! Wiki page operations for the Backlog API.

use tracing::info;

use super::BacklogClient;
use crate::error::BacklogError;
use crate::types::{Project, WikiEntry, WikiPage};

impl BacklogClient {
    /// List wiki pages of a project.
    pub fn wiki_list(&self, project: &str) -> Result<Vec<WikiEntry>, BacklogError> {
        let url = format!("{}/wikis", self.api_url());

        let response = self
            .agent()
            .get(&url)
            .query("apiKey", self.api_key())
            .query("projectIdOrKey", project)
            .header("Accept", "application/json")
            .call()?;

        Self::read_json(response)
    }

    /// Get a wiki page by id.
    pub fn get_wiki(&self, wiki_id: u64) -> Result<WikiPage, BacklogError> {
        let url = format!("{}/wikis/{wiki_id}", self.api_url());

        let response = self
            .agent()
            .get(&url)
            .query("apiKey", self.api_key())
            .header("Accept", "application/json")
            .call()?;

        Self::read_json(response)
    }

    /// Find a wiki page by exact name.
    ///
    /// The list endpoint has no name filter; this is a linear match
    /// over the project's page list.
    pub fn find_wiki_by_name(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Option<WikiEntry>, BacklogError> {
        let pages = self.wiki_list(project)?;
        Ok(pages.into_iter().find(|page| page.name == name))
    }

    /// Create a wiki page.
    pub fn create_wiki(
        &self,
        project_id: u64,
        name: &str,
        content: &str,
        mail_notify: bool,
    ) -> Result<WikiPage, BacklogError> {
        let url = format!("{}/wikis", self.api_url());

        info!("creating wiki page '{name}' in project {project_id}");

        let response = self
            .agent()
            .post(&url)
            .query("apiKey", self.api_key())
            .header("Accept", "application/json")
            .send_form([
                ("projectId", project_id.to_string().as_str()),
                ("name", name),
                ("content", content),
                ("mailNotify", if mail_notify { "true" } else { "false" }),
            ])?;

        Self::read_json(response)
    }

    /// Replace the content of an existing wiki page.
    pub fn update_wiki(
        &self,
        wiki_id: u64,
        content: &str,
        mail_notify: bool,
    ) -> Result<WikiPage, BacklogError> {
        let url = format!("{}/wikis/{wiki_id}", self.api_url());

        info!("updating wiki page {wiki_id}");

        let response = self
            .agent()
            .patch(&url)
            .query("apiKey", self.api_key())
            .header("Accept", "application/json")
            .send_form([
                ("content", content),
                ("mailNotify", if mail_notify { "true" } else { "false" }),
            ])?;

        Self::read_json(response)
    }

    /// Get project metadata by key or numeric id.
    pub fn get_project(&self, project: &str) -> Result<Project, BacklogError> {
        let url = format!("{}/projects/{project}", self.api_url());

        let response = self
            .agent()
            .get(&url)
            .query("apiKey", self.api_key())
            .header("Accept", "application/json")
            .call()?;

        Self::read_json(response)
    }

}
