//! Backlog REST API client.
//!
//! Sync HTTP client for the Backlog API v2. Every request carries the
//! `apiKey` query parameter; the base URL is derived from the resolved
//! space id and domain.

mod attachments;
mod wikis;

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;

use wikilift_config::Credentials;
use wikilift_core::{AttachmentRef, PageRef, WikiClient, WikiError};

use crate::error::BacklogError;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Backlog API v2 client.
pub struct BacklogClient {
    agent: Agent,
    base_url: String,
    credentials: Credentials,
}

impl BacklogClient {
    /// Create a client for the space described by `credentials`.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        let base_url = format!("https://{}.{}", credentials.space_id, credentials.domain);
        Self {
            agent,
            base_url,
            credentials,
        }
    }

    /// Base URL of the space (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Web URL of a wiki page.
    #[must_use]
    pub fn wiki_url(&self, project: &str, name: &str) -> String {
        format!("{}/wiki/{project}/{name}", self.base_url)
    }

    pub(crate) fn agent(&self) -> &Agent {
        &self.agent
    }

    pub(crate) fn api_url(&self) -> String {
        format!("{}/api/v2", self.base_url)
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    /// Decode a response, classifying HTTP error statuses.
    pub(crate) fn read_json<T: DeserializeOwned>(
        response: ureq::http::Response<ureq::Body>,
    ) -> Result<T, BacklogError> {
        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(BacklogError::from_status(status, error_body));
        }

        Ok(body.read_json()?)
    }
}

impl WikiClient for BacklogClient {
    fn project_id(&self, project: &str) -> Result<u64, WikiError> {
        Ok(self.get_project(project)?.id)
    }

    fn find_page(&self, project: &str, name: &str) -> Result<Option<PageRef>, WikiError> {
        Ok(self.find_wiki_by_name(project, name)?.map(|entry| PageRef {
            id: entry.id,
            name: entry.name,
        }))
    }

    fn create_page(
        &self,
        project_id: u64,
        name: &str,
        content: &str,
    ) -> Result<PageRef, WikiError> {
        let page = self.create_wiki(project_id, name, content, false)?;
        Ok(PageRef {
            id: page.id,
            name: page.name,
        })
    }

    fn update_page(&self, page_id: u64, content: &str) -> Result<PageRef, WikiError> {
        let page = self.update_wiki(page_id, content, false)?;
        Ok(PageRef {
            id: page.id,
            name: page.name,
        })
    }

    fn upload_attachment(&self, file: &Path) -> Result<AttachmentRef, WikiError> {
        let attachment = BacklogClient::upload_attachment(self, file)?;
        Ok(AttachmentRef {
            id: attachment.id,
            name: attachment.name,
        })
    }

    fn attach_to_page(
        &self,
        page_id: u64,
        attachment_ids: &[u64],
    ) -> Result<Vec<AttachmentRef>, WikiError> {
        let attached = self.attach_to_wiki(page_id, attachment_ids)?;
        Ok(attached
            .into_iter()
            .map(|a| AttachmentRef {
                id: a.id,
                name: a.name,
            })
            .collect())
    }

    fn page_url(&self, project: &str, name: &str) -> Option<String> {
        Some(self.wiki_url(project, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> BacklogClient {
        BacklogClient::new(Credentials {
            space_id: "demo".to_owned(),
            api_key: "key".to_owned(),
            domain: "backlog.jp".to_owned(),
        })
    }

    #[test]
    fn test_base_url_from_credentials() {
        assert_eq!(client().base_url(), "https://demo.backlog.jp");
        assert_eq!(client().api_url(), "https://demo.backlog.jp/api/v2");
    }

    #[test]
    fn test_wiki_url() {
        assert_eq!(
            client().wiki_url("PROJ", "Guides/Install"),
            "https://demo.backlog.jp/wiki/PROJ/Guides/Install"
        );
    }
}
