//! Attachment operations for the Backlog API.
//!
//! Files are first uploaded to the space attachment pool, then
//! associated with a wiki page; the attach step assigns fresh ids.

use std::path::Path;

use rand::RngExt;
use tracing::info;

use super::BacklogClient;
use crate::error::BacklogError;
use crate::types::Attachment;

impl BacklogClient {
    /// Upload a file to the space attachment pool.
    pub fn upload_attachment(&self, file: &Path) -> Result<Attachment, BacklogError> {
        let data = std::fs::read(file)?;
        let filename = file
            .file_name()
            .map_or_else(|| "attachment".to_owned(), |n| n.to_string_lossy().into_owned());

        let url = format!("{}/space/attachment", self.api_url());
        info!("uploading attachment '{filename}' ({} bytes)", data.len());

        let boundary = format!(
            "----WikiliftFormBoundary{:016x}",
            rand::rng().random::<u64>()
        );
        let body = multipart_body(&boundary, &filename, content_type_for(file), &data);

        let response = self
            .agent()
            .post(&url)
            .query("apiKey", self.api_key())
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("Accept", "application/json")
            .send(&body[..])?;

        Self::read_json(response)
    }

    /// Associate uploaded attachments with a wiki page.
    ///
    /// Returns the attached files with their page-scoped ids.
    pub fn attach_to_wiki(
        &self,
        wiki_id: u64,
        attachment_ids: &[u64],
    ) -> Result<Vec<Attachment>, BacklogError> {
        let url = format!("{}/wikis/{wiki_id}/attachments", self.api_url());

        info!(
            "attaching {} file(s) to wiki page {wiki_id}",
            attachment_ids.len()
        );

        let form: Vec<(&str, String)> = attachment_ids
            .iter()
            .map(|id| ("attachmentId[]", id.to_string()))
            .collect();

        let response = self
            .agent()
            .post(&url)
            .query("apiKey", self.api_key())
            .header("Accept", "application/json")
            .send_form(form)?;

        Self::read_json(response)
    }
}

/// Build a `multipart/form-data` body with a single file part.
fn multipart_body(boundary: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 256);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    body
}

/// MIME type by file extension; Backlog only needs a hint.
fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_body("BOUND", "shot.png", "image/png", b"DATA");
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with("--BOUND\r\n"));
        assert!(text.contains("Content-Disposition: form-data; name=\"file\"; filename=\"shot.png\""));
        assert!(text.contains("Content-Type: image/png\r\n\r\nDATA\r\n"));
        assert!(text.ends_with("--BOUND--\r\n"));
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(content_type_for(Path::new("a.SVG")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a")), "application/octet-stream");
    }
}
