//! Uploading generated files back to a channel.

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{DigestError, DigestResult};

pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Descriptor of a file accepted by the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
}

/// Channel attachment API.
pub trait ChannelUploader {
    /// Upload `path` to `channel_id` under `title`.
    fn upload_file(&self, channel_id: &str, path: &Path, title: &str) -> DigestResult<UploadedFile>;
}

/// Slack Web API uploader using the external upload flow.
#[derive(Debug, Clone)]
pub struct SlackUploader {
    client: Client,
    token: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompleteUploadResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    files: Vec<UploadedFile>,
}

impl SlackUploader {
    pub fn new(token: impl Into<String>) -> DigestResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            token: token.into(),
            api_base: SLACK_API_BASE.to_string(),
        })
    }

    /// Point the uploader at a different API root (used by tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    fn api_error(method: &str, error: Option<String>) -> DigestError {
        DigestError::publish(
            "slack",
            format!("{method}: {}", error.unwrap_or_else(|| "unknown_error".to_string())),
        )
    }
}

impl ChannelUploader for SlackUploader {
    fn upload_file(&self, channel_id: &str, path: &Path, title: &str) -> DigestResult<UploadedFile> {
        let bytes = fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.xlsx")
            .to_string();

        let length = bytes.len().to_string();
        let step1: UploadUrlResponse = self
            .client
            .post(self.api_url("files.getUploadURLExternal"))
            .bearer_auth(&self.token)
            .form(&[("filename", filename.as_str()), ("length", length.as_str())])
            .send()?
            .error_for_status()?
            .json()?;
        if !step1.ok {
            return Err(Self::api_error("files.getUploadURLExternal", step1.error));
        }
        let (upload_url, file_id) = match (step1.upload_url, step1.file_id) {
            (Some(url), Some(id)) => (url, id),
            _ => {
                return Err(DigestError::publish(
                    "slack",
                    "files.getUploadURLExternal: response missing upload_url/file_id",
                ));
            }
        };
        debug!(file_id = %file_id, "upload url acquired");

        let status = self.client.post(&upload_url).body(bytes).send()?.status();
        if !status.is_success() {
            return Err(DigestError::publish(
                "slack",
                format!("upload to {upload_url} returned HTTP {}", status.as_u16()),
            ));
        }

        let files = json!([{ "id": file_id, "title": title }]).to_string();
        let step3: CompleteUploadResponse = self
            .client
            .post(self.api_url("files.completeUploadExternal"))
            .bearer_auth(&self.token)
            .form(&[("files", files.as_str()), ("channel_id", channel_id)])
            .send()?
            .error_for_status()?
            .json()?;
        if !step3.ok {
            return Err(Self::api_error("files.completeUploadExternal", step3.error));
        }

        let uploaded = step3.files.into_iter().next().ok_or_else(|| {
            DigestError::publish("slack", "files.completeUploadExternal: no file in response")
        })?;
        info!(channel = %channel_id, name = %uploaded.name, "file uploaded");
        Ok(uploaded)
    }
}
