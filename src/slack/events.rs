//! Inbound message events.
//!
//! Only the parts of the payload the pipeline reads are modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::error::{DigestError, DigestResult};
use crate::types::FilesData;

/// An attachment as described by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Platform file type (e.g. `csv`).
    #[serde(default)]
    pub filetype: String,
    /// Authenticated download URL.
    pub url_private: String,
    /// Original file name.
    pub name: String,
}

/// The `event` object of a message callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Channel the message was posted in.
    pub channel: String,
    /// Attached files; absent on plain text messages.
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

/// Envelope delivered to the bot: `{ "event": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub event: MessageEvent,
}

impl InboundEvent {
    /// Parse and validate a raw callback body.
    pub fn from_json(body: &str) -> DigestResult<Self> {
        let event: Self =
            serde_json::from_str(body).map_err(|e| DigestError::InvalidEvent(e.to_string()))?;
        event.validate()?;
        Ok(event)
    }

    /// Reject payloads the pipeline cannot act on.
    pub fn validate(&self) -> DigestResult<()> {
        if self.event.channel.trim().is_empty() {
            return Err(DigestError::InvalidEvent("empty channel id".to_string()));
        }
        for file in &self.event.files {
            if file.url_private.trim().is_empty() {
                return Err(DigestError::InvalidEvent(format!(
                    "file '{}' has no download url",
                    file.name
                )));
            }
            if file.name.trim().is_empty() {
                return Err(DigestError::InvalidEvent("file without a name".to_string()));
            }
        }
        Ok(())
    }

    pub fn has_files(&self) -> bool {
        !self.event.files.is_empty()
    }

    /// Context handed to the publishers.
    pub fn files_data(&self) -> FilesData {
        FilesData::new(self.event.channel.clone())
    }
}
