//! Process configuration.
//!
//! Loaded once at startup from the environment (after reading an optional `.env` file) and
//! passed explicitly to the components that need credentials.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{DigestError, DigestResult};

pub const DEFAULT_SERVICE_ACCOUNT_FILE: &str = "data/service-account.json";
pub const DEFAULT_TAG_COLUMN: &str = "Tags";

/// Which transform/publish pair handles inbound attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineKind {
    /// Styled document in the document service (named + anonymous copies).
    #[default]
    Document,
    /// Tag summary workbook uploaded back to the channel.
    TagSummary,
}

impl FromStr for PipelineKind {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "doc" | "docs" => Ok(Self::Document),
            "tag-summary" | "tags" | "spreadsheet" => Ok(Self::TagSummary),
            other => Err(DigestError::Config(format!(
                "unknown pipeline '{other}' (expected 'document' or 'tag-summary')"
            ))),
        }
    }
}

/// Runtime configuration.
#[derive(Clone)]
pub struct Config {
    /// Bot OAuth token (xoxb-...), used for downloads and uploads.
    pub bot_token: String,
    /// Request signing secret, carried for the event host.
    pub signing_secret: String,
    /// Service account JSON used for the document service.
    pub service_account_file: PathBuf,
    /// Parent folder for generated documents.
    pub docs_folder_id: Option<String>,
    /// Email granted writer access to each generated document.
    pub docs_share_with: Option<String>,
    /// Multi-value tag column for the tag summary.
    pub tag_column: String,
    pub pipeline: PipelineKind,
    /// Parent directory for per-invocation scratch directories.
    pub scratch_root: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("service_account_file", &self.service_account_file)
            .field("docs_folder_id", &self.docs_folder_id)
            .field("docs_share_with", &self.docs_share_with)
            .field("tag_column", &self.tag_column)
            .field("pipeline", &self.pipeline)
            .field("scratch_root", &self.scratch_root)
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment.
    ///
    /// Required variables:
    /// - `SLACK_BOT_TOKEN`
    /// - `SLACK_SIGNING_SECRET`
    ///
    /// Optional variables:
    /// - `GOOGLE_SERVICE_ACCOUNT_FILE` (default [`DEFAULT_SERVICE_ACCOUNT_FILE`])
    /// - `DOCS_FOLDER_ID`, `DOCS_SHARE_WITH`
    /// - `SURVEY_TAG_COLUMN` (default [`DEFAULT_TAG_COLUMN`])
    /// - `SURVEY_PIPELINE` (`document` | `tag-summary`)
    /// - `SCRATCH_ROOT`
    pub fn from_env() -> DigestResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(error = %e, "failed to read .env"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> DigestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| DigestError::Config(format!("{key} not set")))
        };

        let bot_token = require("SLACK_BOT_TOKEN")?;
        if !bot_token.starts_with("xoxb-") {
            warn!("bot token doesn't start with 'xoxb-', this may be incorrect");
        }
        let signing_secret = require("SLACK_SIGNING_SECRET")?;

        let pipeline = match get("SURVEY_PIPELINE") {
            Some(v) => v.parse()?,
            None => PipelineKind::default(),
        };

        Ok(Self {
            bot_token,
            signing_secret,
            service_account_file: get("GOOGLE_SERVICE_ACCOUNT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVICE_ACCOUNT_FILE)),
            docs_folder_id: get("DOCS_FOLDER_ID"),
            docs_share_with: get("DOCS_SHARE_WITH"),
            tag_column: get("SURVEY_TAG_COLUMN").unwrap_or_else(|| DEFAULT_TAG_COLUMN.to_string()),
            pipeline,
            scratch_root: get("SCRATCH_ROOT").map(PathBuf::from),
        })
    }

    /// Folder id required by the document pipeline.
    pub fn require_docs_folder(&self) -> DigestResult<&str> {
        self.docs_folder_id
            .as_deref()
            .ok_or_else(|| DigestError::Config("DOCS_FOLDER_ID not set".to_string()))
    }
}
