//! Authenticated download of message attachments.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use tracing::{error, info};

use crate::error::{DigestError, DigestResult};
use crate::types::SkippedFile;

use super::events::FileDescriptor;

/// Downloads attachments with the bot token.
#[derive(Debug, Clone)]
pub struct AttachmentFetcher {
    client: Client,
    token: String,
}

impl AttachmentFetcher {
    pub fn new(token: impl Into<String>) -> DigestResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self::with_client(client, token))
    }

    pub fn with_client(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    /// Download one attachment into `dir`, returning the written path.
    ///
    /// Non-200 responses fail with [`DigestError::Fetch`] and nothing is written.
    pub fn fetch(&self, file: &FileDescriptor, dir: &Path) -> DigestResult<PathBuf> {
        info!(filetype = %file.filetype, name = %file.name, "received file");

        let mut resp = self
            .client
            .get(&file.url_private)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()?;
        if resp.status() != StatusCode::OK {
            return Err(DigestError::Fetch {
                url: file.url_private.clone(),
                status: resp.status().as_u16(),
            });
        }

        fs::create_dir_all(dir)?;
        let path = dir.join(local_file_name(&file.name));
        let mut out = BufWriter::new(File::create(&path)?);
        resp.copy_to(&mut out)?;
        out.flush()?;
        info!(path = %path.display(), "file downloaded");
        Ok(path)
    }

    /// Download every attachment into `dir`.
    ///
    /// Failures are logged and returned alongside the written paths; one bad attachment never
    /// stops the rest of the batch.
    pub fn fetch_all(
        &self,
        files: &[FileDescriptor],
        dir: &Path,
    ) -> (Vec<PathBuf>, Vec<SkippedFile>) {
        let mut written = Vec::new();
        let mut skipped = Vec::new();
        for file in files {
            match self.fetch(file, dir) {
                Ok(path) => written.push(path),
                Err(e) => {
                    error!(url = %file.url_private, error = %e, "failed to download file");
                    skipped.push(SkippedFile::new(file.name.clone(), &e));
                }
            }
        }
        (written, skipped)
    }
}

/// Final path component of an attachment name, so names cannot escape the scratch directory.
pub fn local_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("attachment")
        .to_string()
}
