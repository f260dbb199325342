//! The fetch → parse → transform → publish → cleanup shell.
//!
//! Two alternate configurations share the shell: [`PipelineKind::Document`] renders every file
//! of a batch into one styled document (named and anonymous copies), while
//! [`PipelineKind::TagSummary`] turns each file into a tag summary workbook uploaded back to the
//! channel. Both run synchronously to completion before [`SurveyBot::handle_event`] returns.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::{Config, PipelineKind};
use crate::error::{DigestError, DigestResult};
use crate::ingestion::read_table;
use crate::processing::document::{append_table, DocumentOptions, StyledDocument};
use crate::processing::tags::summarize_tags;
use crate::publish::docs::{DocumentPublisher, DocumentService, PublishedDocument};
use crate::publish::google::GoogleDocsClient;
use crate::publish::spreadsheet::{SpreadsheetPublisher, UploadReport};
use crate::scratch::{CleanupReport, ScratchDir};
use crate::slack::events::{FileDescriptor, InboundEvent};
use crate::slack::fetch::AttachmentFetcher;
use crate::slack::upload::{ChannelUploader, SlackUploader};
use crate::types::{FilesData, Table};

pub use crate::types::SkippedFile;

/// What one inbound event produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub downloaded: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
    pub documents: Vec<PublishedDocument>,
    pub uploads: Vec<UploadReport>,
    pub cleanup: CleanupReport,
}

impl BatchReport {
    /// Status lines suitable for a channel reply.
    pub fn messages(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .documents
            .iter()
            .map(|d| format!("Document created: {} ({})", d.title, d.url))
            .collect();
        out.extend(self.uploads.iter().map(UploadReport::message));
        out.extend(
            self.skipped
                .iter()
                .map(|s| format!("Skipped {}: {}", s.name, s.reason)),
        );
        out
    }
}

/// Base name (no directory, no extension) used as a document heading.
pub fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse every file, skipping (and logging) the ones that fail.
pub fn load_tables(paths: &[PathBuf]) -> (Vec<(String, Table)>, Vec<SkippedFile>) {
    let mut tables = Vec::new();
    let mut skipped = Vec::new();
    for path in paths {
        match read_table(path) {
            Ok(table) => tables.push((file_title(path), table)),
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to parse table");
                skipped.push(SkippedFile::new(path.display().to_string(), &e));
            }
        }
    }
    (tables, skipped)
}

/// Render several tables into one document, one heading per table.
pub fn build_document(tables: &[(String, Table)], options: &DocumentOptions) -> StyledDocument {
    let mut doc = StyledDocument::new();
    for (title, table) in tables {
        append_table(&mut doc, title, table, options);
    }
    doc
}

/// Handles inbound events with explicitly injected collaborators.
pub struct SurveyBot<D, U> {
    fetcher: AttachmentFetcher,
    documents: Option<DocumentPublisher<D>>,
    spreadsheets: SpreadsheetPublisher<U>,
    pipeline: PipelineKind,
    tag_column: String,
    scratch_root: Option<PathBuf>,
}

impl SurveyBot<GoogleDocsClient, SlackUploader> {
    /// Build the production bot from configuration.
    ///
    /// The document service is only initialised for [`PipelineKind::Document`].
    pub fn from_config(config: &Config) -> DigestResult<Self> {
        let documents = match config.pipeline {
            PipelineKind::Document => {
                let folder = config.require_docs_folder()?;
                let client = GoogleDocsClient::from_service_account_file(&config.service_account_file)?;
                Some(DocumentPublisher::new(client, folder).with_share(config.docs_share_with.clone()))
            }
            PipelineKind::TagSummary => None,
        };
        Ok(Self {
            fetcher: AttachmentFetcher::new(config.bot_token.clone())?,
            documents,
            spreadsheets: SpreadsheetPublisher::new(SlackUploader::new(config.bot_token.clone())?),
            pipeline: config.pipeline,
            tag_column: config.tag_column.clone(),
            scratch_root: config.scratch_root.clone(),
        })
    }
}

impl<D: DocumentService, U: ChannelUploader> SurveyBot<D, U> {
    pub fn new(
        fetcher: AttachmentFetcher,
        documents: Option<DocumentPublisher<D>>,
        spreadsheets: SpreadsheetPublisher<U>,
        pipeline: PipelineKind,
    ) -> Self {
        Self {
            fetcher,
            documents,
            spreadsheets,
            pipeline,
            tag_column: crate::config::DEFAULT_TAG_COLUMN.to_string(),
            scratch_root: None,
        }
    }

    pub fn with_tag_column(mut self, column: impl Into<String>) -> Self {
        self.tag_column = column.into();
        self
    }

    pub fn with_scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch_root = root;
        self
    }

    /// Process every attachment of `event` with the configured pipeline.
    pub fn handle_event(&self, event: &InboundEvent) -> DigestResult<BatchReport> {
        event.validate()?;
        if !event.has_files() {
            info!(channel = %event.event.channel, "message without files ignored");
            return Ok(BatchReport::default());
        }

        let files_data = event.files_data();
        info!(
            channel = %files_data.channel_id,
            files = event.event.files.len(),
            pipeline = ?self.pipeline,
            "processing attachments"
        );
        match self.pipeline {
            PipelineKind::Document => self.run_document(&event.event.files),
            PipelineKind::TagSummary => self.run_tag_summary(&event.event.files, &files_data),
        }
    }

    fn run_document(&self, files: &[FileDescriptor]) -> DigestResult<BatchReport> {
        let publisher = self.documents.as_ref().ok_or_else(|| {
            DigestError::Config("document pipeline requires a document service".to_string())
        })?;

        let scratch = ScratchDir::new(self.scratch_root.as_deref())?;
        let (downloaded, skipped) = self.fetcher.fetch_all(files, scratch.path());
        let mut report = BatchReport {
            downloaded,
            skipped,
            ..Default::default()
        };

        let (tables, skipped) = load_tables(&report.downloaded);
        report.skipped.extend(skipped);

        let mut outcome = Ok(());
        if tables.is_empty() {
            warn!("no readable tables in batch; nothing to publish");
        } else {
            for anonymize in [false, true] {
                let doc = build_document(&tables, &DocumentOptions::anonymized(anonymize));
                match publisher.publish(&doc, anonymize) {
                    Ok(published) => report.documents.push(published),
                    Err(e) => {
                        outcome = Err(e);
                        break;
                    }
                }
            }
        }

        report.cleanup = scratch.clear();
        outcome.map(|()| report)
    }

    fn run_tag_summary(
        &self,
        files: &[FileDescriptor],
        files_data: &FilesData,
    ) -> DigestResult<BatchReport> {
        let mut report = BatchReport::default();
        for file in files {
            // Each file gets its own scratch dir so a post-upload purge cannot touch siblings.
            let scratch = match ScratchDir::new(self.scratch_root.as_deref()) {
                Ok(scratch) => scratch,
                Err(e) => {
                    error!(name = %file.name, error = %e, "failed to create scratch directory");
                    report.skipped.push(SkippedFile::new(file.name.clone(), &e));
                    continue;
                }
            };
            let (downloaded, skipped) = self
                .fetcher
                .fetch_all(std::slice::from_ref(file), scratch.path());
            report.skipped.extend(skipped);
            if let Some(path) = downloaded.first() {
                match read_table(path).and_then(|t| summarize_tags(&t, &self.tag_column)) {
                    Ok(summary) => {
                        info!(
                            path = %path.display(),
                            detail_rows = summary.detail.row_count(),
                            total = summary.total,
                            "tags summarized"
                        );
                        let upload = self.spreadsheets.publish(
                            &summary.to_table(),
                            files_data,
                            path,
                            &scratch,
                        );
                        report.cleanup.merge(upload.cleanup.clone());
                        report.uploads.push(upload);
                    }
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "tag summary failed");
                        report.skipped.push(SkippedFile::new(file.name.clone(), &e));
                    }
                }
            }
            report.downloaded.extend(downloaded);
            report.cleanup.merge(scratch.clear());
        }
        Ok(report)
    }
}
