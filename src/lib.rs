//! `survey-digest` turns survey exports posted to a chat channel into readable output.
//!
//! Attachments are downloaded into a per-event scratch directory, parsed into an in-memory
//! [`types::Table`], transformed, published and finally purged. Two pipeline configurations
//! exist:
//!
//! - **Document**: every column becomes a sub-heading with one bullet per answer, rendered into
//!   a remote document (a named copy and an anonymous copy without respondent signatures).
//! - **Tag summary**: a multi-value tag column is exploded into one row per tag, tags are
//!   categorised and counted, and the detail rows plus a printable summary block are written to
//!   a workbook that is uploaded back to the channel.
//!
//! ## Parsing rules
//!
//! CSV exports must have a header row. Cells are trimmed; empty cells and common null markers
//! (`NA`, `N/A`, `NaN`, `null`, ...) become [`types::Value::Null`].
//!
//! ## Quick example: offline document outline
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use survey_digest::pipeline::{build_document, load_tables};
//! use survey_digest::processing::DocumentOptions;
//!
//! let (tables, skipped) = load_tables(&[PathBuf::from("survey.csv")]);
//! assert!(skipped.is_empty());
//! let doc = build_document(&tables, &DocumentOptions::anonymized(true));
//! print!("{}", doc.to_outline());
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: delimited file → [`types::Table`]
//! - [`processing`]: document and tag summary transformations
//! - [`publish`]: document service requests, Google client, workbook export/upload
//! - [`slack`]: inbound events, attachment download, channel upload
//! - [`scratch`]: per-invocation scratch directories and best-effort cleanup
//! - [`pipeline`]: the end-to-end shell driven by [`pipeline::SurveyBot`]
//! - [`config`], [`logging`], [`error`]: ambient setup

pub mod config;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod pipeline;
pub mod processing;
pub mod publish;
pub mod scratch;
pub mod slack;
pub mod types;

pub use config::{Config, PipelineKind};
pub use error::{DigestError, DigestResult};
pub use pipeline::{BatchReport, SurveyBot};
