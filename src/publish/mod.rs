//! Publishing transformed data.
//!
//! - [`docs`]: styled document → formatting requests, [`DocumentService`] seam and publisher
//! - [`google`]: Drive/Docs implementation of [`DocumentService`]
//! - [`spreadsheet`]: workbook export and channel upload

pub mod docs;
pub mod google;
pub mod spreadsheet;

pub use docs::{build_requests, DocRequest, DocumentPublisher, DocumentService, PublishedDocument};
pub use google::GoogleDocsClient;
pub use spreadsheet::{write_workbook, SpreadsheetPublisher, UploadReport};
