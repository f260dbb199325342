//! Workbook export of the tag summary and upload back to the channel.

use std::fmt;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, XlsxError};
use tracing::{error, info};

use crate::error::{DigestError, DigestResult};
use crate::scratch::{CleanupReport, ScratchDir};
use crate::slack::upload::{ChannelUploader, UploadedFile};
use crate::types::{FilesData, Table, Value};

/// Title given to uploaded workbooks.
pub const UPLOAD_TITLE: &str = "File Upload";

/// `<stem>_processed.xlsx` for a source file.
pub fn processed_file_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    format!("{stem}_processed.xlsx")
}

/// `<dir>/<stem>_processed.xlsx` for a source file.
pub fn processed_path(source: &Path) -> PathBuf {
    source.with_file_name(processed_file_name(source))
}

/// Worksheet coordinates for data row `row_idx` (the header occupies row 0) and column `col`.
fn cell_index(row_idx: usize, col: usize) -> DigestResult<(u32, u16)> {
    let row = row_idx
        .checked_add(1)
        .and_then(|r| u32::try_from(r).ok())
        .ok_or(DigestError::Xlsx(XlsxError::RowColumnLimitError))?;
    let col = u16::try_from(col).map_err(|_| DigestError::Xlsx(XlsxError::RowColumnLimitError))?;
    Ok((row, col))
}

/// Write `table` to a single-sheet workbook: headers in row 0, nulls left blank.
pub fn write_workbook(table: &Table, path: &Path) -> DigestResult<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, name) in table.columns.iter().enumerate() {
        let (_, col) = cell_index(0, col)?;
        sheet.write_string(0, col, name.as_str())?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            let (row_num, col) = cell_index(row_idx, col)?;
            match value {
                Value::Null => {}
                Value::Int64(v) => {
                    sheet.write_number(row_num, col, *v as f64)?;
                }
                Value::Utf8(s) => {
                    sheet.write_string(row_num, col, s.as_str())?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Which step of a spreadsheet publish failed.
#[derive(Debug)]
pub enum PublishFailure {
    /// The workbook could not be written locally.
    Write(DigestError),
    /// The channel rejected the upload.
    Upload(DigestError),
}

impl fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(e) => write!(f, "Error writing workbook: {e}"),
            Self::Upload(e) => write!(f, "Error uploading file: {e}"),
        }
    }
}

/// Result of one spreadsheet publish, as reported back to the channel.
#[derive(Debug)]
pub struct UploadReport {
    pub source: PathBuf,
    pub result: Result<UploadedFile, PublishFailure>,
    /// Purge of the scratch directory after a successful upload; empty otherwise.
    pub cleanup: CleanupReport,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Human-readable status line for the bot reply.
    pub fn message(&self) -> String {
        match &self.result {
            Ok(file) => format!("File uploaded successfully: {}", file.name),
            Err(failure) => failure.to_string(),
        }
    }
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Writes the combined table into a scratch directory and uploads it to the originating channel.
#[derive(Debug)]
pub struct SpreadsheetPublisher<U> {
    uploader: U,
}

impl<U: ChannelUploader> SpreadsheetPublisher<U> {
    pub fn new(uploader: U) -> Self {
        Self { uploader }
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Write `<stem>_processed.xlsx` into `scratch` and upload it. On a successful upload
    /// `scratch` is purged; nothing outside it is touched. Failures are returned in the report
    /// rather than raised.
    pub fn publish(
        &self,
        table: &Table,
        files_data: &FilesData,
        source: &Path,
        scratch: &ScratchDir,
    ) -> UploadReport {
        let out = scratch.path().join(processed_file_name(source));
        let result = write_workbook(table, &out)
            .map_err(PublishFailure::Write)
            .and_then(|()| {
                self.uploader
                    .upload_file(&files_data.channel_id, &out, UPLOAD_TITLE)
                    .map_err(PublishFailure::Upload)
            });

        let cleanup = match &result {
            Ok(file) => {
                info!(name = %file.name, channel = %files_data.channel_id, "workbook published");
                scratch.clear()
            }
            Err(failure) => {
                error!(source = %source.display(), error = %failure, "workbook publish failed");
                CleanupReport::default()
            }
        };
        UploadReport {
            source: source.to_path_buf(),
            result,
            cleanup,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{
        cell_index, processed_path, PublishFailure, SpreadsheetPublisher, UploadReport,
    };
    use crate::error::{DigestError, DigestResult};
    use crate::scratch::{CleanupReport, ScratchDir};
    use crate::slack::upload::{ChannelUploader, UploadedFile};
    use crate::types::{FilesData, Table, Value};

    #[derive(Default)]
    struct AcceptingUploader {
        seen: RefCell<Vec<PathBuf>>,
    }

    impl ChannelUploader for AcceptingUploader {
        fn upload_file(&self, _channel_id: &str, path: &Path, title: &str) -> DigestResult<UploadedFile> {
            self.seen.borrow_mut().push(path.to_path_buf());
            Ok(UploadedFile {
                id: "F1".to_string(),
                name: path.file_name().unwrap().to_string_lossy().into_owned(),
                title: title.to_string(),
            })
        }
    }

    fn small_table() -> Table {
        Table::new(
            vec!["Tag".to_string(), "Count".to_string()],
            vec![vec![Value::text("DT1:2"), Value::Int64(3)]],
        )
    }

    #[test]
    fn processed_path_uses_stem() {
        assert_eq!(
            processed_path(Path::new("/tmp/x/survey.csv")),
            PathBuf::from("/tmp/x/survey_processed.xlsx")
        );
        assert_eq!(
            processed_path(Path::new("export")),
            PathBuf::from("export_processed.xlsx")
        );
    }

    #[test]
    fn publish_purges_only_the_scratch_directory() {
        let user_dir = tempfile::tempdir().unwrap();
        let source = user_dir.path().join("tickets.csv");
        let neighbour = user_dir.path().join("unrelated_user_file.txt");
        fs::write(&source, "Tags\nDT1:2\n").unwrap();
        fs::write(&neighbour, "keep me").unwrap();

        let scratch = ScratchDir::new(None).unwrap();
        let publisher = SpreadsheetPublisher::new(AcceptingUploader::default());
        let report = publisher.publish(&small_table(), &FilesData::new("C1"), &source, &scratch);

        assert!(report.is_success());
        let uploaded = publisher.uploader().seen.borrow()[0].clone();
        assert_eq!(uploaded, scratch.path().join("tickets_processed.xlsx"));
        assert_eq!(report.cleanup.removed, vec![uploaded]);
        assert!(source.exists());
        assert!(neighbour.exists());
        assert!(!user_dir.path().join("tickets_processed.xlsx").exists());
    }

    #[test]
    fn write_failure_is_reported_as_write_error() {
        let scratch = ScratchDir::new(None).unwrap();
        // A directory where the workbook should go makes the save fail.
        fs::create_dir(scratch.path().join("tickets_processed.xlsx")).unwrap();

        let publisher = SpreadsheetPublisher::new(AcceptingUploader::default());
        let report = publisher.publish(
            &small_table(),
            &FilesData::new("C1"),
            Path::new("tickets.csv"),
            &scratch,
        );

        assert!(matches!(report.result, Err(PublishFailure::Write(_))));
        assert!(report.message().starts_with("Error writing workbook: "));
        assert!(publisher.uploader().seen.borrow().is_empty());
        assert_eq!(report.cleanup, CleanupReport::default());
    }

    #[test]
    fn out_of_range_coordinates_are_errors() {
        assert_eq!(cell_index(0, 0).unwrap(), (1, 0));
        assert!(matches!(cell_index(usize::MAX, 0), Err(DigestError::Xlsx(_))));
        assert!(matches!(
            cell_index(0, usize::from(u16::MAX) + 1),
            Err(DigestError::Xlsx(_))
        ));
    }

    #[test]
    fn report_messages() {
        let ok = UploadReport {
            source: PathBuf::from("a.csv"),
            result: Ok(UploadedFile {
                id: "F1".to_string(),
                name: "a_processed.xlsx".to_string(),
                title: "File Upload".to_string(),
            }),
            cleanup: CleanupReport::default(),
        };
        assert_eq!(ok.message(), "File uploaded successfully: a_processed.xlsx");

        let failed = UploadReport {
            source: PathBuf::from("a.csv"),
            result: Err(PublishFailure::Upload(DigestError::publish(
                "slack",
                "files.completeUploadExternal: not_in_channel",
            ))),
            cleanup: CleanupReport::default(),
        };
        assert!(!failed.is_success());
        assert_eq!(
            failed.to_string(),
            "Error uploading file: slack publish failed: files.completeUploadExternal: not_in_channel"
        );
    }
}
