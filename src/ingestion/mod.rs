//! Tabular parsing of downloaded attachments.
//!
//! Most callers should use [`read_table`], which picks the reader from the file extension.
//! Exports without an extension (or with `.txt`/`.tsv`) are read as CSV as well, matching how
//! chat platforms often strip or rename attachment extensions.

pub mod csv;

use std::path::Path;

use tracing::debug;

use crate::error::DigestResult;
use crate::types::Table;

/// Load a delimited export into a [`Table`].
pub fn read_table(path: impl AsRef<Path>) -> DigestResult<Table> {
    let path = path.as_ref();
    let table = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => {
            let mut rdr = ::csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .delimiter(b'\t')
                .from_path(path)?;
            csv::read_csv_from_reader(&mut rdr)?
        }
        _ => csv::read_csv_from_path(path)?,
    };
    debug!(
        path = %path.display(),
        columns = table.columns.len(),
        rows = table.row_count(),
        "table loaded"
    );
    Ok(table)
}
