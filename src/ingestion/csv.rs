//! CSV ingestion implementation.

use std::path::Path;

use crate::error::{DigestError, DigestResult};
use crate::types::{Table, Value};

/// Cell contents treated as missing in addition to empty/whitespace-only cells.
pub const NULL_MARKERS: &[&str] = &["NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "#N/A"];

/// Read a CSV export into an in-memory [`Table`].
///
/// Rules:
///
/// - CSV must have a header row.
/// - Every cell is trimmed; empty cells and [`NULL_MARKERS`] become [`Value::Null`].
/// - Short rows are padded with nulls; extra trailing cells beyond the header are dropped.
pub fn read_csv_from_path(path: impl AsRef<Path>) -> DigestResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    read_csv_from_reader(&mut rdr)
}

/// Read CSV data from an existing CSV reader.
pub fn read_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> DigestResult<Table> {
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(DigestError::MissingColumn {
            column: "<header row>".to_string(),
            headers: Vec::new(),
        });
    }
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = (0..columns.len())
            .map(|idx| parse_cell(record.get(idx).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    Ok(Table::new(columns, rows))
}

fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NULL_MARKERS.contains(&trimmed) {
        Value::Null
    } else {
        Value::Utf8(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::read_csv_from_reader;
    use crate::types::Value;

    fn read(data: &str) -> crate::error::DigestResult<crate::types::Table> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());
        read_csv_from_reader(&mut rdr)
    }

    #[test]
    fn reads_headers_and_null_markers() {
        let t = read("Timestamp,Feedback,Score\n2024-01-01, Great! ,NA\n2024-01-02,,5\n").unwrap();
        assert_eq!(t.columns, vec!["Timestamp", "Feedback", "Score"]);
        assert_eq!(t.rows[0][1], Value::text("Great!"));
        assert_eq!(t.rows[0][2], Value::Null);
        assert_eq!(t.rows[1][1], Value::Null);
        assert_eq!(t.rows[1][2], Value::text("5"));
    }

    #[test]
    fn pads_short_rows() {
        let t = read("a,b,c\n1\n").unwrap();
        assert_eq!(t.rows, vec![vec![Value::text("1"), Value::Null, Value::Null]]);
    }

    #[test]
    fn keeps_quoted_delimiters() {
        let t = read("Tags\n\"DT1:2, DT3|DT4\"\n").unwrap();
        assert_eq!(t.rows[0][0], Value::text("DT1:2, DT3|DT4"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(read("").is_err());
    }
}
