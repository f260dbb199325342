//! Core data model types.
//!
//! Delimited exports are loaded into a [`Table`] of [`Value`]s. The same shape is used for the
//! flat table produced by the tag summary, so both sides of the pipeline share one row model.

/// A single cell value in a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer (counts in summary tables).
    Int64(i64),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Build a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Utf8(s.into())
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string contents, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render the value the way it appears in a document body. Nulls render as `""`.
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int64(v) => v.to_string(),
            Self::Utf8(s) => s.clone(),
        }
    }
}

/// In-memory tabular data: named columns and row-major values.
///
/// Column names are kept exactly as they appear in the source header, including duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Ordered column names.
    pub columns: Vec<String>,
    /// Row-major value storage, each row as long as `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the index of the first column named `name`, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `(row, column)`; out-of-range cells read as [`Value::Null`].
    pub fn cell(&self, row: usize, column: usize) -> &Value {
        const NULL: &Value = &Value::Null;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(NULL)
    }

    /// Iterate the values of one column in row order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &Value> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, column))
    }

    /// Returns a copy of the table without its first `n` columns.
    pub fn drop_leading_columns(&self, n: usize) -> Self {
        let n = n.min(self.columns.len());
        Self {
            columns: self.columns[n..].to_vec(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().skip(n).cloned().collect())
                .collect(),
        }
    }
}

/// A column name split into its base name and optional bracketed sub-question.
///
/// `"Rate us [Speed]"` has base name `"Rate us"` and is bracketed; `"Feedback"` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnKey<'a> {
    raw: &'a str,
}

impl<'a> ColumnKey<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    /// The column name as it appears in the header.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Prefix before the first `[`, trimmed.
    pub fn base_name(&self) -> &'a str {
        self.raw.split('[').next().unwrap_or(self.raw).trim()
    }

    /// Whether the name carries a bracket pair (a grid/repeated sub-question).
    pub fn is_bracketed(&self) -> bool {
        self.raw.contains('[') && self.raw.contains(']')
    }
}

/// One paragraph of the generated document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyledElement {
    /// Centered top-level heading (one per source file).
    Heading(String),
    /// Secondary heading (one per processed column).
    SubHeading(String),
    /// Bulleted list item (one per row value).
    BulletItem(String),
}

impl StyledElement {
    /// Paragraph text without the trailing newline.
    pub fn text(&self) -> &str {
        match self {
            Self::Heading(s) | Self::SubHeading(s) | Self::BulletItem(s) => s.as_str(),
        }
    }
}

/// Per-event context carried through the pipeline to the publishers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesData {
    /// Channel the attachments were posted in; results are published back here.
    pub channel_id: String,
}

impl FilesData {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
        }
    }
}

/// A file that dropped out of a batch, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

impl SkippedFile {
    pub fn new(name: impl Into<String>, err: &crate::error::DigestError) -> Self {
        Self {
            name: name.into(),
            reason: err.to_string(),
        }
    }
}
