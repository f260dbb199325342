//! Survey table → styled paragraph document.
//!
//! Each source file becomes a [`StyledElement::Heading`], each qualifying column a
//! [`StyledElement::SubHeading`] followed by one [`StyledElement::BulletItem`] per row.
//! Character ranges are assigned while elements are pushed so the publisher can style the
//! remote document without re-measuring anything.

use std::collections::HashSet;
use std::ops::Range;

use crate::types::{ColumnKey, StyledElement, Table, Value};

/// Columns that never appear in the generated document.
pub const DEFAULT_EXCLUDED_COLUMNS: &[&str] = &[
    "Respondent number",
    "Timestamp",
    "Email Address",
    "Respondent signature",
];

/// Column whose value is appended to each answer in the named document.
pub const SIGNATURE_COLUMN: &str = "Respondent signature";

/// Bullet text emitted for grid (bracketed) columns instead of their values.
pub const CHART_PLACEHOLDER: &str = "[Chart_Placeholder]";

/// Remote document indices start at 1 (index 0 is the body start marker).
pub const FIRST_INDEX: usize = 1;

/// Options controlling document generation.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    /// Column names skipped entirely.
    pub excluded_columns: Vec<String>,
    /// Column holding the respondent's signature.
    pub signature_column: String,
    /// When `true`, signatures are never appended.
    pub anonymize: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            excluded_columns: DEFAULT_EXCLUDED_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            signature_column: SIGNATURE_COLUMN.to_string(),
            anonymize: false,
        }
    }
}

impl DocumentOptions {
    /// Default options with the given anonymize flag.
    pub fn anonymized(anonymize: bool) -> Self {
        Self {
            anonymize,
            ..Self::default()
        }
    }

    fn is_excluded(&self, column: &str) -> bool {
        self.excluded_columns.iter().any(|c| c == column)
    }
}

/// An element together with the character range its paragraph occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedElement {
    pub element: StyledElement,
    /// Half-open range in UTF-16 code units, including the trailing newline.
    pub range: Range<usize>,
}

/// Ordered document model with precomputed offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledDocument {
    elements: Vec<PlacedElement>,
    /// One range per logical column, spanning all of its bullet paragraphs.
    bullet_ranges: Vec<Range<usize>>,
    next_index: usize,
    open_bullets: Option<Range<usize>>,
}

impl Default for StyledDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl StyledDocument {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            bullet_ranges: Vec::new(),
            next_index: FIRST_INDEX,
            open_bullets: None,
        }
    }

    /// Append one element, assigning it the next character range.
    pub fn push(&mut self, element: StyledElement) {
        let len = utf16_len(element.text()) + 1;
        let range = self.next_index..self.next_index + len;
        self.next_index = range.end;

        if matches!(element, StyledElement::BulletItem(_)) {
            match self.open_bullets.as_mut() {
                Some(open) => open.end = range.end,
                None => self.open_bullets = Some(range.clone()),
            }
        } else {
            self.close_bullets();
        }

        self.elements.push(PlacedElement { element, range });
    }

    /// Ends the current column's bullet run, if any.
    fn close_bullets(&mut self) {
        if let Some(open) = self.open_bullets.take() {
            self.bullet_ranges.push(open);
        }
    }

    /// Placed elements in document order.
    pub fn elements(&self) -> &[PlacedElement] {
        &self.elements
    }

    /// Bullet ranges, one per column that produced at least one bullet.
    pub fn bullet_ranges(&self) -> Vec<Range<usize>> {
        let mut out = self.bullet_ranges.clone();
        if let Some(open) = &self.open_bullets {
            out.push(open.clone());
        }
        out
    }

    /// Element sequence without offsets.
    pub fn styled_elements(&self) -> Vec<StyledElement> {
        self.elements.iter().map(|p| p.element.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Index one past the last inserted character.
    pub fn end_index(&self) -> usize {
        self.next_index
    }

    /// Plain-text outline (`#`, `##`, `-` prefixes) for logs and the offline CLI.
    pub fn to_outline(&self) -> String {
        let mut out = String::new();
        for placed in &self.elements {
            match &placed.element {
                StyledElement::Heading(t) => out.push_str(&format!("# {t}\n")),
                StyledElement::SubHeading(t) => out.push_str(&format!("## {t}\n")),
                StyledElement::BulletItem(t) => out.push_str(&format!("- {t}\n")),
            }
        }
        out
    }
}

/// Append the elements for one table to `doc`.
///
/// `title` is the source file's base name. Repetition tracking is scoped to this table.
pub fn append_table(doc: &mut StyledDocument, title: &str, table: &Table, options: &DocumentOptions) {
    doc.push(StyledElement::Heading(title.to_string()));

    let signature_idx = if options.anonymize {
        None
    } else {
        table.index_of(&options.signature_column)
    };

    let mut processed: HashSet<&str> = HashSet::new();
    for (col_idx, column) in table.columns.iter().enumerate() {
        if options.is_excluded(column) {
            continue;
        }
        let key = ColumnKey::new(column);
        if !processed.insert(key.base_name()) {
            continue;
        }

        doc.push(StyledElement::SubHeading(key.base_name().to_string()));

        for (row_idx, value) in table.column_values(col_idx).enumerate() {
            let text = match value {
                Value::Null => String::new(),
                _ if key.is_bracketed() => CHART_PLACEHOLDER.to_string(),
                _ => {
                    let signature = signature_idx
                        .map(|idx| table.cell(row_idx, idx))
                        .filter(|s| !s.is_null());
                    match signature {
                        Some(sig) => format!("{} {}", value.render(), sig.render()),
                        None => value.render(),
                    }
                }
            };
            doc.push(StyledElement::BulletItem(text));
        }
        doc.close_bullets();
    }
}

/// Build the element sequence for a single table.
pub fn transform_table(title: &str, table: &Table, options: &DocumentOptions) -> StyledDocument {
    let mut doc = StyledDocument::new();
    append_table(&mut doc, title, table, options);
    doc
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}
