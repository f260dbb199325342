//! Tag extraction, categorisation and the flat summary table.
//!
//! A tag cell such as `"DT5:3, misc | DT7"` yields the tokens `DT5:3` and `DT7` (only tokens
//! containing [`TAG_MARKER`] are kept). The suffix after `:` is a category id resolved through
//! [`category_name`].

use std::collections::BTreeMap;

use crate::error::{DigestError, DigestResult};
use crate::types::{Table, Value};

/// Substring a token must contain to count as a tag.
pub const TAG_MARKER: &str = "DT";

/// Label used for ids outside the category table and for tokens without an id.
pub const UNKNOWN_CATEGORY: &str = "Unknown category";

/// Leading non-data columns (respondent id, timestamp) dropped before tag processing.
pub const LEADING_COLUMNS: usize = 2;

/// Column names appended to the detail block.
pub const TAG_COLUMN: &str = "Tag";
pub const CATEGORY_COLUMN: &str = "Category";

/// Column names of the summary block.
pub const SUMMARY_COLUMNS: [&str; 3] = ["Summary Category", "Summary Tag", "Summary Count"];

const CATEGORIES: [(i64, &str); 7] = [
    (1, "1 - Access request"),
    (2, "2 - Password reset"),
    (3, "3 - Email account block"),
    (4, "4 - Hardware issue"),
    (5, "5 - Software installation"),
    (6, "6 - Network connectivity"),
    (7, "7 - Other"),
];

/// Resolve a category id to its label.
pub fn category_name(id: i64) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(k, _)| *k == id)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_CATEGORY)
}

/// Split a multi-value cell on `,` or `|` and keep trimmed tokens containing the marker.
pub fn split_tags(cell: &Value) -> Vec<String> {
    match cell.as_str() {
        Some(s) => s
            .split([',', '|'])
            .map(str::trim)
            .filter(|t| !t.is_empty() && t.contains(TAG_MARKER))
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// A raw tag token split into its name and resolved category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub name: String,
    pub category_id: i64,
    pub category: &'static str,
}

/// Parse `"<name>:<id>"`. Tokens without `:` get id 0 and [`UNKNOWN_CATEGORY`].
///
/// A non-integer id is an error rather than a silent fallback.
pub fn parse_tag(token: &str) -> DigestResult<ParsedTag> {
    match token.split_once(':') {
        Some((name, raw_id)) => {
            let id = raw_id
                .trim()
                .parse::<i64>()
                .map_err(|_| DigestError::InvalidCategoryId {
                    token: token.to_string(),
                    raw_id: raw_id.to_string(),
                })?;
            Ok(ParsedTag {
                name: name.trim().to_string(),
                category_id: id,
                category: category_name(id),
            })
        }
        None => Ok(ParsedTag {
            name: token.trim().to_string(),
            category_id: 0,
            category: UNKNOWN_CATEGORY,
        }),
    }
}

/// One line of the printable summary block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSummaryRow {
    pub category: Value,
    pub tag: Value,
    pub count: Value,
}

impl TagSummaryRow {
    fn blank() -> Self {
        Self {
            category: Value::Null,
            tag: Value::Null,
            count: Value::Null,
        }
    }

    fn into_values(self) -> [Value; 3] {
        [self.category, self.tag, self.count]
    }
}

/// Everything the tag summary derives from one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSummary {
    /// Exploded detail rows with `Tag` and `Category` columns appended.
    pub detail: Table,
    /// Distinct raw tokens with their occurrence count, most frequent first.
    pub tag_counts: Vec<(String, usize)>,
    /// Aggregate count per category label.
    pub category_totals: BTreeMap<String, usize>,
    /// Sum of all tag occurrences.
    pub total: usize,
    /// The printable summary block.
    pub rows: Vec<TagSummaryRow>,
}

impl TagSummary {
    /// Detail and summary blocks side by side, padded with nulls to equal length.
    pub fn to_table(&self) -> Table {
        let mut columns = self.detail.columns.clone();
        columns.extend(SUMMARY_COLUMNS.iter().map(|c| c.to_string()));

        let detail_width = self.detail.columns.len();
        let height = self.detail.row_count().max(self.rows.len());
        let rows = (0..height)
            .map(|i| {
                let mut row = match self.detail.rows.get(i) {
                    Some(r) => r.clone(),
                    None => vec![Value::Null; detail_width],
                };
                let summary = self
                    .rows
                    .get(i)
                    .cloned()
                    .unwrap_or_else(TagSummaryRow::blank);
                row.extend(summary.into_values());
                row
            })
            .collect();

        Table::new(columns, rows)
    }
}

/// Run the tag summary over a raw export.
///
/// The first [`LEADING_COLUMNS`] columns are dropped, then `tag_column` is exploded, counted,
/// categorised and summarised.
pub fn summarize_tags(raw: &Table, tag_column: &str) -> DigestResult<TagSummary> {
    let table = raw.drop_leading_columns(LEADING_COLUMNS);
    let tag_idx = table
        .index_of(tag_column)
        .ok_or_else(|| DigestError::MissingColumn {
            column: tag_column.to_string(),
            headers: table.columns.clone(),
        })?;

    let detail = explode(&table, tag_idx)?;
    let tag_counts = count_tokens(&detail);

    // category -> tag name -> count
    let mut grouped: BTreeMap<String, Vec<(String, usize)>> = BTreeMap::new();
    for (token, count) in &tag_counts {
        let parsed = parse_tag(token)?;
        let tags = grouped.entry(parsed.category.to_string()).or_default();
        match tags.iter_mut().find(|(name, _)| *name == parsed.name) {
            Some((_, c)) => *c += count,
            None => tags.push((parsed.name, *count)),
        }
    }

    let mut rows = Vec::new();
    let mut category_totals: BTreeMap<String, usize> = BTreeMap::new();
    for (category, tags) in &grouped {
        rows.push(TagSummaryRow {
            category: Value::text(category.clone()),
            tag: Value::Null,
            count: Value::Null,
        });
        for (name, count) in tags {
            rows.push(TagSummaryRow {
                category: Value::Null,
                tag: Value::text(name.clone()),
                count: Value::Int64(*count as i64),
            });
        }
        rows.push(TagSummaryRow::blank());
        rows.push(TagSummaryRow::blank());
        category_totals.insert(category.clone(), tags.iter().map(|(_, c)| c).sum());
    }

    let total: usize = tag_counts.iter().map(|(_, c)| c).sum();
    rows.push(TagSummaryRow {
        category: Value::text("Total:"),
        tag: Value::Null,
        count: Value::Int64(total as i64),
    });
    rows.extend(std::iter::repeat_with(TagSummaryRow::blank).take(3));
    rows.push(TagSummaryRow {
        category: Value::text("Category"),
        tag: Value::Null,
        count: Value::text("Total count"),
    });
    for (category, count) in &category_totals {
        rows.push(TagSummaryRow {
            category: Value::text(category.clone()),
            tag: Value::Null,
            count: Value::Int64(*count as i64),
        });
    }

    Ok(TagSummary {
        detail,
        tag_counts,
        category_totals,
        total,
        rows,
    })
}

/// One output row per kept token; rows without tokens are kept once with null tag columns.
fn explode(table: &Table, tag_idx: usize) -> DigestResult<Table> {
    let mut columns = table.columns.clone();
    columns.push(TAG_COLUMN.to_string());
    columns.push(CATEGORY_COLUMN.to_string());

    let mut rows = Vec::new();
    for row in &table.rows {
        let tokens = split_tags(row.get(tag_idx).unwrap_or(&Value::Null));
        if tokens.is_empty() {
            let mut out = row.clone();
            out.extend([Value::Null, Value::Null]);
            rows.push(out);
            continue;
        }
        for token in tokens {
            let category = parse_tag(&token)?.category;
            let mut out = row.clone();
            out.extend([Value::Utf8(token), Value::text(category)]);
            rows.push(out);
        }
    }

    Ok(Table::new(columns, rows))
}

fn count_tokens(detail: &Table) -> Vec<(String, usize)> {
    let tag_idx = detail.columns.len() - 2;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in detail.column_values(tag_idx) {
        if let Some(token) = value.as_str() {
            *counts.entry(token).or_default() += 1;
        }
    }

    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(token, count)| (token.to_string(), count))
        .collect();
    // Stable sort keeps the token-ascending order from the map within equal counts.
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

#[cfg(test)]
mod tests {
    use super::{
        category_name, parse_tag, split_tags, summarize_tags, TagSummaryRow, UNKNOWN_CATEGORY,
    };
    use crate::error::DigestError;
    use crate::types::{Table, Value};

    fn export(tags: &[Option<&str>]) -> Table {
        let columns = ["Respondent number", "Timestamp", "Comment", "Tags"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let rows = tags
            .iter()
            .enumerate()
            .map(|(i, t)| {
                vec![
                    Value::text(i.to_string()),
                    Value::text("2024-05-01"),
                    Value::text(format!("comment {i}")),
                    t.map(Value::text).unwrap_or(Value::Null),
                ]
            })
            .collect();
        Table::new(columns, rows)
    }

    #[test]
    fn parse_tag_examples() {
        let t = parse_tag("DT5:3").unwrap();
        assert_eq!(t.name, "DT5");
        assert_eq!(t.category, "3 - Email account block");

        let t = parse_tag("DTx").unwrap();
        assert_eq!(t.name, "DTx");
        assert_eq!(t.category_id, 0);
        assert_eq!(t.category, UNKNOWN_CATEGORY);

        assert_eq!(parse_tag("DT1:99").unwrap().category, UNKNOWN_CATEGORY);
        assert_eq!(category_name(0), UNKNOWN_CATEGORY);
    }

    #[test]
    fn malformed_category_id_is_an_error() {
        let err = parse_tag("DT5:abc").unwrap_err();
        assert!(matches!(err, DigestError::InvalidCategoryId { ref raw_id, .. } if raw_id == "abc"));

        let err = summarize_tags(&export(&[Some("DT5:abc")]), "Tags").unwrap_err();
        assert!(matches!(err, DigestError::InvalidCategoryId { .. }));
    }

    #[test]
    fn split_keeps_marked_tokens_only() {
        assert_eq!(
            split_tags(&Value::text("DT1:2, misc |DT3 ,, | DT4:1")),
            vec!["DT1:2", "DT3", "DT4:1"]
        );
        assert!(split_tags(&Value::Null).is_empty());
        assert!(split_tags(&Value::text("nothing here")).is_empty());
    }

    #[test]
    fn explodes_and_aggregates() {
        let raw = export(&[Some("DT1:3, DT2:3"), Some("DT1:3|DTx"), None, Some("other")]);
        let summary = summarize_tags(&raw, "Tags").unwrap();

        assert_eq!(
            summary.detail.columns,
            vec!["Comment", "Tags", "Tag", "Category"]
        );
        // 2 + 2 exploded rows, plus one row each for the untagged inputs.
        assert_eq!(summary.detail.row_count(), 6);
        assert_eq!(summary.detail.rows[0][2], Value::text("DT1:3"));
        assert_eq!(summary.detail.rows[0][3], Value::text("3 - Email account block"));
        assert_eq!(summary.detail.rows[4][2], Value::Null);

        assert_eq!(
            summary.tag_counts,
            vec![
                ("DT1:3".to_string(), 2),
                ("DT2:3".to_string(), 1),
                ("DTx".to_string(), 1)
            ]
        );
        assert_eq!(summary.total, 4);
        assert_eq!(summary.category_totals["3 - Email account block"], 3);
        assert_eq!(summary.category_totals[UNKNOWN_CATEGORY], 1);
        assert_eq!(summary.category_totals.values().sum::<usize>(), summary.total);
    }

    #[test]
    fn summary_block_layout() {
        let raw = export(&[Some("DT1:3, DT2:3"), Some("DTx")]);
        let summary = summarize_tags(&raw, "Tags").unwrap();
        let row = |c: Option<&str>, t: Option<&str>, n: Option<i64>| TagSummaryRow {
            category: c.map(Value::text).unwrap_or(Value::Null),
            tag: t.map(Value::text).unwrap_or(Value::Null),
            count: n.map(Value::Int64).unwrap_or(Value::Null),
        };
        let blank = row(None, None, None);

        let mut expected = vec![
            row(Some("3 - Email account block"), None, None),
            row(None, Some("DT1"), Some(1)),
            row(None, Some("DT2"), Some(1)),
            blank.clone(),
            blank.clone(),
            row(Some(UNKNOWN_CATEGORY), None, None),
            row(None, Some("DTx"), Some(1)),
            blank.clone(),
            blank.clone(),
            row(Some("Total:"), None, Some(3)),
            blank.clone(),
            blank.clone(),
            blank.clone(),
        ];
        expected.push(TagSummaryRow {
            category: Value::text("Category"),
            tag: Value::Null,
            count: Value::text("Total count"),
        });
        expected.push(row(Some("3 - Email account block"), None, Some(2)));
        expected.push(row(Some(UNKNOWN_CATEGORY), None, Some(1)));
        assert_eq!(summary.rows, expected);
    }

    #[test]
    fn combined_table_pads_shorter_block() {
        let raw = export(&[Some("DT1:1")]);
        let summary = summarize_tags(&raw, "Tags").unwrap();
        let table = summary.to_table();

        assert_eq!(table.columns.len(), 4 + 3);
        assert_eq!(table.row_count(), summary.rows.len());
        assert_eq!(table.rows[0][0], Value::text("comment 0"));
        assert_eq!(table.rows[0][4], Value::text("1 - Access request"));
        // Detail block has one row; the rest are padded.
        assert!(table.rows[1][..4].iter().all(Value::is_null));
        assert_eq!(table.rows[1][5], Value::text("DT1"));
    }

    #[test]
    fn rerunning_is_stable() {
        let raw = export(&[Some("DT1:2|DT9"), Some("DT1:2")]);
        let a = summarize_tags(&raw, "Tags").unwrap();
        let b = summarize_tags(&raw, "Tags").unwrap();
        assert_eq!(a.detail.row_count(), b.detail.row_count());
        assert_eq!(a.category_totals, b.category_totals);
    }

    #[test]
    fn missing_tag_column() {
        let err = summarize_tags(&export(&[Some("DT1")]), "Labels").unwrap_err();
        assert!(matches!(err, DigestError::MissingColumn { .. }));
    }
}
