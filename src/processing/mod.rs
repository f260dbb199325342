//! In-memory transformations of parsed exports.
//!
//! - [`document`]: table → styled paragraph document (headings, sub-headings, bullets)
//! - [`tags`]: table → exploded tag rows + per-category summary block
//!
//! ## Example: document outline
//!
//! ```rust
//! use survey_digest::processing::document::{transform_table, DocumentOptions};
//! use survey_digest::types::{Table, Value};
//!
//! let table = Table::new(
//!     vec!["Timestamp".to_string(), "Feedback".to_string()],
//!     vec![vec![Value::text("2024-01-01 10:00"), Value::text("Great!")]],
//! );
//! let doc = transform_table("survey", &table, &DocumentOptions::default());
//! assert_eq!(doc.to_outline(), "# survey\n## Feedback\n- Great!\n");
//! ```
//!
//! ## Example: tag summary
//!
//! ```rust
//! use survey_digest::processing::tags::summarize_tags;
//! use survey_digest::types::{Table, Value};
//!
//! let table = Table::new(
//!     vec!["id".into(), "ts".into(), "Tags".into()],
//!     vec![vec![Value::text("1"), Value::text("t"), Value::text("DT5:3, DTx")]],
//! );
//! let summary = summarize_tags(&table, "Tags").unwrap();
//! assert_eq!(summary.total, 2);
//! assert_eq!(summary.category_totals["3 - Email account block"], 1);
//! ```

pub mod document;
pub mod tags;

pub use document::{append_table, transform_table, DocumentOptions, StyledDocument};
pub use tags::{summarize_tags, TagSummary, TagSummaryRow};
