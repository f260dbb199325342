use std::path::PathBuf;

use calamine::{open_workbook_auto, Data, Reader};

use survey_digest::ingestion::read_table;
use survey_digest::processing::tags::{summarize_tags, UNKNOWN_CATEGORY};
use survey_digest::publish::spreadsheet::write_workbook;
use survey_digest::types::Value;
use survey_digest::DigestError;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(name)
}

#[test]
fn tickets_summary_totals() {
    let table = read_table(fixture("tickets.csv")).unwrap();
    let summary = summarize_tags(&table, "Tags").unwrap();

    assert_eq!(summary.detail.columns, vec!["Summary", "Tags", "Tag", "Category"]);
    // 2 + 2 + 1 exploded rows, plus the untagged "Printer jam" and "misc" rows.
    assert_eq!(summary.detail.row_count(), 7);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.category_totals["2 - Password reset"], 2);
    assert_eq!(summary.category_totals["3 - Email account block"], 2);
    assert_eq!(summary.category_totals[UNKNOWN_CATEGORY], 1);
    assert_eq!(summary.category_totals.values().sum::<usize>(), summary.total);

    let combined = summary.to_table();
    assert_eq!(combined.row_count(), summary.rows.len().max(7));
    assert_eq!(combined.rows[12][4], Value::text("Total:"));
    assert_eq!(combined.rows[12][6], Value::Int64(5));
}

#[test]
fn malformed_category_id_propagates() {
    let table = read_table(fixture("bad_tags.csv")).unwrap();
    let err = summarize_tags(&table, "Tags").unwrap_err();
    match err {
        DigestError::InvalidCategoryId { token, raw_id } => {
            assert_eq!(token, "DT5:three");
            assert_eq!(raw_id, "three");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn workbook_round_trips_through_reader() {
    let table = read_table(fixture("tickets.csv")).unwrap();
    let summary = summarize_tags(&table, "Tags").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickets_processed.xlsx");
    write_workbook(&summary.to_table(), &path).unwrap();

    let mut wb = open_workbook_auto(&path).unwrap();
    let range = wb.worksheet_range("Sheet1").unwrap();

    let text = |r: u32, c: u32| match range.get_value((r, c)) {
        Some(Data::String(s)) => s.clone(),
        other => panic!("expected string at ({r},{c}), got {other:?}"),
    };
    assert_eq!(text(0, 0), "Summary");
    assert_eq!(text(0, 6), "Summary Count");
    assert_eq!(text(1, 2), "DT5:3");
    assert_eq!(text(1, 3), "3 - Email account block");
    assert_eq!(text(1, 4), "2 - Password reset");
    assert_eq!(text(13, 4), "Total:");
    assert_eq!(range.get_value((13, 6)), Some(&Data::Float(5.0)));
    // Header + 20 summary lines.
    assert_eq!(range.height(), 21);
}
