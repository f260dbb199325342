use std::path::PathBuf;

use survey_digest::ingestion::read_table;
use survey_digest::pipeline::{build_document, load_tables};
use survey_digest::processing::document::{transform_table, DocumentOptions, CHART_PLACEHOLDER};
use survey_digest::publish::build_requests;
use survey_digest::types::StyledElement;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(name)
}

#[test]
fn single_answer_column() {
    let table = read_table(fixture("feedback.csv")).unwrap();
    let doc = transform_table("feedback", &table, &DocumentOptions::anonymized(false));
    assert_eq!(
        doc.styled_elements(),
        vec![
            StyledElement::Heading("feedback".to_string()),
            StyledElement::SubHeading("Feedback".to_string()),
            StyledElement::BulletItem("Great!".to_string()),
        ]
    );
}

#[test]
fn named_outline_appends_signatures() {
    let (tables, skipped) = load_tables(&[fixture("workshop.csv")]);
    assert!(skipped.is_empty());
    let doc = build_document(&tables, &DocumentOptions::anonymized(false));
    let expected = format!(
        "# workshop\n\
         ## What did you like?\n\
         - The venue Ann\n\
         - \n\
         - Coffee, mostly Cy\n\
         ## Rate the sessions\n\
         - {p}\n\
         - {p}\n\
         - \n",
        p = CHART_PLACEHOLDER
    );
    assert_eq!(doc.to_outline(), expected);
}

#[test]
fn anonymous_outline_has_no_signatures_or_excluded_columns() {
    let (tables, _) = load_tables(&[fixture("workshop.csv")]);
    let doc = build_document(&tables, &DocumentOptions::anonymized(true));
    let outline = doc.to_outline();

    for hidden in ["Ann", "Cy", "ann@example.com", "Timestamp", "Respondent", "Email Address"] {
        assert!(!outline.contains(hidden), "{hidden} leaked into {outline}");
    }
    assert!(outline.contains("- The venue\n"));
    assert!(outline.contains("- Coffee, mostly\n"));
}

#[test]
fn grid_columns_never_render_raw_values() {
    let table = read_table(fixture("workshop.csv")).unwrap();
    let doc = transform_table("w", &table, &DocumentOptions::default());
    let bullets: Vec<_> = doc
        .styled_elements()
        .into_iter()
        .filter_map(|e| match e {
            StyledElement::BulletItem(t) => Some(t),
            _ => None,
        })
        .collect();
    for raw in ["5", "4", "3", "2"] {
        assert!(!bullets.iter().any(|b| b == raw));
    }
}

#[test]
fn unreadable_file_is_skipped_not_fatal() {
    let (tables, skipped) = load_tables(&[fixture("missing.csv"), fixture("feedback.csv")]);
    assert_eq!(tables.len(), 1);
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].name.ends_with("missing.csv"));
}

#[test]
fn requests_follow_insertion_order() {
    let (tables, _) = load_tables(&[fixture("feedback.csv"), fixture("workshop.csv")]);
    let doc = build_document(&tables, &DocumentOptions::default());
    let requests = serde_json::to_value(build_requests(&doc)).unwrap();

    let mut expected_index = 1;
    let mut inserts = 0;
    for req in requests.as_array().unwrap() {
        if let Some(insert) = req.get("insertText") {
            assert_eq!(insert["location"]["index"], expected_index);
            let text = insert["text"].as_str().unwrap();
            expected_index += text.encode_utf16().count();
            inserts += 1;
        }
    }
    assert_eq!(inserts, doc.elements().len());
    assert_eq!(expected_index, doc.end_index());
}
