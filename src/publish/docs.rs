//! Rendering a [`StyledDocument`] into document-service formatting requests.

use std::ops::Range;

use serde::Serialize;
use tracing::info;

use crate::error::DigestResult;
use crate::processing::document::StyledDocument;
use crate::types::StyledElement;

pub const TITLE: &str = "Processed Data";
pub const ANONYMOUS_TITLE: &str = "Processed Data (Anonymous)";
pub const BULLET_PRESET: &str = "BULLET_DISC_CIRCLE_SQUARE";

/// Title of the generated document.
pub fn document_title(anonymize: bool) -> &'static str {
    if anonymize { ANONYMOUS_TITLE } else { TITLE }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocRange {
    pub start_index: usize,
    pub end_index: usize,
}

impl From<&Range<usize>> for DocRange {
    fn from(r: &Range<usize>) -> Self {
        Self {
            start_index: r.start,
            end_index: r.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub named_style_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
}

/// One batch-update operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocRequest {
    #[serde(rename_all = "camelCase")]
    InsertText { location: Location, text: String },
    #[serde(rename_all = "camelCase")]
    UpdateParagraphStyle {
        range: DocRange,
        paragraph_style: ParagraphStyle,
        fields: String,
    },
    #[serde(rename_all = "camelCase")]
    CreateParagraphBullets { range: DocRange, bullet_preset: String },
}

/// Translate the document into an ordered request list.
///
/// Text is inserted in element order at the precomputed offsets; heading styles follow each
/// heading insert and bullet presets are applied after all text exists.
pub fn build_requests(doc: &StyledDocument) -> Vec<DocRequest> {
    let mut requests = Vec::with_capacity(doc.elements().len() * 2);

    for placed in doc.elements() {
        requests.push(DocRequest::InsertText {
            location: Location {
                index: placed.range.start,
            },
            text: format!("{}\n", placed.element.text()),
        });

        match &placed.element {
            StyledElement::Heading(_) => requests.push(DocRequest::UpdateParagraphStyle {
                range: (&placed.range).into(),
                paragraph_style: ParagraphStyle {
                    named_style_type: "HEADING_1".to_string(),
                    alignment: Some("CENTER".to_string()),
                },
                fields: "namedStyleType,alignment".to_string(),
            }),
            StyledElement::SubHeading(_) => requests.push(DocRequest::UpdateParagraphStyle {
                range: (&placed.range).into(),
                paragraph_style: ParagraphStyle {
                    named_style_type: "HEADING_3".to_string(),
                    alignment: None,
                },
                fields: "namedStyleType".to_string(),
            }),
            StyledElement::BulletItem(_) => {}
        }
    }

    for range in doc.bullet_ranges() {
        requests.push(DocRequest::CreateParagraphBullets {
            range: (&range).into(),
            bullet_preset: BULLET_PRESET.to_string(),
        });
    }

    requests
}

/// Remote document store (create + batch update).
pub trait DocumentService {
    /// Create an empty document in `folder_id`, returning its id.
    fn create_document(&self, title: &str, folder_id: &str) -> DigestResult<String>;

    /// Apply `requests` to the document in one batch.
    fn batch_update(&self, document_id: &str, requests: &[DocRequest]) -> DigestResult<()>;

    /// Grant `email` writer access to the document.
    fn share_document(&self, document_id: &str, email: &str) -> DigestResult<()>;
}

/// A created and formatted remote document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedDocument {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Creates one remote document per call and applies the formatting batch.
#[derive(Debug)]
pub struct DocumentPublisher<S> {
    service: S,
    folder_id: String,
    share_with: Option<String>,
}

impl<S: DocumentService> DocumentPublisher<S> {
    pub fn new(service: S, folder_id: impl Into<String>) -> Self {
        Self {
            service,
            folder_id: folder_id.into(),
            share_with: None,
        }
    }

    /// Grant writer access to `email` on every published document.
    pub fn with_share(mut self, email: Option<String>) -> Self {
        self.share_with = email;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Publish `doc`. Not idempotent: every call creates a new document.
    pub fn publish(&self, doc: &StyledDocument, anonymize: bool) -> DigestResult<PublishedDocument> {
        let title = document_title(anonymize);
        let id = self.service.create_document(title, &self.folder_id)?;

        let requests = build_requests(doc);
        if !requests.is_empty() {
            self.service.batch_update(&id, &requests)?;
        }
        if let Some(email) = &self.share_with {
            self.service.share_document(&id, email)?;
        }

        let url = format!("https://docs.google.com/document/d/{id}");
        info!(title, id = %id, url = %url, requests = requests.len(), "document created");
        Ok(PublishedDocument {
            id,
            title: title.to_string(),
            url,
        })
    }
}
