use thiserror::Error;

/// Convenience result type used across the crate.
pub type DigestResult<T> = Result<T, DigestError>;

/// Error type returned by parsing, transformation and publishing.
///
/// A single enum is shared across every pipeline stage so callers can decide per variant whether
/// a failure skips one file or aborts the batch.
#[derive(Debug, Error)]
pub enum DigestError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The delimited file could not be read or is malformed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// An attachment download returned a non-200 status.
    #[error("failed to download '{url}': HTTP {status}")]
    Fetch { url: String, status: u16 },

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet writer failure.
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// A column required by a transformation is absent from the table.
    #[error("missing required column '{column}'. headers={headers:?}")]
    MissingColumn { column: String, headers: Vec<String> },

    /// A tag token carried a category suffix that is not an integer.
    #[error("invalid category id '{raw_id}' in tag '{token}'")]
    InvalidCategoryId { token: String, raw_id: String },

    /// The remote document service or channel upload rejected a request.
    #[error("{service} publish failed: {message}")]
    Publish { service: String, message: String },

    /// Credential loading or token exchange failed.
    #[error("auth error: {0}")]
    Auth(String),

    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An inbound event payload did not match the expected shape.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

impl DigestError {
    pub(crate) fn publish(service: &str, message: impl Into<String>) -> Self {
        Self::Publish {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DigestError;

    #[test]
    fn display_includes_context() {
        let err = DigestError::Fetch {
            url: "https://files.example/a.csv".to_string(),
            status: 403,
        };
        assert_eq!(
            err.to_string(),
            "failed to download 'https://files.example/a.csv': HTTP 403"
        );

        let err = DigestError::InvalidCategoryId {
            token: "DT5:x".to_string(),
            raw_id: "x".to_string(),
        };
        assert_eq!(err.to_string(), "invalid category id 'x' in tag 'DT5:x'");

        let err = DigestError::publish("slack", "not_in_channel");
        assert_eq!(err.to_string(), "slack publish failed: not_in_channel");
    }
}
