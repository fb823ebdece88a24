//! # DSN Error Taxonomy
//!
//! A single error enum shared by every layer of the poller. Transport and
//! document-level failures (`Network`, `Parse`, `InvalidUrl`) abort a whole
//! poll cycle, while record-level failures (`UnknownSpacecraft`,
//! `MalformedSignal`) only ever cost the offending signal.

use thiserror::Error;

/// Errors raised while fetching, parsing or interpreting the DSN feeds.
#[derive(Debug, Error)]
pub enum DsnError {
    /// Transport or connection failure, including non-2xx HTTP responses.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body is not well-formed XML or lacks the expected structure.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A live-data spacecraft code has no match in the configuration document.
    #[error("Unknown spacecraft code: {0}")]
    UnknownSpacecraft(String),

    /// A signal record carries a missing or non-numeric reading.
    #[error("Malformed signal: field '{field}' has value {value:?}")]
    MalformedSignal {
        /// The attribute that failed to parse (e.g. `power`).
        field: &'static str,
        /// The raw attribute value, `None` when the attribute was absent.
        value: Option<String>,
    },

    /// The configured base URL (or a path joined onto it) is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for DsnError {
    fn from(e: reqwest::Error) -> Self {
        DsnError::Network(e.to_string())
    }
}

impl From<reqwest_middleware::Error> for DsnError {
    fn from(e: reqwest_middleware::Error) -> Self {
        DsnError::Network(e.to_string())
    }
}

impl From<quick_xml::Error> for DsnError {
    fn from(e: quick_xml::Error) -> Self {
        DsnError::Parse(e.to_string())
    }
}
