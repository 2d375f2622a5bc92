//! Error records returned by schema loading and stage aggregation.
//!
//! Loading never aborts through `Result` at the public boundary: every
//! fallible operation hands back its (possibly partial) result together with
//! an ordered list of [`Error`] records, and the caller decides what counts
//! as failure.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A reader was handed an element of the wrong kind. Nothing was read.
    ElementIncorrectType,

    /// A required attribute was absent; the default was used.
    ElementMissing,

    /// An attribute was present but its value could not be used; the default
    /// was used.
    ElementInvalid,

    /// A document (the root or a reachable one) does not exist or cannot be read.
    DocumentNotFound,

    /// A document exists but could not be parsed.
    DocumentUnparsable,

    /// An operation that needs a successfully initialized aggregator ran first.
    NotInitialized,
}

impl ErrorCode {
    /// Whether the error aborted the operation (or the document) it was raised
    /// for. Missing and invalid attributes are recoverable.
    pub fn is_fatal(self) -> bool {
        !matches!(self, ErrorCode::ElementMissing | ErrorCode::ElementInvalid)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::ElementIncorrectType => "ELEMENT_INCORRECT_TYPE",
            ErrorCode::ElementMissing => "ELEMENT_MISSING",
            ErrorCode::ElementInvalid => "ELEMENT_INVALID",
            ErrorCode::DocumentNotFound => "DOCUMENT_NOT_FOUND",
            ErrorCode::DocumentUnparsable => "DOCUMENT_UNPARSABLE",
            ErrorCode::NotInitialized => "NOT_INITIALIZED",
        };
        f.write_str(name)
    }
}

/// A single validation or loading error.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }
}

/// Ordered list of errors produced by one call.
pub type Errors = Vec<Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::new(ErrorCode::ElementMissing, "Noise is missing the type attribute");
        let msg = format!("{err}");
        assert!(msg.contains("ELEMENT_MISSING"));
        assert!(msg.contains("type attribute"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ErrorCode::ElementIncorrectType.is_fatal());
        assert!(ErrorCode::DocumentNotFound.is_fatal());
        assert!(ErrorCode::DocumentUnparsable.is_fatal());
        assert!(!ErrorCode::ElementMissing.is_fatal());
        assert!(!ErrorCode::ElementInvalid.is_fatal());
    }
}
