//! Error types for payment file ingestion
//!
//! These are decode-level failures: the uploaded file could not be turned into a
//! [`DecodedFile`](crate::DecodedFile) at all. Discrepancies between a decoded file
//! and its consent are not errors here; they are returned as data by the
//! [`consistency`](crate::consistency) validator.

use crate::types::FileType;
use thiserror::Error;

/// Result type for payment file operations
pub type Result<T> = std::result::Result<T, Error>;

/// Payment file engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Content does not parse as the declared format
    #[error("Malformed {file_type} file: {source}")]
    MalformedFile {
        /// Declared file type
        file_type: FileType,
        /// Underlying decoder diagnostic
        #[source]
        source: DecodeError,
    },

    /// No decoder registered for the declared type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Upload media type does not match the declared file type
    #[error("Content type '{actual}' does not match file type {file_type} (expected '{expected}')")]
    ContentTypeMismatch {
        /// Declared file type
        file_type: FileType,
        /// Media type the file type requires
        expected: &'static str,
        /// Media type supplied with the upload
        actual: String,
    },

    /// File exceeds the configured decode limit
    #[error("File of {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge {
        /// Uploaded size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// No declared file metadata for the consent
    #[error("Consent not found: {0}")]
    ConsentNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure was caused by the uploaded content or request
    /// (rendered to the caller as a client error)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedFile { .. }
                | Error::UnsupportedFileType(_)
                | Error::ContentTypeMismatch { .. }
                | Error::FileTooLarge { .. }
                | Error::ConsentNotFound(_)
        )
    }
}

/// Failure raised inside a format decoder
///
/// The registry wraps these into [`Error::MalformedFile`] so callers only ever
/// see one taxonomy.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Content is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// XML grammar or structure error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// JSON grammar or structure error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Amount is not a non-negative exact decimal
    #[error("invalid amount '{value}' at {path}")]
    InvalidAmount {
        /// Location of the amount in the document
        path: String,
        /// Raw amount text
        value: String,
    },

    /// Currency is not an ISO 4217 alphabetic code
    #[error("invalid currency '{value}' at {path}")]
    InvalidCurrency {
        /// Location of the currency in the document
        path: String,
        /// Raw currency text
        value: String,
    },

    /// Sum of instructed amounts exceeds the decimal range
    #[error("control sum overflow after {count} entries")]
    ControlSumOverflow {
        /// Entries summed before the overflow
        count: usize,
    },

    /// Exact sum of instructed amounts needs more digits than a decimal holds
    #[error("control sum loses precision after {count} entries")]
    ControlSumPrecision {
        /// Entries summed before the rounding addition
        count: usize,
    },

    /// Mandatory node missing or empty
    #[error("missing required field {0}")]
    MissingField(String),

    /// One entry of a payment list failed to decode
    #[error("entry {index}: {source}")]
    InvalidEntry {
        /// Zero-based position of the entry
        index: usize,
        /// Cause
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Attach an entry index to a per-entry failure
    pub fn at_entry(self, index: usize) -> Self {
        DecodeError::InvalidEntry {
            index,
            source: Box::new(self),
        }
    }
}
