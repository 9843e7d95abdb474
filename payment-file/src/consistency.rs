//! File-vs-consent consistency checks
//!
//! Rules, in order:
//!
//! 1. fingerprint of the raw upload equals the declared file hash (fail-fast:
//!    a tampered file makes the remaining comparisons meaningless)
//! 2. decoded transaction count equals the declared count
//! 3. decoded control sum equals the declared control sum, compared as
//!    decimals so `87.00` and `87` agree

use crate::decoded::DecodedFile;
use crate::hashing::compute_fingerprint;
use crate::types::DeclaredFileMetadata;
use crate::validation::{ValidationChain, ValidationResult, Validator};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Discrepancy between an uploaded file and its consent
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileValidationError {
    /// Upload fingerprint differs from the declared hash
    #[error("File hash '{actual}' does not match declared hash '{declared}'")]
    FileHashMismatch {
        /// Fingerprint of the uploaded bytes
        actual: String,
        /// Hash declared on the consent
        declared: String,
    },

    /// Number of decoded payments differs from the declared count
    #[error("File contains {actual} transactions but consent declares {declared}")]
    TransactionCountMismatch {
        /// Decoded payments
        actual: usize,
        /// Declared on the consent
        declared: usize,
    },

    /// Sum of decoded amounts differs from the declared control sum
    #[error("File control sum {actual} does not match declared control sum {declared}")]
    ControlSumMismatch {
        /// Sum of decoded amounts
        actual: Decimal,
        /// Declared on the consent
        declared: Decimal,
    },
}

impl FileValidationError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            FileValidationError::FileHashMismatch { .. } => "FILE_HASH_MISMATCH",
            FileValidationError::TransactionCountMismatch { .. } => "TRANSACTION_COUNT_MISMATCH",
            FileValidationError::ControlSumMismatch { .. } => "CONTROL_SUM_MISMATCH",
        }
    }
}

/// Inputs to the consistency rules
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyContext<'a> {
    /// Values declared on the consent
    pub declared: &'a DeclaredFileMetadata,
    /// Decoded upload
    pub file: &'a DecodedFile,
    /// Upload exactly as received
    pub raw_content: &'a [u8],
}

/// Validate a decoded upload against the metadata declared on its consent
pub fn validate(
    declared: &DeclaredFileMetadata,
    file: &DecodedFile,
    raw_content: &[u8],
) -> ValidationResult<FileValidationError> {
    let context = ConsistencyContext {
        declared,
        file,
        raw_content,
    };

    let result = rules().validate(&context);
    if !result.is_valid() {
        let codes: Vec<_> = result.errors().iter().map(FileValidationError::code).collect();
        tracing::warn!(
            file_type = %file.file_type(),
            errors = ?codes,
            "Payment file does not match consent"
        );
    }
    result
}

fn rules<'c>() -> ValidationChain<'static, ConsistencyContext<'c>, FileValidationError> {
    ValidationChain::new()
        .fail_fast("file-hash", check_file_hash)
        .accumulate("transaction-count", check_transaction_count)
        .accumulate("control-sum", check_control_sum)
}

fn check_file_hash(ctx: &ConsistencyContext<'_>) -> ValidationResult<FileValidationError> {
    let actual = compute_fingerprint(ctx.raw_content);
    let declared = &ctx.declared.file_hash;
    ValidationResult::check(&actual != declared, || {
        FileValidationError::FileHashMismatch {
            actual: actual.clone(),
            declared: declared.clone(),
        }
    })
}

fn check_transaction_count(ctx: &ConsistencyContext<'_>) -> ValidationResult<FileValidationError> {
    let actual = ctx.file.transaction_count();
    let declared = ctx.declared.transaction_count;
    ValidationResult::check(actual != declared, || {
        FileValidationError::TransactionCountMismatch { actual, declared }
    })
}

fn check_control_sum(ctx: &ConsistencyContext<'_>) -> ValidationResult<FileValidationError> {
    let actual = ctx.file.control_sum();
    let declared = ctx.declared.control_sum;
    // Decimal equality ignores scale
    ValidationResult::check(actual != declared, || {
        FileValidationError::ControlSumMismatch { actual, declared }
    })
}
