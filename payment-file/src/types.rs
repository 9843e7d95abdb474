//! Core types for payment file ingestion

use crate::Error;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currency code (ISO 4217 alphabetic)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a three-letter upper-case code
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
            Some(Self(code.to_string()))
        } else {
            None
        }
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instructed amount and its currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructedAmount {
    /// Exact, non-negative amount
    pub amount: Decimal,

    /// Currency
    pub currency: CurrencyCode,
}

/// Payment status
///
/// Decoders only ever produce `Pending`; later stages own the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Decoded, awaiting initiation
    Pending,
}

/// One decoded payment instruction, independent of the wire format
///
/// Text fields are stored exactly as carried by the file, surrounding
/// whitespace included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalPayment {
    /// Instruction reference as carried by the file
    pub instruction_id: String,

    /// End-to-end reference
    pub end_to_end_id: String,

    /// Instructed amount
    pub instructed_amount: InstructedAmount,

    /// IBAN when present, otherwise the alternate scheme identifier
    pub creditor_account_identifier: String,

    /// Scheme of `creditor_account_identifier` (e.g. `IBAN`, `UK.OBIE.SortCodeAccountNumber`)
    pub creditor_account_scheme: String,

    /// First structured creditor reference, or empty
    pub remittance_reference: String,

    /// First unstructured remittance line, or empty
    pub remittance_unstructured: String,

    /// Decode time (not taken from the file)
    pub created_at: DateTime<Utc>,

    /// Status
    pub status: PaymentStatus,
}

/// Supported payment file types (Open Banking UK identifiers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// Faster Payments bulk file
    #[serde(rename = "UK.OBIE.FPS.001")]
    FasterPayments001,

    /// Payment initiation JSON, v3.0
    #[serde(rename = "UK.OBIE.PaymentInitiation.3.0")]
    PaymentInitiation30,

    /// Payment initiation JSON, v3.1
    #[serde(rename = "UK.OBIE.PaymentInitiation.3.1")]
    PaymentInitiation31,

    /// ISO 20022 customer credit transfer initiation
    #[serde(rename = "UK.OBIE.pain.001.001.08")]
    Pain001,
}

impl FileType {
    /// Every known file type
    pub const ALL: [FileType; 4] = [
        FileType::FasterPayments001,
        FileType::PaymentInitiation30,
        FileType::PaymentInitiation31,
        FileType::Pain001,
    ];

    /// Open Banking identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::FasterPayments001 => "UK.OBIE.FPS.001",
            FileType::PaymentInitiation30 => "UK.OBIE.PaymentInitiation.3.0",
            FileType::PaymentInitiation31 => "UK.OBIE.PaymentInitiation.3.1",
            FileType::Pain001 => "UK.OBIE.pain.001.001.08",
        }
    }

    /// Media type an upload of this type must carry
    pub fn content_type(&self) -> &'static str {
        match self {
            FileType::Pain001 => "text/xml",
            _ => "application/json",
        }
    }

    /// Whether `content_type` is acceptable for this file type.
    /// Parameters (`; charset=...`) and case are ignored.
    pub fn accepts_content_type(&self, content_type: &str) -> bool {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match self {
            FileType::Pain001 => media_type == "text/xml" || media_type == "application/xml",
            _ => media_type == self.content_type(),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnsupportedFileType(s.to_string()))
    }
}

/// File metadata declared when the consent was created
///
/// Owned by the consent store; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredFileMetadata {
    /// Base64 SHA-256 of the file the TPP intends to upload
    pub file_hash: String,

    /// Declared sum of instructed amounts
    pub control_sum: Decimal,

    /// Declared number of transactions
    pub transaction_count: usize,
}
