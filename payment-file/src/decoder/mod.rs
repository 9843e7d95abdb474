//! Payment file decoders
//!
//! Each decoder turns one wire format into a [`DecodedFile`]. Decoders are
//! stateless and shared between concurrent uploads through the
//! [`FileTypeRegistry`](crate::FileTypeRegistry).

pub mod domestic_json;
pub mod pain001;

pub use domestic_json::DomesticPaymentsJsonDecoder;
pub use pain001::Pain001Decoder;

use crate::decoded::DecodedFile;
use crate::error::DecodeError;
use crate::types::{CurrencyCode, FileType};
use rust_decimal::Decimal;
use std::fmt;

/// Maximum fractional digits a [`Decimal`] holds without rounding
const MAX_AMOUNT_SCALE: usize = 28;

/// Decoder for one payment file wire format
pub trait PaymentFileDecoder: Send + Sync + fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Decode raw file content declared as `file_type`
    fn decode(&self, file_type: FileType, content: &[u8]) -> Result<DecodedFile, DecodeError>;
}

/// View content as UTF-8, skipping a leading byte order mark
pub(crate) fn utf8_content(content: &[u8]) -> Result<&str, DecodeError> {
    let text = std::str::from_utf8(content)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Parse a non-negative decimal amount without going through floating point.
///
/// Only plain `digits[.digits]` is accepted: no sign, exponent, or separators.
/// Values with more significant digits than a [`Decimal`] holds are rejected
/// rather than rounded.
pub(crate) fn parse_amount(path: &str, raw: &str) -> Result<Decimal, DecodeError> {
    let invalid = || DecodeError::InvalidAmount {
        path: path.to_string(),
        value: raw.to_string(),
    };

    let value = raw.trim();
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !fraction.map_or(true, digits) {
        return Err(invalid());
    }
    if fraction.map_or(0, str::len) > MAX_AMOUNT_SCALE {
        return Err(invalid());
    }

    Decimal::from_str_exact(value).map_err(|_| invalid())
}

/// Parse an ISO 4217 currency code
pub(crate) fn parse_currency(path: &str, raw: &str) -> Result<CurrencyCode, DecodeError> {
    CurrencyCode::parse(raw).ok_or_else(|| DecodeError::InvalidCurrency {
        path: path.to_string(),
        value: raw.to_string(),
    })
}

/// Mandatory text field: present and non-blank
///
/// The value is returned exactly as carried; whitespace only matters for the
/// blank check.
pub(crate) fn required(path: &str, value: Option<&str>) -> Result<String, DecodeError> {
    match non_blank(value) {
        Some(v) => Ok(v.to_string()),
        None => Err(DecodeError::MissingField(path.to_string())),
    }
}

/// Optional text that is not empty or whitespace only, untrimmed
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_keeps_scale() {
        let amount = parse_amount("Amount", "10.00").unwrap();
        assert_eq!(amount.to_string(), "10.00");
        assert_eq!(amount.scale(), 2);
        assert_eq!(parse_amount("Amount", " 42 ").unwrap(), Decimal::from(42));
    }

    #[test]
    fn test_parse_amount_is_exact() {
        let a = parse_amount("Amount", "0.1").unwrap();
        let b = parse_amount("Amount", "0.2").unwrap();
        assert_eq!(a + b, parse_amount("Amount", "0.3").unwrap());
    }

    #[test]
    fn test_parse_amount_rejects_non_plain_decimals() {
        for raw in ["", "-1.00", "+1", "1e5", "1,000.00", "1.", ".5", "abc", "1.2.3", "1_000"] {
            assert!(
                matches!(parse_amount("Amount", raw), Err(DecodeError::InvalidAmount { .. })),
                "accepted {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_amount_rejects_lossy_scale() {
        let raw = format!("1.{}", "1".repeat(29));
        assert!(parse_amount("Amount", &raw).is_err());
    }

    #[test]
    fn test_parse_amount_rejects_excess_significant_digits() {
        let raw = "12345.1234567890123456789012345678";
        assert!(matches!(
            parse_amount("Amount", raw),
            Err(DecodeError::InvalidAmount { value, .. }) if value == raw
        ));

        let wide = parse_amount("Amount", "1234567890123456789012345.678").unwrap();
        assert_eq!(wide.to_string(), "1234567890123456789012345.678");
    }

    #[test]
    fn test_utf8_content_skips_bom() {
        assert_eq!(utf8_content(b"\xef\xbb\xbf{}").unwrap(), "{}");
        assert!(matches!(utf8_content(b"\xff\xfe"), Err(DecodeError::Encoding(_))));
    }

    #[test]
    fn test_required_rejects_blank() {
        assert_eq!(required("X", Some(" a ")).unwrap(), " a ");
        assert!(matches!(required("X", Some("  ")), Err(DecodeError::MissingField(p)) if p == "X"));
        assert!(required("X", None).is_err());
    }

    #[test]
    fn test_non_blank_keeps_value_as_given() {
        assert_eq!(non_blank(Some(" REF-1")), Some(" REF-1"));
        assert_eq!(non_blank(Some("\t")), None);
        assert_eq!(non_blank(None), None);
    }
}
