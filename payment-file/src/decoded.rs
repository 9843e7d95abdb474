//! Decoded payment file aggregate
//!
//! A [`DecodedFile`] is only ever produced by [`DecodedFileBuilder::finish`], so
//! its transaction count and control sum always describe exactly the payments
//! it holds. The control sum is accumulated as each entry is pushed; totals
//! embedded in the source document are never copied in.

use crate::error::DecodeError;
use crate::types::{CanonicalPayment, FileType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Immutable result of decoding one payment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedFile {
    file_type: FileType,
    transaction_count: usize,
    control_sum: Decimal,
    payments: Vec<CanonicalPayment>,
}

impl DecodedFile {
    /// Wire format the file was decoded from
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Number of payments (always `payments().len()`)
    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    /// Exact sum of all instructed amounts
    pub fn control_sum(&self) -> Decimal {
        self.control_sum
    }

    /// Payments in file order
    pub fn payments(&self) -> &[CanonicalPayment] {
        &self.payments
    }

    /// Take ownership of the payments (for initiation processing)
    pub fn into_payments(self) -> Vec<CanonicalPayment> {
        self.payments
    }
}

/// Accumulates payments while a decoder walks a document
#[derive(Debug)]
pub struct DecodedFileBuilder {
    file_type: FileType,
    decoded_at: DateTime<Utc>,
    control_sum: Decimal,
    payments: Vec<CanonicalPayment>,
}

impl DecodedFileBuilder {
    /// Start a decode of `file_type`
    pub fn new(file_type: FileType) -> Self {
        Self {
            file_type,
            decoded_at: Utc::now(),
            control_sum: Decimal::ZERO,
            payments: Vec::new(),
        }
    }

    /// Timestamp stamped on every payment of this decode
    pub fn decoded_at(&self) -> DateTime<Utc> {
        self.decoded_at
    }

    /// Payments pushed so far
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    /// No payments pushed yet
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// Running control sum
    pub fn control_sum(&self) -> Decimal {
        self.control_sum
    }

    /// Append a payment and add its amount to the control sum
    ///
    /// Fails rather than storing a rounded sum.
    pub fn push(&mut self, payment: CanonicalPayment) -> Result<(), DecodeError> {
        let count = self.payments.len();
        let amount = payment.instructed_amount.amount;
        let sum = self
            .control_sum
            .checked_add(amount)
            .ok_or(DecodeError::ControlSumOverflow { count })?;
        if !is_exact_sum(self.control_sum, amount, sum) {
            return Err(DecodeError::ControlSumPrecision { count });
        }

        self.control_sum = sum;
        self.payments.push(payment);
        Ok(())
    }

    /// Freeze into a [`DecodedFile`]
    pub fn finish(self) -> DecodedFile {
        DecodedFile {
            file_type: self.file_type,
            transaction_count: self.payments.len(),
            control_sum: self.control_sum,
            payments: self.payments,
        }
    }
}

/// `sum` is `a + b` without rounding.
///
/// Addition keeps the larger operand scale unless the mantissa runs out of
/// room; a lower scale is only exact if the dropped digits were zeros.
fn is_exact_sum(a: Decimal, b: Decimal, sum: Decimal) -> bool {
    if sum.scale() >= a.scale().max(b.scale()) {
        return true;
    }
    sum.checked_sub(a) == Some(b) && sum.checked_sub(b) == Some(a)
}
