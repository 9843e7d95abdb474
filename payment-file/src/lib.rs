//! Payment File Engine
//!
//! Ingests bulk payment files uploaded against a file payment consent and
//! checks them against the metadata declared when the consent was created.
//!
//! # Architecture
//!
//! 1. **Dispatch**: the declared file type selects a decoder from the registry
//! 2. **Decode**: the decoder builds a [`DecodedFile`] of canonical payments,
//!    recomputing count and control sum from the entries
//! 3. **Validate**: the fingerprint of the raw upload, the count and the control
//!    sum are compared with the consent
//!
//! # Supported formats
//!
//! - `UK.OBIE.pain.001.001.08`: ISO 20022 customer credit transfer initiation (XML)
//! - `UK.OBIE.FPS.001`, `UK.OBIE.PaymentInitiation.3.0`/`3.1`: domestic payments (JSON)
//!
//! # Example
//!
//! ```no_run
//! use payment_file::{compute_fingerprint, Config, DeclaredFileMetadata, FileType, PaymentFileEngine};
//! use rust_decimal::Decimal;
//!
//! fn main() -> payment_file::Result<()> {
//!     let engine = PaymentFileEngine::new(Config::default())?;
//!     let upload = std::fs::read("payments.json")?;
//!
//!     let declared = DeclaredFileMetadata {
//!         file_hash: compute_fingerprint(&upload),
//!         control_sum: Decimal::new(8700, 2),
//!         transaction_count: 4,
//!     };
//!
//!     let verified = engine.verify(&declared, FileType::FasterPayments001, &upload)?;
//!     for error in verified.validation.errors() {
//!         println!("{}: {}", error.code(), error);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod consistency;
pub mod decoded;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod registry;
pub mod types;
pub mod validation;

// Re-exports
pub use config::Config;
pub use consistency::FileValidationError;
pub use decoded::{DecodedFile, DecodedFileBuilder};
pub use decoder::PaymentFileDecoder;
pub use engine::{DeclaredMetadataSource, PaymentFileEngine, VerifiedFile};
pub use error::{DecodeError, Error, Result};
pub use hashing::compute_fingerprint;
pub use registry::FileTypeRegistry;
pub use types::*;
pub use validation::{Discipline, ValidationChain, ValidationResult, Validator};
