//! Decode-then-validate entry point
//!
//! Callers get two distinct failure channels:
//!
//! - `Err(Error)`: the upload could not be decoded (unsupported type, wrong
//!   media type, too large, malformed content)
//! - `Ok(VerifiedFile)` with an invalid [`ValidationResult`]: the file decoded
//!   but does not match what the consent declared

use crate::config::Config;
use crate::consistency::{self, FileValidationError};
use crate::decoded::DecodedFile;
use crate::registry::FileTypeRegistry;
use crate::types::{DeclaredFileMetadata, FileType};
use crate::validation::ValidationResult;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Source of the file metadata declared on a consent
pub trait DeclaredMetadataSource {
    /// Metadata declared for `consent_id`, if the consent exists
    fn declared_file_metadata(&self, consent_id: &str) -> Option<DeclaredFileMetadata>;
}

impl DeclaredMetadataSource for HashMap<String, DeclaredFileMetadata> {
    fn declared_file_metadata(&self, consent_id: &str) -> Option<DeclaredFileMetadata> {
        self.get(consent_id).cloned()
    }
}

/// Decoded upload with its consistency result
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedFile {
    /// Decoded payments
    pub file: DecodedFile,

    /// Discrepancies against the consent (empty when the file matches)
    pub validation: ValidationResult<FileValidationError>,
}

impl VerifiedFile {
    /// File matches its consent
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid()
    }
}

/// Payment file ingestion engine
///
/// Holds no per-upload state; one instance can serve concurrent uploads.
#[derive(Debug, Clone)]
pub struct PaymentFileEngine {
    config: Config,
    registry: FileTypeRegistry,
}

impl PaymentFileEngine {
    /// Engine with built-in decoders for the enabled file types
    pub fn new(config: Config) -> Result<Self> {
        let registry = FileTypeRegistry::for_file_types(config.enabled_file_types.iter().copied());
        Self::with_registry(config, registry)
    }

    /// Engine with a caller-supplied registry
    pub fn with_registry(config: Config, registry: FileTypeRegistry) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            service = %config.service_name,
            max_file_size_bytes = config.max_file_size_bytes,
            file_types = ?registry.file_types(),
            "Payment file engine ready"
        );
        Ok(Self { config, registry })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registered decoders
    pub fn registry(&self) -> &FileTypeRegistry {
        &self.registry
    }

    /// Reject an upload whose media type does not fit `file_type`
    pub fn check_content_type(&self, file_type: FileType, content_type: &str) -> Result<()> {
        if file_type.accepts_content_type(content_type) {
            Ok(())
        } else {
            Err(Error::ContentTypeMismatch {
                file_type,
                expected: file_type.content_type(),
                actual: content_type.to_string(),
            })
        }
    }

    /// Decode an upload, enforcing the size limit first
    pub fn decode(&self, file_type: FileType, content: &[u8]) -> Result<DecodedFile> {
        let limit = self.config.max_file_size_bytes;
        if content.len() > limit {
            tracing::warn!(file_type = %file_type, size = content.len(), limit, "Payment file too large");
            return Err(Error::FileTooLarge {
                size: content.len(),
                limit,
            });
        }

        self.registry.process(file_type, content)
    }

    /// Decode an upload and check it against the declared metadata
    pub fn verify(
        &self,
        declared: &DeclaredFileMetadata,
        file_type: FileType,
        content: &[u8],
    ) -> Result<VerifiedFile> {
        let file = self.decode(file_type, content)?;
        let validation = consistency::validate(declared, &file, content);
        Ok(VerifiedFile { file, validation })
    }

    /// Verify an upload as it arrives over HTTP: file type identifier and
    /// media type as supplied by the client
    pub fn verify_upload(
        &self,
        declared: &DeclaredFileMetadata,
        file_type: &str,
        content_type: &str,
        content: &[u8],
    ) -> Result<VerifiedFile> {
        let file_type: FileType = file_type.parse()?;
        self.check_content_type(file_type, content_type)?;
        self.verify(declared, file_type, content)
    }

    /// Verify an upload against the metadata declared on `consent_id`
    pub fn verify_for_consent<S>(
        &self,
        source: &S,
        consent_id: &str,
        file_type: FileType,
        content: &[u8],
    ) -> Result<VerifiedFile>
    where
        S: DeclaredMetadataSource + ?Sized,
    {
        let declared = source
            .declared_file_metadata(consent_id)
            .ok_or_else(|| Error::ConsentNotFound(consent_id.to_string()))?;
        self.verify(&declared, file_type, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::compute_fingerprint;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const JSON: &[u8] = br#"{"Data":{"DomesticPayments":[
      {"InstructionIdentification":"A","EndToEndIdentification":"A",
       "InstructedAmount":{"Amount":"12.34","Currency":"GBP"},
       "CreditorAccount":{"SchemeName":"UK.OBIE.IBAN","Identification":"GB29NWBK60161331926819"}}
    ]}}"#;

    fn declared_for(content: &[u8], count: usize, sum: &str) -> DeclaredFileMetadata {
        DeclaredFileMetadata {
            file_hash: compute_fingerprint(content),
            control_sum: Decimal::from_str(sum).unwrap(),
            transaction_count: count,
        }
    }

    fn engine() -> PaymentFileEngine {
        PaymentFileEngine::new(Config::default()).unwrap()
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PaymentFileEngine>();
    }

    #[test]
    fn test_verify_valid_upload() {
        let verified = engine()
            .verify(&declared_for(JSON, 1, "12.34"), FileType::FasterPayments001, JSON)
            .unwrap();
        assert!(verified.is_valid());
        assert_eq!(verified.file.transaction_count(), 1);
    }

    #[test]
    fn test_size_limit_checked_before_decoding() {
        let config = Config {
            max_file_size_bytes: 8,
            ..Config::default()
        };
        let engine = PaymentFileEngine::new(config).unwrap();
        let err = engine.decode(FileType::Pain001, b"definitely not xml").unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { size: 18, limit: 8 }));
    }

    #[test]
    fn test_disabled_type_unsupported() {
        let config = Config {
            enabled_file_types: vec![FileType::Pain001],
            ..Config::default()
        };
        let engine = PaymentFileEngine::new(config).unwrap();
        assert!(matches!(
            engine.decode(FileType::FasterPayments001, JSON),
            Err(Error::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_verify_upload_checks_content_type() {
        let declared = declared_for(JSON, 1, "12.34");
        let err = engine()
            .verify_upload(&declared, "UK.OBIE.FPS.001", "text/xml", JSON)
            .unwrap_err();
        assert!(matches!(err, Error::ContentTypeMismatch { expected: "application/json", .. }));

        let verified = engine()
            .verify_upload(&declared, "UK.OBIE.FPS.001", "application/json; charset=utf-8", JSON)
            .unwrap();
        assert!(verified.is_valid());
    }

    #[test]
    fn test_malformed_is_error_not_validation_result() {
        let declared = declared_for(b"{", 0, "0");
        let err = engine()
            .verify(&declared, FileType::PaymentInitiation31, b"{")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedFile { file_type: FileType::PaymentInitiation31, .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_verify_for_consent() {
        let mut consents = HashMap::new();
        consents.insert("PFC-001".to_string(), declared_for(JSON, 2, "12.34"));

        let verified = engine()
            .verify_for_consent(&consents, "PFC-001", FileType::PaymentInitiation30, JSON)
            .unwrap();
        assert_eq!(
            verified.validation.errors(),
            &[FileValidationError::TransactionCountMismatch {
                actual: 1,
                declared: 2
            }]
        );

        let err = engine()
            .verify_for_consent(&consents, "PFC-404", FileType::PaymentInitiation30, JSON)
            .unwrap_err();
        assert!(matches!(err, Error::ConsentNotFound(id) if id == "PFC-404"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            enabled_file_types: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(PaymentFileEngine::new(config), Err(Error::Config(_))));
    }
}
