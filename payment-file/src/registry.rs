//! File type registry
//!
//! Routes a declared [`FileType`] to its decoder and folds decoder failures
//! into [`Error::MalformedFile`]. The registry never looks at payment content
//! itself; supporting a new format means registering another
//! [`PaymentFileDecoder`].

use crate::decoded::DecodedFile;
use crate::decoder::{DomesticPaymentsJsonDecoder, Pain001Decoder, PaymentFileDecoder};
use crate::types::FileType;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Built-in decoder for a file type
pub fn default_decoder(file_type: FileType) -> Arc<dyn PaymentFileDecoder> {
    match file_type {
        FileType::FasterPayments001
        | FileType::PaymentInitiation30
        | FileType::PaymentInitiation31 => Arc::new(DomesticPaymentsJsonDecoder),
        FileType::Pain001 => Arc::new(Pain001Decoder),
    }
}

/// Decoders keyed by file type
///
/// Keys are the closed [`FileType`] set: a new wire format needs a `FileType`
/// variant (identifier and media type) before its decoder can be registered.
#[derive(Debug, Clone, Default)]
pub struct FileTypeRegistry {
    decoders: HashMap<FileType, Arc<dyn PaymentFileDecoder>>,
}

impl FileTypeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in decoder for every known file type
    pub fn with_default_decoders() -> Self {
        Self::for_file_types(FileType::ALL)
    }

    /// Registry with built-in decoders for the given file types only
    pub fn for_file_types(file_types: impl IntoIterator<Item = FileType>) -> Self {
        let mut registry = Self::new();
        for file_type in file_types {
            registry.register_shared(file_type, default_decoder(file_type));
        }
        registry
    }

    /// Register `decoder` for `file_type`, returning any decoder it replaces
    pub fn register<D>(&mut self, file_type: FileType, decoder: D) -> Option<Arc<dyn PaymentFileDecoder>>
    where
        D: PaymentFileDecoder + 'static,
    {
        self.register_shared(file_type, Arc::new(decoder))
    }

    /// Register an already shared decoder
    pub fn register_shared(
        &mut self,
        file_type: FileType,
        decoder: Arc<dyn PaymentFileDecoder>,
    ) -> Option<Arc<dyn PaymentFileDecoder>> {
        tracing::debug!(file_type = %file_type, decoder = decoder.name(), "Registering decoder");
        self.decoders.insert(file_type, decoder)
    }

    /// Whether a decoder is registered for `file_type`
    pub fn supports(&self, file_type: FileType) -> bool {
        self.decoders.contains_key(&file_type)
    }

    /// Registered file types, ordered by identifier
    pub fn file_types(&self) -> Vec<FileType> {
        let mut types: Vec<_> = self.decoders.keys().copied().collect();
        types.sort_by_key(|t| t.as_str());
        types
    }

    /// Decoder registered for `file_type`
    pub fn decoder_for(&self, file_type: FileType) -> Result<&dyn PaymentFileDecoder> {
        self.decoders
            .get(&file_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| Error::UnsupportedFileType(file_type.to_string()))
    }

    /// Decode `content` declared as `file_type`
    pub fn process(&self, file_type: FileType, content: &[u8]) -> Result<DecodedFile> {
        let decoder = self.decoder_for(file_type)?;

        tracing::debug!(
            file_type = %file_type,
            decoder = decoder.name(),
            size = content.len(),
            "Decoding payment file"
        );

        match decoder.decode(file_type, content) {
            Ok(file) => {
                tracing::debug!(
                    file_type = %file_type,
                    transactions = file.transaction_count(),
                    control_sum = %file.control_sum(),
                    "Payment file decoded"
                );
                Ok(file)
            }
            Err(source) => {
                tracing::warn!(file_type = %file_type, error = %source, "Payment file malformed");
                Err(Error::MalformedFile { file_type, source })
            }
        }
    }

    /// Decode `content` declared with a file type identifier such as
    /// `UK.OBIE.pain.001.001.08`
    pub fn process_tagged(&self, file_type: &str, content: &[u8]) -> Result<DecodedFile> {
        self.process(file_type.parse()?, content)
    }
}
