//! Configuration for the payment file engine

use crate::types::FileType;
use serde::{Deserialize, Serialize};

/// Default decode limit (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Payment file engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Largest upload handed to a decoder
    pub max_file_size_bytes: usize,

    /// File types accepted for upload
    pub enabled_file_types: Vec<FileType>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "payment-file-engine".to_string(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            enabled_file_types: FileType::ALL.to_vec(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(max) = std::env::var("PAYMENT_FILE_MAX_BYTES") {
            config.max_file_size_bytes = max.trim().parse().map_err(|e| {
                crate::Error::Config(format!("Invalid PAYMENT_FILE_MAX_BYTES '{}': {}", max, e))
            })?;
        }

        if let Ok(types) = std::env::var("PAYMENT_FILE_TYPES") {
            config.enabled_file_types = types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| {
                    t.parse::<FileType>()
                        .map_err(|_| crate::Error::Config(format!("Unknown file type in PAYMENT_FILE_TYPES: {}", t)))
                })
                .collect::<crate::Result<Vec<_>>>()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check limits and enabled types
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_file_size_bytes == 0 {
            return Err(crate::Error::Config(
                "max_file_size_bytes must be greater than 0".to_string(),
            ));
        }
        if self.enabled_file_types.is_empty() {
            return Err(crate::Error::Config(
                "at least one file type must be enabled".to_string(),
            ));
        }
        Ok(())
    }
}
