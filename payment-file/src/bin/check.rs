//! Payment file check binary
//!
//! ```text
//! payment-file-check <file-type> <path> <declared-hash> <declared-count> <declared-sum>
//! payment-file-check --fingerprint <path>
//! ```

use anyhow::{bail, Context};
use payment_file::{compute_fingerprint, Config, DeclaredFileMetadata, FileType, PaymentFileEngine};
use rust_decimal::Decimal;
use std::process::ExitCode;
use std::str::FromStr;

const USAGE: &str = "usage: payment-file-check <file-type> <path> <declared-hash> <declared-count> <declared-sum>\n       payment-file-check --fingerprint <path>";

fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--fingerprint") {
        let [_, path] = args.as_slice() else {
            bail!(USAGE);
        };
        let content = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;
        println!("{}", compute_fingerprint(&content));
        return Ok(ExitCode::SUCCESS);
    }

    let [file_type, path, hash, count, sum] = args.as_slice() else {
        bail!(USAGE);
    };

    let file_type = FileType::from_str(file_type)?;
    let declared = DeclaredFileMetadata {
        file_hash: hash.clone(),
        transaction_count: count
            .parse()
            .with_context(|| format!("Invalid declared count: {}", count))?,
        control_sum: Decimal::from_str(sum)
            .with_context(|| format!("Invalid declared control sum: {}", sum))?,
    };

    let config = Config::from_env()?;
    let engine = PaymentFileEngine::new(config)?;

    let content = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;
    tracing::info!(%file_type, path = %path, size = content.len(), "Checking payment file");

    let verified = match engine.verify(&declared, file_type, &content) {
        Ok(verified) => verified,
        Err(e) => {
            tracing::error!(error = %e, "Payment file rejected");
            println!("{}", serde_json::json!({ "decoded": false, "error": e.to_string() }));
            return Ok(ExitCode::from(2));
        }
    };

    let report = serde_json::json!({
        "decoded": true,
        "file_type": verified.file.file_type(),
        "transaction_count": verified.file.transaction_count(),
        "control_sum": verified.file.control_sum(),
        "valid": verified.is_valid(),
        "errors": verified.validation.errors(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if verified.is_valid() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
