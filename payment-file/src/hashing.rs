//! Content fingerprints for uploaded files
//!
//! The fingerprint is the base64 (standard alphabet, padded) encoding of the
//! SHA-256 digest of the bytes exactly as received. Nothing is normalized
//! first, so any change to the file between consent creation and upload
//! changes the fingerprint.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

/// Compute the fingerprint of raw file bytes
pub fn compute_fingerprint(raw: &[u8]) -> String {
    let digest = Sha256::digest(raw);
    BASE64.encode(digest)
}
