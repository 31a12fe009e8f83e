//! Artifact manifest: SHA-256 digests of the artifact files, optionally
//! signed with Ed25519 (`manifest.sig` holds the raw 64-byte signature over
//! the exact `manifest.json` bytes).

use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "manifest.sig";
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was written.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// File name relative to the artifact directory -> lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Hash the named files inside `dir`.
    ///
    /// # Errors
    /// Returns error if a file cannot be read.
    pub fn for_files(dir: &Path, names: &[&str]) -> std::io::Result<Self> {
        let mut files = BTreeMap::new();
        for name in names {
            let bytes = std::fs::read(dir.join(name))?;
            files.insert((*name).to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            created_at: Some(chrono::Utc::now().timestamp()),
            files,
        })
    }

    /// Parse manifest bytes.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or the version is unsupported.
    pub fn parse(bytes: &[u8]) -> Result<Self, String> {
        let manifest: Self =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid {MANIFEST_FILE}: {e}"))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(format!(
                "unsupported manifest version {} (expected {MANIFEST_VERSION})",
                manifest.version
            ));
        }
        if manifest.files.is_empty() {
            return Err(format!("{MANIFEST_FILE} binds no files"));
        }
        Ok(manifest)
    }

    /// Check that every given file is bound and its digest matches.
    ///
    /// The caller passes the bytes it is about to parse, so what is
    /// verified is exactly what gets loaded.
    ///
    /// # Errors
    /// Returns the name of the first unbound or mismatched file.
    pub fn check_files(&self, loaded: &[(&str, &[u8])]) -> Result<(), String> {
        for (name, bytes) in loaded {
            let expected = self
                .files
                .get(*name)
                .ok_or_else(|| format!("{MANIFEST_FILE} does not bind {name}"))?;
            if !constant_time_eq_str(&sha256_hex(bytes), &expected.to_ascii_lowercase()) {
                return Err(format!("hash mismatch for {name}"));
            }
        }
        Ok(())
    }
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Decode a base64 Ed25519 public key.
///
/// # Errors
/// Returns error on bad base64, wrong length or an invalid curve point.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, String> {
    let raw = general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| format!("invalid base64 in public key: {e}"))?;
    let bytes: [u8; 32] = raw
        .as_slice()
        .try_into()
        .map_err(|_| format!("public key must be 32 bytes (got {})", raw.len()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| format!("invalid public key: {e}"))
}

/// Verify `signature` over the raw manifest bytes.
///
/// # Errors
/// Returns error if the signature is malformed or does not verify.
pub fn verify_signature(
    key: &VerifyingKey,
    manifest_bytes: &[u8],
    signature: &[u8],
) -> Result<(), String> {
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| "invalid signature length (expected 64 bytes)".to_string())?;
    key.verify(manifest_bytes, &Signature::from_bytes(&sig_bytes))
        .map_err(|_| "manifest signature verification failed".to_string())
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
