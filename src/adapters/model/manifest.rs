//! Signed model manifests.
//!
//! A model directory may carry `manifest.json` (SHA-256 of every bound file)
//! and `model.sig` (Ed25519 signature over the exact manifest bytes). The
//! signature proves who published the manifest; the hashes bind the files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ModelError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

/// Only manifest layout understood by this build.
pub const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at`, in seconds.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

/// Contents of `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedManifest {
    pub version: u32,
    /// Monotonic publication counter (e.g. CI build number)
    pub serial: u64,
    /// Unix seconds at signing time
    pub created_at: i64,
    /// Random 16-byte nonce, base64
    pub nonce_b64: String,
    /// File name (relative to the model directory) -> SHA-256 hex
    pub files: BTreeMap<String, String>,
}

impl SignedManifest {
    #[must_use]
    pub fn binds(&self, file_name: &str) -> bool {
        self.files.contains_key(file_name)
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

pub(crate) fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Decode a base64 Ed25519 public key.
///
/// # Errors
/// Returns `ModelError::Signature` if the text is not 32 bytes of valid key.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ModelError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ModelError::Signature("public key is not valid base64".into()))?;
    let raw: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Signature("public key must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&raw)
        .map_err(|_| ModelError::Signature("invalid Ed25519 public key".into()))
}

fn validate_nonce(nonce_b64: &str) -> Result<(), ModelError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(nonce_b64.trim())
        .map_err(|e| ModelError::Manifest(format!("nonce is not valid base64: {e}")))?;
    if raw.len() != 16 {
        return Err(ModelError::Manifest(
            "nonce must decode to exactly 16 bytes".into(),
        ));
    }
    Ok(())
}

// Constant-time compare for equal-length ASCII digests.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |diff, (x, y)| diff | (x ^ y))
        == 0
}

/// Whether `dir` carries a manifest or a signature.
#[must_use]
pub fn is_signed(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).exists() || dir.join(SIGNATURE_FILE).exists()
}

/// Verify `dir/model.sig` over `dir/manifest.json` and every file hash it lists.
///
/// # Errors
/// Returns `ModelError::Signature` or `ModelError::Manifest` on any mismatch;
/// nothing in the directory should be trusted after an error.
pub fn verify(dir: &Path, key: &VerifyingKey) -> Result<SignedManifest, ModelError> {
    let sig_path = dir.join(SIGNATURE_FILE);
    let manifest_path = dir.join(MANIFEST_FILE);

    let sig_bytes = fs::read(&sig_path).map_err(|e| ModelError::Io {
        path: sig_path.clone(),
        message: e.to_string(),
    })?;
    let sig_array: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Signature("signature must be 64 bytes".into()))?;
    let signature = Signature::from_bytes(&sig_array);

    let manifest_bytes = fs::read(&manifest_path).map_err(|e| ModelError::Io {
        path: manifest_path.clone(),
        message: e.to_string(),
    })?;

    key.verify(&manifest_bytes, &signature)
        .map_err(|_| ModelError::Signature("manifest signature does not verify".into()))?;

    let manifest: SignedManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ModelError::Manifest(format!("invalid manifest.json: {e}")))?;

    if manifest.version != MANIFEST_VERSION {
        return Err(ModelError::Manifest(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }
    validate_nonce(&manifest.nonce_b64)?;
    if manifest.created_at > unix_now() + MAX_FUTURE_SKEW_SECS {
        return Err(ModelError::Manifest("created_at is in the future".into()));
    }
    if manifest.files.is_empty() {
        return Err(ModelError::Manifest("manifest binds no files".into()));
    }

    for (rel, expected) in &manifest.files {
        let path = dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            ModelError::Manifest(format!("bound file {rel} is missing or unreadable: {e}"))
        })?;
        if !constant_time_eq(&sha256_hex(&bytes), expected) {
            return Err(ModelError::Manifest(format!("hash mismatch for {rel}")));
        }
    }

    tracing::info!(
        serial = manifest.serial,
        files = manifest.files.len(),
        "Model manifest signature verified"
    );

    Ok(manifest)
}

/// Hash `files` (relative to `dir`), write `manifest.json`, and sign it into `model.sig`.
///
/// `serial` defaults to the creation time so later signatures sort after
/// earlier ones.
///
/// # Errors
/// Returns `ModelError` if a file cannot be read or the outputs cannot be written.
pub fn sign(
    dir: &Path,
    key: &SigningKey,
    files: &[&str],
    serial: Option<u64>,
) -> Result<SignedManifest, ModelError> {
    let mut hashes = BTreeMap::new();
    for rel in files {
        let path = dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| ModelError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        hashes.insert((*rel).to_string(), sha256_hex(&bytes));
    }
    if hashes.is_empty() {
        return Err(ModelError::Manifest("nothing to sign".into()));
    }

    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let created_at = unix_now();
    let manifest = SignedManifest {
        version: MANIFEST_VERSION,
        serial: serial.unwrap_or_else(|| u64::try_from(created_at).unwrap_or(1)),
        created_at,
        nonce_b64: base64::engine::general_purpose::STANDARD.encode(nonce),
        files: hashes,
    };

    let bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| ModelError::Manifest(format!("cannot serialize manifest: {e}")))?;
    let write = |name: &str, contents: &[u8]| {
        let path = dir.join(name);
        fs::write(&path, contents).map_err(|e| ModelError::Io {
            path,
            message: e.to_string(),
        })
    };
    write(MANIFEST_FILE, &bytes)?;
    write(SIGNATURE_FILE, &key.sign(&bytes).to_bytes())?;

    tracing::info!(serial = manifest.serial, files = manifest.files.len(), "Model manifest signed");

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn write_manifest(dir: &Path, key: &SigningKey, files: &[(&str, &[u8])], created_at: i64) {
        let manifest = SignedManifest {
            version: MANIFEST_VERSION,
            serial: 3,
            created_at,
            nonce_b64: base64::engine::general_purpose::STANDARD.encode([1u8; 16]),
            files: files
                .iter()
                .map(|(name, bytes)| ((*name).to_string(), sha256_hex(bytes)))
                .collect(),
        };
        let bytes = serde_json::to_vec_pretty(&manifest).expect("serialize");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        fs::write(dir.join(SIGNATURE_FILE), key.sign(&bytes).to_bytes()).expect("write sig");
    }

    #[test]
    fn test_verify_accepts_matching_files() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        fs::write(temp.path().join("classifier.json"), b"{}").expect("write");
        write_manifest(temp.path(), &key, &[("classifier.json", b"{}")], unix_now());

        let manifest = verify(temp.path(), &key.verifying_key()).expect("verifies");
        assert!(manifest.binds("classifier.json"));
        assert_eq!(manifest.serial, 3);
    }

    #[test]
    fn test_verify_rejects_tampered_file() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        fs::write(temp.path().join("classifier.json"), b"{\"tampered\":1}").expect("write");
        write_manifest(temp.path(), &key, &[("classifier.json", b"{}")], unix_now());

        let err = verify(temp.path(), &key.verifying_key()).expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("classifier.json"), b"{}").expect("write");
        write_manifest(temp.path(), &signing_key(), &[("classifier.json", b"{}")], unix_now());

        let other = SigningKey::from_bytes(&[9u8; 32]);
        let err = verify(temp.path(), &other.verifying_key()).expect_err("must fail");
        assert!(matches!(err, ModelError::Signature(_)));
    }

    #[test]
    fn test_verify_rejects_future_manifest() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        fs::write(temp.path().join("classifier.json"), b"{}").expect("write");
        write_manifest(
            temp.path(),
            &key,
            &[("classifier.json", b"{}")],
            unix_now() + 3600,
        );

        assert!(verify(temp.path(), &key.verifying_key()).is_err());
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = signing_key().verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.to_bytes());
        assert_eq!(verifying_key_from_b64(&format!("{b64}\n")).expect("valid"), key);
        assert!(verifying_key_from_b64("AAAA").is_err());
    }

    #[test]
    fn test_signed_directory_verifies() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        fs::write(temp.path().join("classifier.json"), b"{\"a\":1}").expect("write");

        let signed = sign(temp.path(), &key, &["classifier.json"], Some(42)).expect("signs");
        assert_eq!(signed.serial, 42);

        let verified = verify(temp.path(), &key.verifying_key()).expect("verifies");
        assert!(verified.binds("classifier.json"));
        assert_eq!(verified.nonce_b64, signed.nonce_b64);
    }

    #[test]
    fn test_sign_requires_files() {
        let temp = tempdir().expect("tempdir");
        assert!(sign(temp.path(), &signing_key(), &["classifier.json"], None).is_err());
        assert!(!is_signed(temp.path()));
    }
}
