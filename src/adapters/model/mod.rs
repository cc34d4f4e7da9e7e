//! Model adapter: Implementation of `Classifier` over an exported JSON model.
//!
//! The trained estimator is published as `classifier.json` in a model
//! directory, optionally bound by a signed manifest (see [`manifest`]).
//!
//! # Security
//!
//! - In release builds, the model directory MUST carry a valid signature
//! - In debug builds, unsigned models load only when explicitly allowed
//!   (`COLORISK_ALLOW_UNSIGNED_MODELS=true`)
//! - The exported feature order must equal the fixed marker order, otherwise
//!   the model is refused: a silently permuted model would still "work"
//!
//! # Lifetime
//!
//! Loading is expensive relative to a prediction and happens once per
//! process. [`load_shared`] caches the handle behind a `OnceLock`; callers
//! pass the resulting `Arc` into the services.

pub mod estimator;
pub mod manifest;

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::domain::{column_names, FeatureVector};
use crate::ports::{Classifier, ClassifierError};

pub use estimator::{Estimator, Tree, TreeNode};
pub use manifest::SignedManifest;

/// File name of the exported model inside a model directory.
pub const MODEL_FILE: &str = "classifier.json";

/// Only artifact layout understood by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Environment variable that allows unsigned models (debug builds only).
pub const ALLOW_UNSIGNED_MODELS_ENV: &str = "COLORISK_ALLOW_UNSIGNED_MODELS";

const PUBKEY_FILE_ENV: &str = "COLORISK_MODEL_PUBKEY_B64_FILE";
const DOCKER_SECRET_PUBKEY: &str = "/run/secrets/colorisk_model_pubkey_b64";

/// Error type for model loading.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read {path:?}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Invalid model file: {0}")]
    Format(String),

    #[error("Model feature order {got:?} does not match markers {expected:?}")]
    FeatureOrder {
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("Model signature check failed: {0}")]
    Signature(String),

    #[error("Model manifest rejected: {0}")]
    Manifest(String),
}

fn default_threshold() -> f64 {
    0.5
}

/// JSON layout of `classifier.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    /// Probability at or above which a row is class 1
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub estimator: Estimator,
}

impl ClassifierArtifact {
    /// Check version, feature order, threshold and estimator structure.
    ///
    /// # Errors
    /// Returns `ModelError` describing the first problem found.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ModelError::Format(format!(
                "unsupported format_version {}",
                self.format_version
            )));
        }

        let expected = column_names();
        if self.feature_names.len() != expected.len()
            || self.feature_names.iter().zip(expected).any(|(got, want)| got != want)
        {
            return Err(ModelError::FeatureOrder {
                expected: expected.iter().map(|s| (*s).to_string()).collect(),
                got: self.feature_names.clone(),
            });
        }

        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ModelError::Format(format!(
                "threshold {} must be inside (0, 1)",
                self.threshold
            )));
        }

        self.estimator.validate()
    }
}

/// Classifier backed by a validated `ClassifierArtifact`.
#[derive(Debug, Clone)]
pub struct JsonClassifier {
    artifact: ClassifierArtifact,
    signed: bool,
}

impl JsonClassifier {
    /// Wrap an artifact after validating it.
    ///
    /// # Errors
    /// Returns `ModelError` if the artifact is malformed.
    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self, ModelError> {
        artifact.validate()?;
        Ok(Self {
            artifact,
            signed: false,
        })
    }

    /// Whether the model was loaded through a verified signature.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    #[must_use]
    pub fn artifact(&self) -> &ClassifierArtifact {
        &self.artifact
    }

    /// Positive-class probability for one row.
    ///
    /// # Errors
    /// Returns `ClassifierError::Evaluation` if the walk leaves the model.
    pub fn probability(&self, row: &FeatureVector) -> Result<f64, ClassifierError> {
        self.artifact
            .estimator
            .probability(&row.to_f64())
            .ok_or_else(|| ClassifierError::Evaluation("tree walk left the node array".into()))
    }
}

impl Classifier for JsonClassifier {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ClassifierError> {
        rows.iter()
            .map(|row| {
                let p = self.probability(row)?;
                Ok(u8::from(p >= self.artifact.threshold))
            })
            .collect()
    }

    fn describe(&self) -> String {
        format!(
            "{}{}",
            self.artifact.estimator.describe(),
            if self.signed { ", signed" } else { ", unsigned" }
        )
    }
}

/// Loads `classifier.json` from a model directory under a signature policy.
#[derive(Debug, Clone, Default)]
pub struct ModelLoader {
    public_key: Option<VerifyingKey>,
    allow_unsigned: bool,
}

fn parse_bool_env(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

impl ModelLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a loader from the environment.
    ///
    /// The verifying key comes from `COLORISK_MODEL_PUBKEY_B64_FILE` or the
    /// Docker secret; unsigned models are allowed only in debug builds with
    /// `COLORISK_ALLOW_UNSIGNED_MODELS=true`.
    ///
    /// # Errors
    /// Returns `ModelError` if a configured key file cannot be read or parsed.
    pub fn from_env() -> Result<Self, ModelError> {
        let key_path = std::env::var(PUBKEY_FILE_ENV)
            .ok()
            .map(|p| PathBuf::from(p.trim()))
            .or_else(|| {
                let secret = Path::new(DOCKER_SECRET_PUBKEY);
                secret.exists().then(|| secret.to_path_buf())
            });

        let public_key = match key_path {
            Some(path) => {
                let b64 = std::fs::read_to_string(&path).map_err(|e| ModelError::Io {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                Some(manifest::verifying_key_from_b64(&b64)?)
            }
            None => None,
        };

        Ok(Self {
            public_key,
            allow_unsigned: parse_bool_env(ALLOW_UNSIGNED_MODELS_ENV),
        })
    }

    #[must_use]
    pub fn with_public_key(mut self, key: VerifyingKey) -> Self {
        self.public_key = Some(key);
        self
    }

    /// Permit unsigned model directories. Has no effect in release builds.
    #[must_use]
    pub fn allow_unsigned(mut self, allow: bool) -> Self {
        self.allow_unsigned = allow;
        self
    }

    fn unsigned_permitted(&self) -> bool {
        cfg!(debug_assertions) && self.allow_unsigned
    }

    /// Load and validate the model at `path` (a directory or the JSON file itself).
    ///
    /// # Errors
    /// Returns `ModelError` if the signature policy is not met, the file is
    /// unreadable, or the artifact is malformed.
    pub fn load(&self, path: &Path) -> Result<JsonClassifier, ModelError> {
        let (dir, model_path) = if path.is_file() {
            (
                path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
                path.to_path_buf(),
            )
        } else {
            (path.to_path_buf(), path.join(MODEL_FILE))
        };

        let signed = if manifest::is_signed(&dir) {
            let key = self.public_key.as_ref().ok_or_else(|| {
                ModelError::Signature(format!(
                    "model is signed but no verifying key is configured (set {PUBKEY_FILE_ENV})"
                ))
            })?;
            let manifest = manifest::verify(&dir, key)?;

            let file_name = model_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(MODEL_FILE);
            if !manifest.binds(file_name) {
                return Err(ModelError::Manifest(format!(
                    "manifest does not bind {file_name}"
                )));
            }
            true
        } else if self.unsigned_permitted() {
            tracing::warn!(
                "Loading UNSIGNED model ({ALLOW_UNSIGNED_MODELS_ENV}=true). \
                 This is only allowed in debug builds."
            );
            false
        } else {
            tracing::error!("Model signature not found in {:?}", dir);
            return Err(ModelError::Signature(if cfg!(debug_assertions) {
                format!("signed model required; set {ALLOW_UNSIGNED_MODELS_ENV}=true for local testing")
            } else {
                "signed model required in release builds".to_string()
            }));
        };

        let content = std::fs::read_to_string(&model_path).map_err(|e| ModelError::Io {
            path: model_path.clone(),
            message: e.to_string(),
        })?;
        let artifact: ClassifierArtifact =
            serde_json::from_str(&content).map_err(|e| ModelError::Format(e.to_string()))?;

        let mut classifier = JsonClassifier::from_artifact(artifact)?;
        classifier.signed = signed;

        tracing::info!(
            "Loaded model from {:?} ({})",
            model_path,
            classifier.describe()
        );

        Ok(classifier)
    }
}

static SHARED_CLASSIFIER: OnceLock<Arc<JsonClassifier>> = OnceLock::new();

/// Load the process-wide classifier once and hand out shared handles.
///
/// The first successful call loads from `path`; later calls return the same
/// handle without touching disk. A failed load is not cached.
///
/// # Errors
/// Returns `ModelError` if the first load fails.
pub fn load_shared(loader: &ModelLoader, path: &Path) -> Result<Arc<JsonClassifier>, ModelError> {
    if let Some(existing) = SHARED_CLASSIFIER.get() {
        return Ok(Arc::clone(existing));
    }
    let loaded = Arc::new(loader.load(path)?);
    Ok(Arc::clone(SHARED_CLASSIFIER.get_or_init(|| loaded)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use ed25519_dalek::{Signer, SigningKey};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn marker_names() -> Vec<String> {
        column_names().iter().map(|s| (*s).to_string()).collect()
    }

    fn logistic_artifact() -> ClassifierArtifact {
        ClassifierArtifact {
            format_version: FORMAT_VERSION,
            feature_names: marker_names(),
            threshold: 0.5,
            estimator: Estimator::Logistic {
                coefficients: vec![2.5; 5],
                intercept: -2.0,
            },
        }
    }

    fn write_model(dir: &Path, artifact: &ClassifierArtifact) -> Vec<u8> {
        let bytes = serde_json::to_vec_pretty(artifact).expect("serialize");
        std::fs::write(dir.join(MODEL_FILE), &bytes).expect("write model");
        bytes
    }

    fn sign_dir(dir: &Path, key: &SigningKey, files: &[(&str, &[u8])]) {
        let manifest = SignedManifest {
            version: manifest::MANIFEST_VERSION,
            serial: 1,
            created_at: manifest::unix_now(),
            nonce_b64: base64::engine::general_purpose::STANDARD.encode([0u8; 16]),
            files: files
                .iter()
                .map(|(n, b)| ((*n).to_string(), manifest::sha256_hex(b)))
                .collect::<BTreeMap<_, _>>(),
        };
        let bytes = serde_json::to_vec(&manifest).expect("serialize manifest");
        std::fs::write(dir.join(manifest::MANIFEST_FILE), &bytes).expect("write manifest");
        std::fs::write(dir.join(manifest::SIGNATURE_FILE), key.sign(&bytes).to_bytes())
            .expect("write signature");
    }

    #[test]
    fn test_predict_thresholds_probability() {
        let model = JsonClassifier::from_artifact(logistic_artifact()).expect("valid");
        let rows = [
            FeatureVector([0, 0, 0, 0, 0]),
            FeatureVector([1, 0, 0, 0, 0]),
            FeatureVector([0, 0, 0, 0, 9]),
        ];
        assert_eq!(model.predict(&rows).expect("predicts"), vec![0, 1, 1]);
    }

    #[test]
    fn test_predict_empty_input() {
        let model = JsonClassifier::from_artifact(logistic_artifact()).expect("valid");
        assert!(model.predict(&[]).expect("predicts").is_empty());
    }

    #[test]
    fn test_permuted_feature_order_is_refused() {
        let mut artifact = logistic_artifact();
        artifact.feature_names.swap(0, 1);
        let err = JsonClassifier::from_artifact(artifact).expect_err("must fail");
        assert!(matches!(err, ModelError::FeatureOrder { .. }));
    }

    #[test]
    fn test_threshold_must_be_a_probability() {
        let mut artifact = logistic_artifact();
        artifact.threshold = 1.0;
        assert!(JsonClassifier::from_artifact(artifact).is_err());
    }

    #[test]
    fn test_threshold_defaults_when_absent() {
        let json = serde_json::json!({
            "format_version": 1,
            "feature_names": marker_names(),
            "estimator": { "kind": "logistic", "coefficients": [1.0, 1.0, 1.0, 1.0, 1.0], "intercept": 0.0 }
        });
        let artifact: ClassifierArtifact = serde_json::from_value(json).expect("parses");
        assert!((artifact.threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unsigned_model_loads_when_allowed() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &logistic_artifact());

        let model = ModelLoader::new()
            .allow_unsigned(true)
            .load(temp.path())
            .expect("loads");
        assert!(!model.is_signed());
    }

    #[test]
    fn test_unsigned_model_refused_by_default() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &logistic_artifact());

        let err = ModelLoader::new().load(temp.path()).expect_err("must fail");
        assert!(matches!(err, ModelError::Signature(_)));
    }

    #[test]
    fn test_signed_model_loads_with_key() {
        let temp = tempdir().expect("tempdir");
        let bytes = write_model(temp.path(), &logistic_artifact());
        let key = SigningKey::from_bytes(&[3u8; 32]);
        sign_dir(temp.path(), &key, &[(MODEL_FILE, &bytes)]);

        let model = ModelLoader::new()
            .with_public_key(key.verifying_key())
            .load(temp.path())
            .expect("loads");
        assert!(model.is_signed());
        assert!(model.describe().contains("signed"));
    }

    #[test]
    fn test_signed_model_without_key_is_refused() {
        let temp = tempdir().expect("tempdir");
        let bytes = write_model(temp.path(), &logistic_artifact());
        let key = SigningKey::from_bytes(&[3u8; 32]);
        sign_dir(temp.path(), &key, &[(MODEL_FILE, &bytes)]);

        // Even with unsigned models allowed, a present signature must verify.
        let err = ModelLoader::new()
            .allow_unsigned(true)
            .load(temp.path())
            .expect_err("must fail");
        assert!(matches!(err, ModelError::Signature(_)));
    }

    #[test]
    fn test_manifest_must_bind_model_file() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &logistic_artifact());
        std::fs::write(temp.path().join("notes.txt"), b"release notes").expect("write");
        let key = SigningKey::from_bytes(&[3u8; 32]);
        sign_dir(temp.path(), &key, &[("notes.txt", b"release notes")]);

        let err = ModelLoader::new()
            .with_public_key(key.verifying_key())
            .load(temp.path())
            .expect_err("must fail");
        assert!(err.to_string().contains("does not bind"));
    }

    #[test]
    fn test_shipped_model_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let model = ModelLoader::new()
            .allow_unsigned(true)
            .load(&path)
            .expect("shipped model loads");

        // All-negative readings must come out low risk.
        assert_eq!(
            model.predict(&[FeatureVector([0; 5])]).expect("predicts"),
            vec![0]
        );
    }

    #[test]
    fn test_load_shared_returns_same_handle() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &logistic_artifact());
        let loader = ModelLoader::new().allow_unsigned(true);

        let first = load_shared(&loader, temp.path()).expect("loads");
        let second = load_shared(&loader, Path::new("/nonexistent")).expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
