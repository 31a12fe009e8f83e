//! Artifact loading: reads the fitted transformer and classifier once at
//! startup, checks integrity and shape compatibility, and hands out shared
//! read-only handles.

pub mod manifest;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ed25519_dalek::VerifyingKey;

use crate::adapters::forest::RandomForest;
use crate::adapters::preprocessor::FittedPreprocessor;
use crate::config::{Config, DEFAULT_CLASSIFIER_FILE, DEFAULT_TRANSFORMER_FILE};
use crate::domain::RECORD_COLUMNS;
use crate::ports::{Classifier, FeatureTransformer};

use manifest::{ArtifactManifest, MANIFEST_FILE, SIGNATURE_FILE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Transformer,
    Classifier,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transformer => f.write_str("transformer"),
            Self::Classifier => f.write_str("classifier"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact missing or unreadable at {path:?}: {source}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{artifact} artifact incompatible: {reason}")]
    Incompatible {
        artifact: ArtifactKind,
        reason: String,
    },

    #[error("artifact integrity check failed: {0}")]
    Integrity(String),
}

impl ArtifactError {
    fn incompatible(artifact: ArtifactKind, reason: impl Into<String>) -> Self {
        Self::Incompatible {
            artifact,
            reason: reason.into(),
        }
    }
}

/// Loaded artifact pair. Immutable; clone the `Arc`s to share.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub transformer: Arc<FittedPreprocessor>,
    pub classifier: Arc<RandomForest>,
    /// Whether a signed manifest was verified for this pair.
    pub verified: bool,
}

impl Artifacts {
    #[must_use]
    pub fn into_parts(self) -> (Arc<FittedPreprocessor>, Arc<RandomForest>) {
        (self.transformer, self.classifier)
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    dir: PathBuf,
    transformer_file: String,
    classifier_file: String,
    verifying_key: Option<VerifyingKey>,
    require_signature: bool,
}

impl ArtifactLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            transformer_file: DEFAULT_TRANSFORMER_FILE.to_string(),
            classifier_file: DEFAULT_CLASSIFIER_FILE.to_string(),
            verifying_key: None,
            require_signature: false,
        }
    }

    /// Loader for the configured directory, file names and signature policy.
    ///
    /// # Errors
    /// Returns `Integrity` if the configured public key cannot be decoded.
    pub fn from_config(config: &Config) -> Result<Self, ArtifactError> {
        let mut loader = Self::new(&config.artifact_dir)
            .with_file_names(&config.transformer_file, &config.classifier_file)
            .require_signature(config.require_signed_artifacts);
        if let Some(b64) = &config.artifact_pubkey_b64 {
            let key = manifest::verifying_key_from_b64(b64).map_err(ArtifactError::Integrity)?;
            loader = loader.with_verifying_key(key);
        }
        Ok(loader)
    }

    #[must_use]
    pub fn with_file_names(mut self, transformer: &str, classifier: &str) -> Self {
        self.transformer_file = transformer.to_string();
        self.classifier_file = classifier.to_string();
        self
    }

    #[must_use]
    pub fn with_verifying_key(mut self, key: VerifyingKey) -> Self {
        self.verifying_key = Some(key);
        self
    }

    #[must_use]
    pub fn require_signature(mut self, require: bool) -> Self {
        self.require_signature = require;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load, verify and cross-check both artifacts.
    ///
    /// # Errors
    /// - `Missing` if a file is absent or unreadable.
    /// - `Integrity` if the manifest or signature does not check out, or a
    ///   signature is required and absent.
    /// - `Incompatible` if an artifact cannot be parsed or does not fit the
    ///   record schema or the other artifact.
    pub fn load(&self) -> Result<Artifacts, ArtifactError> {
        let transformer_bytes = self.read(&self.transformer_file)?;
        let classifier_bytes = self.read(&self.classifier_file)?;

        let verified = self.verify(&[
            (self.transformer_file.as_str(), transformer_bytes.as_slice()),
            (self.classifier_file.as_str(), classifier_bytes.as_slice()),
        ])?;

        let transformer: FittedPreprocessor = serde_json::from_slice(&transformer_bytes)
            .map_err(|e| ArtifactError::incompatible(ArtifactKind::Transformer, e.to_string()))?;
        transformer
            .check_compatible(&RECORD_COLUMNS)
            .map_err(|e| ArtifactError::incompatible(ArtifactKind::Transformer, e))?;

        let classifier: RandomForest = serde_json::from_slice(&classifier_bytes)
            .map_err(|e| ArtifactError::incompatible(ArtifactKind::Classifier, e.to_string()))?;
        classifier
            .check()
            .map_err(|e| ArtifactError::incompatible(ArtifactKind::Classifier, e))?;

        if classifier.input_width() != transformer.output_width() {
            return Err(ArtifactError::incompatible(
                ArtifactKind::Classifier,
                format!(
                    "expects {} features, transformer produces {}",
                    classifier.input_width(),
                    transformer.output_width()
                ),
            ));
        }

        tracing::info!(
            dir = ?self.dir,
            features = transformer.output_width(),
            trees = classifier.trees.len(),
            classes = classifier.classes().len(),
            verified,
            "artifacts loaded"
        );

        Ok(Artifacts {
            transformer: Arc::new(transformer),
            classifier: Arc::new(classifier),
            verified,
        })
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = self.dir.join(name);
        std::fs::read(&path).map_err(|source| ArtifactError::Missing { path, source })
    }

    fn read_optional(&self, name: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
        let path = self.dir.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ArtifactError::Integrity(format!(
                "failed to read {path:?}: {e}"
            ))),
        }
    }

    /// Returns whether a signature was verified.
    fn verify(&self, loaded: &[(&str, &[u8])]) -> Result<bool, ArtifactError> {
        let Some(manifest_bytes) = self.read_optional(MANIFEST_FILE)? else {
            if self.require_signature {
                return Err(ArtifactError::Integrity(format!(
                    "signed artifacts required but {MANIFEST_FILE} is absent"
                )));
            }
            tracing::warn!(dir = ?self.dir, "loading artifacts without a manifest");
            return Ok(false);
        };

        let manifest = ArtifactManifest::parse(&manifest_bytes).map_err(ArtifactError::Integrity)?;
        manifest.check_files(loaded).map_err(ArtifactError::Integrity)?;

        let signature = self.read_optional(SIGNATURE_FILE)?;
        match (signature, &self.verifying_key) {
            (Some(sig), Some(key)) => {
                manifest::verify_signature(key, &manifest_bytes, &sig)
                    .map_err(ArtifactError::Integrity)?;
                tracing::debug!("artifact manifest signature verified");
                Ok(true)
            }
            (None, _) if self.require_signature => Err(ArtifactError::Integrity(format!(
                "signed artifacts required but {SIGNATURE_FILE} is absent"
            ))),
            (Some(_), None) if self.require_signature => Err(ArtifactError::Integrity(
                "signed artifacts required but no verifying key is configured".into(),
            )),
            _ => {
                tracing::warn!(
                    dir = ?self.dir,
                    "artifact hashes match manifest but signature was not verified"
                );
                Ok(false)
            }
        }
    }
}
