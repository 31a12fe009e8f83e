//! # Somnolens
//!
//! Sleep-disorder screening from lifestyle and vital-sign measurements.
//!
//! A request is validated against a fixed input schema, encoded by a fitted
//! column transformer, classified by a fitted random forest, and mapped to a
//! named disorder with display colour and recommendations. The fitted
//! artifacts are loaded once at startup and shared read-only.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Input schema, validation, feature records, disorder results
//! - `ports`: Transformer and classifier traits
//! - `adapters`: JSON artifact implementations, loader, log redaction
//! - `application`: The analysis pipeline
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{ArtifactError, ArtifactLoader, Artifacts};
pub use application::{AnalysisError, AnalysisService, Stage};
pub use config::{Config, ConfigError};
pub use domain::{Assessment, Disorder, DisorderResult, RawInput, ValidatedInput};

/// Result type for Somnolens operations
pub type Result<T> = std::result::Result<T, SomnolensError>;

/// Main error type for Somnolens
#[derive(Debug, thiserror::Error)]
pub enum SomnolensError {
    #[error("Artifact loading failed: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
