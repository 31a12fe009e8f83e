//! Adapters layer: Concrete implementations of ports.
//!
//! - `preprocessor`: JSON-fitted column transformer
//! - `forest`: JSON-exported random forest
//! - `artifacts`: startup loading, manifest and signature checks
//! - `sanitize`: measurement redaction for logs

pub mod artifacts;
pub mod forest;
pub mod preprocessor;
pub mod sanitize;

pub use artifacts::{ArtifactError, ArtifactLoader, Artifacts};
