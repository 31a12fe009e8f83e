//! Application layer: Use cases and services.
//!
//! Orchestrates domain validation with the transformer and classifier ports.

mod analysis;

pub use analysis::{AnalysisError, AnalysisService, Stage, GENERIC_FAILURE_MESSAGE};
