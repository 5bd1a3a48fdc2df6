//! # Insight Core Types
//!
//! The request-side vocabulary shared by every other crate in the workspace.
//! Nothing in here computes anything; it only names the analyses, their
//! options, and which path produced a result.

pub mod enums;
pub mod error;
pub mod request;

// Re-export the core types to provide a clean public API.
pub use enums::{AnalysisType, ResultSource};
pub use error::CoreError;
pub use request::{
    AnalysisKind, AnalysisOptions, AnalysisRequest, DEFAULT_HISTOGRAM_BINS, DEFAULT_Z_THRESHOLD,
    MAX_HISTOGRAM_BINS,
};
