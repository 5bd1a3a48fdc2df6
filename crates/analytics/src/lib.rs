//! # Insight Analytics Engine
//!
//! The pure computation layer: descriptive statistics, OLS trend estimation,
//! anomaly detection, frequency analysis and data-quality scoring over numeric
//! sample series.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of remote
//!   services, files or the network. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** Every engine is a function of its input series.
//!   `AnalysisEngine` only selects which one to run for a request.
//!
//! ## Public API
//!
//! - `AnalysisEngine`: runs the engine selected by an `AnalysisRequest`.
//! - `compute_statistics`, `compute_trend`, `detect_anomalies`, `analyze_frequency`,
//!   `assess_quality`: the individual engines.
//! - `AnalysisPayload` / `AnalysisResult`: the records handed back to callers.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

pub mod anomaly;
pub mod engine;
pub mod error;
pub mod frequency;
pub mod quality;
pub mod result;
mod series;
pub mod statistics;
pub mod trend;

// Re-export the key components to create a clean, public-facing API.
pub use anomaly::{detect_anomalies, Anomaly, AnomalyReport, AnomalyType, Severity};
pub use engine::AnalysisEngine;
pub use error::AnalyticsError;
pub use frequency::{analyze_frequency, DistributionEntry, FrequencyReport, HistogramBin};
pub use quality::{assess_quality, DataQuality};
pub use result::{AnalysisPayload, AnalysisResult, BasicMetrics};
pub use statistics::{compute_statistics, kurtosis, skewness, StatisticalMetrics};
pub use trend::{compute_trend, Confidence, TrendAnalysis, TrendDirection};
