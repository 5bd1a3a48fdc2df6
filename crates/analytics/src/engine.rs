use crate::anomaly::detect_anomalies;
use crate::error::AnalyticsError;
use crate::frequency::analyze_frequency;
use crate::quality::assess_quality;
use crate::result::{AnalysisPayload, BasicMetrics};
use crate::statistics::compute_statistics;
use crate::trend::compute_trend;
use core_types::{AnalysisKind, AnalysisRequest};

/// A stateless calculator that runs one analysis over one series.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalysisEngine {}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point: runs the engine selected by the request's kind.
    ///
    /// # Arguments
    ///
    /// * `request` - The series and the analysis (with its options) to run.
    ///
    /// # Returns
    ///
    /// A `Result` containing the kind-specific `AnalysisPayload` or an `AnalyticsError`.
    pub fn run(&self, request: &AnalysisRequest) -> Result<AnalysisPayload, AnalyticsError> {
        let series = request.series();
        let payload = match request.kind() {
            AnalysisKind::Statistical => AnalysisPayload::Statistical(compute_statistics(series)?),
            AnalysisKind::Trend => AnalysisPayload::Trend(compute_trend(series)?),
            AnalysisKind::Anomaly { z_threshold } => {
                AnalysisPayload::Anomaly(detect_anomalies(series, z_threshold)?)
            }
            AnalysisKind::Frequency { bins } => AnalysisPayload::Frequency(analyze_frequency(series, bins)?),
            AnalysisKind::Basic => AnalysisPayload::Basic(self.basic_metrics(series)?),
        };
        Ok(payload)
    }

    /// Statistics, plus a trend when the series has at least two samples, plus
    /// data-quality scores.
    pub fn basic_metrics(&self, series: &[f64]) -> Result<BasicMetrics, AnalyticsError> {
        let statistics = compute_statistics(series)?;
        let trend = if series.len() > 1 {
            Some(compute_trend(series)?)
        } else {
            None
        };
        Ok(BasicMetrics {
            statistics,
            trend,
            data_quality: assess_quality(series)?,
        })
    }
}
