use crate::error::AnalyticsError;
use crate::series::{require_len, validate};
use crate::statistics::compute_statistics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multiplier applied to the interquartile range to build the outlier fences.
pub const IQR_FENCE_MULTIPLIER: f64 = 1.5;

/// Z-scores above this are rated `high` rather than `medium`.
pub const HIGH_SEVERITY_Z: f64 = 3.0;

pub const METHOD_TAG: &str = "iqr_zscore";

/// Which outlier rules flagged a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyType {
    #[serde(rename = "iqr_outlier")]
    IqrOutlier,
    #[serde(rename = "z_score")]
    ZScore,
    #[serde(rename = "iqr_outlier,z_score")]
    IqrOutlierAndZScore,
}

/// Ordered so that `max` picks the more severe rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => f.write_str("low"),
            Severity::Medium => f.write_str("medium"),
            Severity::High => f.write_str("high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub index: usize,
    pub value: f64,
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub z_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    pub iqr: IqrBounds,
    pub zscore: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub anomalies: Vec<Anomaly>,
    /// Share of samples flagged, in percent.
    pub anomaly_rate: f64,
    pub method: String,
    pub thresholds: AnomalyThresholds,
}

impl AnomalyReport {
    /// The most severe rating among the flagged samples, if any were flagged.
    pub fn max_severity(&self) -> Option<Severity> {
        self.anomalies.iter().map(|a| a.severity).max()
    }
}

/// Flags samples outside the IQR fences or with a z-score above `z_threshold`.
///
/// A sample flagged by both rules appears once, with the merged type and the
/// higher of the two severities. On a zero-variance series every z-score is 0.
pub fn detect_anomalies(series: &[f64], z_threshold: f64) -> Result<AnomalyReport, AnalyticsError> {
    validate(series)?;
    require_len(series, "anomaly detection", 3)?;
    if !z_threshold.is_finite() || z_threshold <= 0.0 {
        return Err(AnalyticsError::InvalidOption(format!(
            "z-score threshold must be a positive finite number, got {z_threshold}"
        )));
    }

    let stats = compute_statistics(series)?;
    let bounds = IqrBounds {
        lower: stats.q1 - IQR_FENCE_MULTIPLIER * stats.iqr,
        upper: stats.q3 + IQR_FENCE_MULTIPLIER * stats.iqr,
    };

    let anomalies: Vec<Anomaly> = series
        .iter()
        .enumerate()
        .filter_map(|(index, &value)| {
            let z_score = if stats.standard_deviation > 0.0 {
                ((value - stats.mean) / stats.standard_deviation).abs()
            } else {
                0.0
            };

            let iqr_hit = (value < bounds.lower || value > bounds.upper).then_some(Severity::Medium);
            let z_hit = (z_score > z_threshold).then(|| {
                if z_score > HIGH_SEVERITY_Z {
                    Severity::High
                } else {
                    Severity::Medium
                }
            });

            let (anomaly_type, severity) = match (iqr_hit, z_hit) {
                (Some(a), Some(b)) => (AnomalyType::IqrOutlierAndZScore, a.max(b)),
                (Some(a), None) => (AnomalyType::IqrOutlier, a),
                (None, Some(b)) => (AnomalyType::ZScore, b),
                (None, None) => return None,
            };

            Some(Anomaly {
                index,
                value,
                anomaly_type,
                severity,
                z_score,
            })
        })
        .collect();

    let anomaly_rate = anomalies.len() as f64 / series.len() as f64 * 100.0;
    tracing::debug!(
        flagged = anomalies.len(),
        anomaly_rate,
        lower = bounds.lower,
        upper = bounds.upper,
        "Anomaly detection finished."
    );

    Ok(AnomalyReport {
        anomalies,
        anomaly_rate,
        method: METHOD_TAG.to_string(),
        thresholds: AnomalyThresholds {
            iqr: bounds,
            zscore: z_threshold,
        },
    })
}
