use crate::enums::AnalysisType;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Z-score above which a sample is flagged by the anomaly detector.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.5;

/// Number of equal-width buckets in a frequency histogram.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Upper bound on histogram buckets accepted from a request or the config.
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

/// Optional tuning parameters as they travel on the wire.
///
/// Only the options relevant to the requested analysis are read; the rest are
/// ignored when the request is converted into an [`AnalysisKind`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
}

/// An analysis together with the options that apply to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisKind {
    Statistical,
    Trend,
    Anomaly { z_threshold: f64 },
    Frequency { bins: usize },
    Basic,
}

impl AnalysisKind {
    /// Anomaly detection with the default z-score threshold.
    pub fn anomaly() -> Self {
        AnalysisKind::Anomaly {
            z_threshold: DEFAULT_Z_THRESHOLD,
        }
    }

    /// Frequency analysis with the default histogram size.
    pub fn frequency() -> Self {
        AnalysisKind::Frequency {
            bins: DEFAULT_HISTOGRAM_BINS,
        }
    }

    /// Builds a typed kind from its wire representation, validating the options
    /// that the kind actually uses.
    pub fn from_parts(analysis_type: AnalysisType, options: &AnalysisOptions) -> Result<Self, CoreError> {
        let kind = match analysis_type {
            AnalysisType::Statistical => AnalysisKind::Statistical,
            AnalysisType::Trend => AnalysisKind::Trend,
            AnalysisType::Basic => AnalysisKind::Basic,
            AnalysisType::Anomaly => {
                let z_threshold = options.threshold.unwrap_or(DEFAULT_Z_THRESHOLD);
                if !z_threshold.is_finite() || z_threshold <= 0.0 {
                    return Err(CoreError::InvalidInput(
                        "threshold".to_string(),
                        format!("must be a positive finite number, got {z_threshold}"),
                    ));
                }
                AnalysisKind::Anomaly { z_threshold }
            }
            AnalysisType::Frequency => {
                let bins = options.bins.unwrap_or(DEFAULT_HISTOGRAM_BINS);
                if !(1..=MAX_HISTOGRAM_BINS).contains(&bins) {
                    return Err(CoreError::InvalidInput(
                        "bins".to_string(),
                        format!("must be between 1 and {MAX_HISTOGRAM_BINS}, got {bins}"),
                    ));
                }
                AnalysisKind::Frequency { bins }
            }
        };
        Ok(kind)
    }

    pub fn analysis_type(&self) -> AnalysisType {
        match self {
            AnalysisKind::Statistical => AnalysisType::Statistical,
            AnalysisKind::Trend => AnalysisType::Trend,
            AnalysisKind::Anomaly { .. } => AnalysisType::Anomaly,
            AnalysisKind::Frequency { .. } => AnalysisType::Frequency,
            AnalysisKind::Basic => AnalysisType::Basic,
        }
    }

    /// The wire options that reproduce this kind.
    pub fn options(&self) -> AnalysisOptions {
        match *self {
            AnalysisKind::Anomaly { z_threshold } => AnalysisOptions {
                threshold: Some(z_threshold),
                bins: None,
            },
            AnalysisKind::Frequency { bins } => AnalysisOptions {
                threshold: None,
                bins: Some(bins),
            },
            _ => AnalysisOptions::default(),
        }
    }
}

/// A single analysis to run over one sample series. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireAnalysisRequest", into = "WireAnalysisRequest")]
pub struct AnalysisRequest {
    series: Vec<f64>,
    kind: AnalysisKind,
}

impl AnalysisRequest {
    pub fn new(series: Vec<f64>, kind: AnalysisKind) -> Self {
        Self { series, kind }
    }

    pub fn series(&self) -> &[f64] {
        &self.series
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn analysis_type(&self) -> AnalysisType {
        self.kind.analysis_type()
    }
}

/// The JSON shape shared with the remote analysis service:
/// `{"data": [...], "analysisType": "...", "options": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnalysisRequest {
    data: Vec<f64>,
    analysis_type: AnalysisType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<AnalysisOptions>,
}

impl TryFrom<WireAnalysisRequest> for AnalysisRequest {
    type Error = CoreError;

    fn try_from(wire: WireAnalysisRequest) -> Result<Self, Self::Error> {
        let options = wire.options.unwrap_or_default();
        let kind = AnalysisKind::from_parts(wire.analysis_type, &options)?;
        Ok(AnalysisRequest::new(wire.data, kind))
    }
}

impl From<AnalysisRequest> for WireAnalysisRequest {
    fn from(request: AnalysisRequest) -> Self {
        let options = request.kind.options();
        let options = (options != AnalysisOptions::default()).then_some(options);
        Self {
            data: request.series,
            analysis_type: request.kind.analysis_type(),
            options,
        }
    }
}
