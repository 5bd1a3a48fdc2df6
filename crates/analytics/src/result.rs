use crate::anomaly::AnomalyReport;
use crate::frequency::FrequencyReport;
use crate::quality::DataQuality;
use crate::statistics::StatisticalMetrics;
use crate::trend::TrendAnalysis;
use chrono::{DateTime, Utc};
use core_types::{AnalysisType, ResultSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a `basic` analysis: statistics, a trend when there are at least
/// two samples, and data-quality scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicMetrics {
    pub statistics: StatisticalMetrics,
    pub trend: Option<TrendAnalysis>,
    pub data_quality: DataQuality,
}

/// The kind-specific record carried by a successful analysis.
///
/// Serialized without a tag; the surrounding result names the analysis type,
/// and [`AnalysisPayload::from_value`] uses it to decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisPayload {
    Statistical(StatisticalMetrics),
    Trend(TrendAnalysis),
    Anomaly(AnomalyReport),
    Frequency(FrequencyReport),
    Basic(BasicMetrics),
}

impl AnalysisPayload {
    pub fn analysis_type(&self) -> AnalysisType {
        match self {
            AnalysisPayload::Statistical(_) => AnalysisType::Statistical,
            AnalysisPayload::Trend(_) => AnalysisType::Trend,
            AnalysisPayload::Anomaly(_) => AnalysisType::Anomaly,
            AnalysisPayload::Frequency(_) => AnalysisType::Frequency,
            AnalysisPayload::Basic(_) => AnalysisType::Basic,
        }
    }

    /// Decodes an untyped JSON payload as the record for `analysis_type`.
    pub fn from_value(analysis_type: AnalysisType, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match analysis_type {
            AnalysisType::Statistical => AnalysisPayload::Statistical(serde_json::from_value(value)?),
            AnalysisType::Trend => AnalysisPayload::Trend(serde_json::from_value(value)?),
            AnalysisType::Anomaly => AnalysisPayload::Anomaly(serde_json::from_value(value)?),
            AnalysisType::Frequency => AnalysisPayload::Frequency(serde_json::from_value(value)?),
            AnalysisType::Basic => AnalysisPayload::Basic(serde_json::from_value(value)?),
        })
    }

    pub fn as_statistical(&self) -> Option<&StatisticalMetrics> {
        match self {
            AnalysisPayload::Statistical(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn as_trend(&self) -> Option<&TrendAnalysis> {
        match self {
            AnalysisPayload::Trend(trend) => Some(trend),
            _ => None,
        }
    }

    pub fn as_anomaly(&self) -> Option<&AnomalyReport> {
        match self {
            AnalysisPayload::Anomaly(report) => Some(report),
            _ => None,
        }
    }

    pub fn as_frequency(&self) -> Option<&FrequencyReport> {
        match self {
            AnalysisPayload::Frequency(report) => Some(report),
            _ => None,
        }
    }

    pub fn as_basic(&self) -> Option<&BasicMetrics> {
        match self {
            AnalysisPayload::Basic(metrics) => Some(metrics),
            _ => None,
        }
    }
}

/// The terminal outcome of one analysis request.
///
/// Built once through [`AnalysisResult::success`] or [`AnalysisResult::failure`]
/// and read through accessors afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireAnalysisResult", into = "WireAnalysisResult")]
pub struct AnalysisResult {
    analysis_type: AnalysisType,
    payload: Option<AnalysisPayload>,
    error: Option<String>,
    generated_at: DateTime<Utc>,
    source: ResultSource,
}

impl AnalysisResult {
    pub fn success(payload: AnalysisPayload, source: ResultSource) -> Self {
        Self {
            analysis_type: payload.analysis_type(),
            payload: Some(payload),
            error: None,
            generated_at: Utc::now(),
            source,
        }
    }

    pub fn failure(analysis_type: AnalysisType, error: impl Into<String>, source: ResultSource) -> Self {
        Self {
            analysis_type,
            payload: None,
            error: Some(error.into()),
            generated_at: Utc::now(),
            source,
        }
    }

    /// The same outcome attributed to a different execution path.
    pub fn attributed_to(self, source: ResultSource) -> Self {
        Self { source, ..self }
    }

    pub fn is_success(&self) -> bool {
        self.payload.is_some()
    }

    pub fn analysis_type(&self) -> AnalysisType {
        self.analysis_type
    }

    pub fn payload(&self) -> Option<&AnalysisPayload> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<AnalysisPayload> {
        self.payload
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn source(&self) -> ResultSource {
        self.source
    }
}

/// The JSON shape exchanged with the remote analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnalysisResult {
    success: bool,
    analysis_type: AnalysisType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    #[serde(default = "remote_source")]
    source: WireSource,
}

fn remote_source() -> WireSource {
    WireSource::Remote
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireSource {
    Remote,
    #[serde(alias = "client-side")]
    Local,
}

impl TryFrom<WireAnalysisResult> for AnalysisResult {
    type Error = String;

    fn try_from(wire: WireAnalysisResult) -> Result<Self, Self::Error> {
        let source = match wire.source {
            WireSource::Remote => ResultSource::Remote,
            WireSource::Local => ResultSource::Local,
        };

        let payload = if wire.success {
            let value = wire
                .result
                .ok_or_else(|| "successful result is missing its payload".to_string())?;
            let payload = AnalysisPayload::from_value(wire.analysis_type, value)
                .map_err(|e| format!("malformed {} payload: {e}", wire.analysis_type))?;
            Some(payload)
        } else {
            None
        };

        let error = match (&payload, wire.error) {
            (None, None) => Some("analysis failed without an error message".to_string()),
            (_, error) => error,
        };

        Ok(AnalysisResult {
            analysis_type: wire.analysis_type,
            payload,
            error,
            generated_at: wire.timestamp,
            source,
        })
    }
}

impl From<AnalysisResult> for WireAnalysisResult {
    fn from(result: AnalysisResult) -> Self {
        let encoded = result.payload.as_ref().map(serde_json::to_value).transpose();
        let (result_value, error) = wire_payload(result.analysis_type, encoded, result.error);
        Self {
            success: result_value.is_some(),
            analysis_type: result.analysis_type,
            result: result_value,
            error,
            timestamp: result.generated_at,
            source: match result.source {
                ResultSource::Remote => WireSource::Remote,
                ResultSource::Local => WireSource::Local,
            },
        }
    }
}

/// A payload that fails to encode turns the wire record into a failure, so
/// `success` and `result` never disagree.
fn wire_payload(
    analysis_type: AnalysisType,
    encoded: Result<Option<Value>, serde_json::Error>,
    error: Option<String>,
) -> (Option<Value>, Option<String>) {
    match encoded {
        Ok(value) => (value, error),
        Err(e) => {
            tracing::warn!(%analysis_type, error = %e, "Failed to encode analysis payload.");
            (None, Some(format!("failed to encode {analysis_type} payload: {e}")))
        }
    }
}
