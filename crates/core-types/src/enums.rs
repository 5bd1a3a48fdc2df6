use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five analyses the platform knows how to run, without their options.
///
/// This is the key used on the wire (`analysisType`) and in report maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Statistical,
    Trend,
    Anomaly,
    Frequency,
    Basic,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 5] = [
        AnalysisType::Statistical,
        AnalysisType::Trend,
        AnalysisType::Anomaly,
        AnalysisType::Frequency,
        AnalysisType::Basic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Statistical => "statistical",
            AnalysisType::Trend => "trend",
            AnalysisType::Anomaly => "anomaly",
            AnalysisType::Frequency => "frequency",
            AnalysisType::Basic => "basic",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::InvalidInput("analysis type".to_string(), s.to_string()))
    }
}

/// Which execution path produced an analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Remote,
    Local,
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSource::Remote => f.write_str("remote"),
            ResultSource::Local => f.write_str("local"),
        }
    }
}
