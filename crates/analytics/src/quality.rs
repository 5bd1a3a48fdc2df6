use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Coarse data-quality scores, each a percentage of the series length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Samples that are present (not NaN).
    pub completeness: f64,
    /// Samples that are finite numbers.
    pub validity: f64,
    /// Samples that are not an exact repeat of an earlier sample.
    pub uniqueness: f64,
}

/// Scores a raw series. Unlike the engines, this accepts non-finite values,
/// since counting them is the point.
pub fn assess_quality(series: &[f64]) -> Result<DataQuality, AnalyticsError> {
    if series.is_empty() {
        return Err(AnalyticsError::EmptyInput);
    }

    let total = series.len() as f64;
    let present = series.iter().filter(|v| !v.is_nan()).count();
    let finite = series.iter().filter(|v| v.is_finite()).count();
    let distinct: HashSet<u64> = series.iter().map(|v| v.to_bits()).collect();

    Ok(DataQuality {
        completeness: present as f64 / total * 100.0,
        validity: finite as f64 / total * 100.0,
        uniqueness: distinct.len() as f64 / total * 100.0,
    })
}
