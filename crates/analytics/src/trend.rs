use crate::error::AnalyticsError;
use crate::series::{require_len, validate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slopes with a smaller magnitude than this are reported as `stable`.
pub const STABLE_SLOPE_THRESHOLD: f64 = 0.01;

/// Number of forward-extrapolated values in a trend prediction.
pub const PREDICTION_HORIZON: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => f.write_str("increasing"),
            TrendDirection::Decreasing => f.write_str("decreasing"),
            TrendDirection::Stable => f.write_str("stable"),
        }
    }
}

/// How well the fitted line explains the series, bucketed from R².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    fn from_r_squared(r_squared: f64) -> Self {
        if r_squared > 0.7 {
            Confidence::High
        } else if r_squared > 0.4 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// An ordinary least-squares fit of the series against its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to `[0, 1]`.
    pub r_squared: f64,
    pub direction: TrendDirection,
    /// Percentage change from the first to the last sample. `None` when the
    /// first sample is zero and the rate is therefore unavailable.
    pub change_rate: Option<f64>,
    pub confidence: Confidence,
    pub prediction: Vec<f64>,
}

/// Fits `y = slope * x + intercept` with `x = 0..n`.
pub fn compute_trend(series: &[f64]) -> Result<TrendAnalysis, AnalyticsError> {
    validate(series)?;
    require_len(series, "trend analysis", 2)?;

    let n = series.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in series.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let first = series[0];
    let last = series[series.len() - 1];
    let is_constant = series.iter().all(|&y| y == first);

    let (slope, intercept, r_squared) = if is_constant {
        (0.0, first, 1.0)
    } else {
        let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
        let intercept = (sum_y - slope * sum_x) / n;

        let mean_y = sum_y / n;
        let (mut ss_total, mut ss_residual) = (0.0, 0.0);
        for (i, &y) in series.iter().enumerate() {
            let predicted = slope * i as f64 + intercept;
            ss_total += (y - mean_y).powi(2);
            ss_residual += (y - predicted).powi(2);
        }
        let r_squared = if ss_total == 0.0 {
            1.0
        } else {
            (1.0 - ss_residual / ss_total).clamp(0.0, 1.0)
        };
        (slope, intercept, r_squared)
    };

    let direction = if slope.abs() < STABLE_SLOPE_THRESHOLD {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    let change_rate = (first != 0.0).then(|| (last - first) / first * 100.0);
    if change_rate.is_none() {
        tracing::debug!("First sample is zero; change rate is unavailable.");
    }

    let len = series.len();
    let prediction = (len..len + PREDICTION_HORIZON)
        .map(|x| slope * x as f64 + intercept)
        .collect();

    Ok(TrendAnalysis {
        slope,
        intercept,
        r_squared,
        direction,
        change_rate,
        confidence: Confidence::from_r_squared(r_squared),
        prediction,
    })
}
