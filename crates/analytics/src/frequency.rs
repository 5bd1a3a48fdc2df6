use crate::error::AnalyticsError;
use crate::series::{validate, value_counts};
use core_types::MAX_HISTOGRAM_BINS;
use serde::{Deserialize, Serialize};

/// How often one exact value occurs in the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub value: f64,
    pub count: usize,
    pub percentage: f64,
}

/// One equal-width bucket of a histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub bin: usize,
    /// `[low, high]` edges; every bucket but the last excludes `high`.
    pub range: [f64; 2],
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyReport {
    /// Sorted by descending count; ties keep first-encountered order.
    pub distribution: Vec<DistributionEntry>,
    pub histogram: Vec<HistogramBin>,
    pub unique_values: usize,
    pub most_frequent: DistributionEntry,
    /// Shannon entropy of the value distribution, in bits.
    pub entropy: f64,
}

/// Builds the exact value distribution, a `bins`-bucket histogram and the
/// Shannon entropy of a series.
///
/// Values are grouped by exact bit pattern; near-duplicates such as
/// `0.1 + 0.2` and `0.3` are deliberately kept apart.
pub fn analyze_frequency(series: &[f64], bins: usize) -> Result<FrequencyReport, AnalyticsError> {
    validate(series)?;
    if bins == 0 {
        return Err(AnalyticsError::InvalidOption(
            "histogram needs at least one bin".to_string(),
        ));
    }
    if bins > MAX_HISTOGRAM_BINS {
        return Err(AnalyticsError::InvalidOption(format!(
            "histogram supports at most {MAX_HISTOGRAM_BINS} bins, got {bins}"
        )));
    }

    let total = series.len() as f64;
    let mut distribution: Vec<DistributionEntry> = value_counts(series)
        .into_iter()
        .map(|(value, count)| DistributionEntry {
            value,
            count,
            percentage: count as f64 / total * 100.0,
        })
        .collect();
    // `sort_by` is stable, so equal counts keep their first-seen order.
    distribution.sort_by(|a, b| b.count.cmp(&a.count));

    let entropy = distribution
        .iter()
        .map(|entry| {
            let p = entry.count as f64 / total;
            p * (1.0 / p).log2()
        })
        .sum();

    let histogram = histogram(series, bins);
    let most_frequent = distribution[0].clone();

    tracing::debug!(
        unique = distribution.len(),
        entropy,
        bins,
        "Frequency analysis finished."
    );

    Ok(FrequencyReport {
        unique_values: distribution.len(),
        distribution,
        histogram,
        most_frequent,
        entropy,
    })
}

/// Splits `[min, max]` into `bins` equal-width buckets.
///
/// A sample at `max` (or pushed past the last edge by rounding) is clamped
/// into the final bucket. A zero-width range puts every sample in bucket 0.
fn histogram(series: &[f64], bins: usize) -> Vec<HistogramBin> {
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &value in series {
        let slot = if width > 0.0 {
            (((value - min) / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        counts[slot] += 1;
    }

    let total = series.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(bin, count)| {
            let low = min + bin as f64 * width;
            let high = if bin == bins - 1 {
                max
            } else {
                min + (bin + 1) as f64 * width
            };
            HistogramBin {
                bin,
                range: [low, high],
                count,
                percentage: count as f64 / total * 100.0,
            }
        })
        .collect()
}
