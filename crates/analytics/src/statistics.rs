use crate::error::AnalyticsError;
use crate::series::{require_len, validate, value_counts};
use serde::{Deserialize, Serialize};

/// Descriptive statistics for a sample series.
///
/// Quantiles use the linear method: the value at percentile `p` sits at the
/// fractional rank `p/100 * (n - 1)` of the sorted series and is interpolated
/// between the two neighbouring order statistics. Variance is the population
/// variance (divided by `n`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalMetrics {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    /// Every value that attains the highest frequency, in first-seen order.
    pub mode: Vec<f64>,
    pub variance: f64,
    pub standard_deviation: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// `None` below 3 samples or when the series has zero variance.
    pub skewness: Option<f64>,
    /// Excess kurtosis. `None` below 4 samples or when the series has zero variance.
    pub kurtosis: Option<f64>,
}

/// Computes the full set of descriptive statistics.
///
/// Never fails for a non-empty, finite series; the higher moments are simply
/// absent when the series is too short for them.
pub fn compute_statistics(series: &[f64]) -> Result<StatisticalMetrics, AnalyticsError> {
    validate(series)?;

    let mut sorted = series.to_vec();
    sorted.sort_by(f64::total_cmp);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    let moments = Moments::of(series);
    // Rounding can push the running mean a few ulps outside the data.
    let mean = moments.mean().clamp(min, max);
    let variance = moments.variance();
    let standard_deviation = moments.standard_deviation();

    let q1 = percentile(&sorted, 25.0);
    let median = percentile(&sorted, 50.0);
    let q3 = percentile(&sorted, 75.0);

    let n = series.len();
    let skewness = (n >= 3 && moments.has_spread()).then(|| adjusted_skewness(series, &moments));
    let kurtosis = (n >= 4 && moments.has_spread()).then(|| excess_kurtosis(series, &moments));

    tracing::debug!(count = n, mean, standard_deviation, "Computed descriptive statistics.");

    Ok(StatisticalMetrics {
        count: n,
        sum: moments.sum,
        mean,
        median,
        mode: mode(series),
        variance,
        standard_deviation,
        min,
        max,
        range: max - min,
        q1,
        q3,
        iqr: q3 - q1,
        skewness,
        kurtosis,
    })
}

/// Adjusted sample skewness. Requires at least 3 samples and non-zero variance.
pub fn skewness(series: &[f64]) -> Result<f64, AnalyticsError> {
    validate(series)?;
    require_len(series, "skewness", 3)?;
    let moments = Moments::of(series);
    if !moments.has_spread() {
        return Err(AnalyticsError::DegenerateInput("skewness"));
    }
    Ok(adjusted_skewness(series, &moments))
}

/// Adjusted excess kurtosis. Requires at least 4 samples and non-zero variance.
pub fn kurtosis(series: &[f64]) -> Result<f64, AnalyticsError> {
    validate(series)?;
    require_len(series, "kurtosis", 4)?;
    let moments = Moments::of(series);
    if !moments.has_spread() {
        return Err(AnalyticsError::DegenerateInput("kurtosis"));
    }
    Ok(excess_kurtosis(series, &moments))
}

/// Linear-interpolation percentile over an already sorted, non-empty slice.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let (a, b) = (sorted[lower], sorted[upper]);
    let weight = rank - lower as f64;
    (a + (b - a) * weight).clamp(a, b)
}

/// Sum, mean and second central moment gathered in a single pass (Welford).
///
/// The running moments are kept over `x / scale`, where `scale` is a power of
/// two near the largest magnitude. Dividing by a power of two is exact, so
/// ordinary series give the same bits as the unscaled recurrence while values
/// near `f64::MAX` can no longer overflow the deltas.
struct Moments {
    count: usize,
    sum: f64,
    scale: f64,
    mean: f64,
    m2: f64,
}

impl Moments {
    fn of(series: &[f64]) -> Self {
        let scale = power_of_two_scale(series);
        let mut acc = Moments {
            count: 0,
            sum: 0.0,
            scale,
            mean: 0.0,
            m2: 0.0,
        };
        for &value in series {
            let x = value / scale;
            acc.count += 1;
            acc.sum += value;
            let delta = x - acc.mean;
            acc.mean += delta / acc.count as f64;
            acc.m2 += delta * (x - acc.mean);
        }
        acc
    }

    fn mean(&self) -> f64 {
        self.mean * self.scale
    }

    /// Population variance of the scaled values.
    fn scaled_variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.m2 / self.count as f64
    }

    /// May be infinite when the spread exceeds `sqrt(f64::MAX)`.
    fn variance(&self) -> f64 {
        self.scaled_variance() * self.scale * self.scale
    }

    fn standard_deviation(&self) -> f64 {
        self.scaled_variance().sqrt() * self.scale
    }

    fn has_spread(&self) -> bool {
        self.scaled_variance() > 0.0
    }

    /// `(value - mean) / sd`, computed on the scaled values.
    fn standardize(&self, value: f64) -> f64 {
        (value / self.scale - self.mean) / self.scaled_variance().sqrt()
    }
}

/// Largest power of two not above the series' largest magnitude, or 1 for
/// series within `[-1, 1]`.
fn power_of_two_scale(series: &[f64]) -> f64 {
    let largest = series.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if largest <= 1.0 {
        return 1.0;
    }
    // At most 1023 for finite input, so the result stays finite.
    let exponent = largest.log2().floor().min(1023.0) as i32;
    2f64.powi(exponent)
}

fn standardized_power_sum(series: &[f64], moments: &Moments, power: i32) -> f64 {
    series.iter().map(|&x| moments.standardize(x).powi(power)).sum()
}

fn adjusted_skewness(series: &[f64], moments: &Moments) -> f64 {
    let n = series.len() as f64;
    n / ((n - 1.0) * (n - 2.0)) * standardized_power_sum(series, moments, 3)
}

fn excess_kurtosis(series: &[f64], moments: &Moments) -> f64 {
    let n = series.len() as f64;
    let scale = n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0));
    let correction = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    scale * standardized_power_sum(series, moments, 4) - correction
}

fn mode(series: &[f64]) -> Vec<f64> {
    let counts = value_counts(series);
    let top = counts.iter().map(|&(_, c)| c).max().unwrap_or(0);
    counts
        .into_iter()
        .filter(|&(_, c)| c == top)
        .map(|(v, _)| v)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn basic_statistics_for_small_series() {
        let stats = compute_statistics(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_eq!(stats.count, 5);
        assert_eq!(stats.sum, 15.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.range, 4.0);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.iqr, 2.0);
        assert!(close(stats.variance, 2.0));
        assert!(close(stats.standard_deviation, 2.0_f64.sqrt()));
        assert!(close(stats.skewness.unwrap(), 0.0));
        assert_eq!(stats.mode, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn quartiles_interpolate_between_order_statistics() {
        // ranks: q1 at 0.75, median at 1.5, q3 at 2.25
        let stats = compute_statistics(&[10.0, 40.0, 20.0, 30.0]).unwrap();
        assert!(close(stats.q1, 17.5));
        assert!(close(stats.median, 25.0));
        assert!(close(stats.q3, 32.5));
        assert!(close(stats.iqr, 15.0));
    }

    #[test]
    fn mode_returns_every_tied_value() {
        let stats = compute_statistics(&[4.0, 1.0, 4.0, 2.0, 1.0, 3.0]).unwrap();
        assert_eq!(stats.mode, vec![4.0, 1.0]);
    }

    #[test]
    fn empty_series_is_rejected() {
        assert_eq!(compute_statistics(&[]), Err(AnalyticsError::EmptyInput));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert_eq!(
            compute_statistics(&[1.0, f64::NEG_INFINITY]),
            Err(AnalyticsError::NonFiniteInput { index: 1 })
        );
    }

    #[test]
    fn single_value_has_no_higher_moments() {
        let stats = compute_statistics(&[7.5]).unwrap();
        assert_eq!(stats.mean, 7.5);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.q1, 7.5);
        assert_eq!(stats.q3, 7.5);
        assert_eq!(stats.skewness, None);
        assert_eq!(stats.kurtosis, None);
    }

    #[test]
    fn constant_series_keeps_mean_exact() {
        let stats = compute_statistics(&[0.1, 0.1, 0.1, 0.1]).unwrap();
        assert_eq!(stats.mean, 0.1);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.skewness, None);
        assert_eq!(stats.kurtosis, None);
    }

    #[test]
    fn standalone_moments_enforce_minimum_length() {
        assert_eq!(
            skewness(&[1.0, 2.0]),
            Err(AnalyticsError::InsufficientData {
                analysis: "skewness",
                required: 3,
                actual: 2
            })
        );
        assert_eq!(
            kurtosis(&[1.0, 2.0, 3.0]),
            Err(AnalyticsError::InsufficientData {
                analysis: "kurtosis",
                required: 4,
                actual: 3
            })
        );
        assert_eq!(
            kurtosis(&[2.0, 2.0, 2.0, 2.0]),
            Err(AnalyticsError::DegenerateInput("kurtosis"))
        );
    }

    #[test]
    fn right_skewed_series_has_positive_skewness() {
        let series = [1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 10.0];
        let skew = skewness(&series).unwrap();
        assert!(skew > 1.0, "expected strong right skew, got {skew}");
        assert_eq!(compute_statistics(&series).unwrap().skewness, Some(skew));
    }

    #[test]
    fn uniform_like_series_has_negative_excess_kurtosis() {
        let series: Vec<f64> = (1..=10).map(f64::from).collect();
        assert!(kurtosis(&series).unwrap() < 0.0);
    }

    #[test]
    fn repeated_computation_is_bit_identical() {
        let series = [3.25, -1.5, 8.0, 8.0, 0.125, 42.0, -7.75];
        let first = compute_statistics(&series).unwrap();
        let second = compute_statistics(&series).unwrap();
        assert_eq!(first.mean.to_bits(), second.mean.to_bits());
        assert_eq!(first.variance.to_bits(), second.variance.to_bits());
        assert_eq!(first.skewness.map(f64::to_bits), second.skewness.map(f64::to_bits));
        assert_eq!(first, second);
    }

    #[test]
    fn values_near_the_float_limit_keep_a_finite_mean() {
        let stats = compute_statistics(&[1e308, -1e308, 1e308]).unwrap();

        assert!(stats.mean.is_finite());
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert!((stats.mean / 1e308 - 1.0 / 3.0).abs() < 1e-12);
        assert!(!stats.variance.is_nan());
        assert!(stats.standard_deviation.is_finite());
        assert!(stats.skewness.is_some_and(f64::is_finite));
    }

    proptest! {
        #[test]
        fn location_invariants_hold_across_the_finite_range(
            series in prop::collection::vec(prop::num::f64::NORMAL | prop::num::f64::ZERO, 1..100)
        ) {
            let stats = compute_statistics(&series).unwrap();
            prop_assert!(stats.mean.is_finite());
            prop_assert!(stats.min <= stats.mean && stats.mean <= stats.max);
            prop_assert!(stats.q1 <= stats.median && stats.median <= stats.q3);
            prop_assert!(stats.variance >= 0.0);
            prop_assert!(!stats.standard_deviation.is_nan());
        }

        #[test]
        fn location_invariants_hold(series in prop::collection::vec(-1.0e6..1.0e6f64, 1..200)) {
            let stats = compute_statistics(&series).unwrap();
            prop_assert!(stats.min <= stats.mean && stats.mean <= stats.max);
            prop_assert!(stats.q1 <= stats.median && stats.median <= stats.q3);
            prop_assert!(stats.variance >= 0.0);
            prop_assert_eq!(stats.range, stats.max - stats.min);
            prop_assert_eq!(stats.iqr, stats.q3 - stats.q1);
            prop_assert!(!stats.mode.is_empty());
        }
    }
}
