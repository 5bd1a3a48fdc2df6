use crate::error::AnalyticsError;
use std::collections::HashMap;

/// Rejects empty series and series containing NaN or infinities.
pub(crate) fn validate(series: &[f64]) -> Result<(), AnalyticsError> {
    if series.is_empty() {
        return Err(AnalyticsError::EmptyInput);
    }
    match series.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(AnalyticsError::NonFiniteInput { index }),
        None => Ok(()),
    }
}

pub(crate) fn require_len(
    series: &[f64],
    analysis: &'static str,
    required: usize,
) -> Result<(), AnalyticsError> {
    if series.len() < required {
        return Err(AnalyticsError::InsufficientData {
            analysis,
            required,
            actual: series.len(),
        });
    }
    Ok(())
}

/// Counts occurrences of each value, in first-encountered order.
///
/// Values are grouped by their bit pattern, so `0.1 + 0.2` and `0.3` are two
/// different values, as are `0.0` and `-0.0`.
pub(crate) fn value_counts(series: &[f64]) -> Vec<(f64, usize)> {
    let mut slots: HashMap<u64, usize> = HashMap::with_capacity(series.len());
    let mut counts: Vec<(f64, usize)> = Vec::new();

    for &value in series {
        match slots.get(&value.to_bits()) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(value.to_bits(), counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts
}
