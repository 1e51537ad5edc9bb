//! Descriptive statistics over step series.

use crate::core::types::DailyStepRecord;
use statrs::statistics::Statistics;

/// Step counts as floats, in input order.
pub(crate) fn step_values(records: &[DailyStepRecord]) -> Vec<f64> {
    records.iter().map(|r| r.steps as f64).collect()
}

/// Arithmetic mean; 0.0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Population standard deviation; 0.0 for fewer than two values.
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Coefficient of variation (population sd / mean). `None` when the mean is not positive.
pub(crate) fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values);
    if m <= 0.0 || !m.is_finite() {
        return None;
    }
    Some(population_std_dev(values) / m)
}
