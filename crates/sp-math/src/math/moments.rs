//! First and second moments of flat samples.
//!
//! Conventions follow the population (ddof = 0) estimator for spreads of
//! randomized controls. A single sample has zero spread rather than an
//! undefined one.

/// Arithmetic mean.
///
/// Returns NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by n).
///
/// Returns NaN for empty input and 0.0 for a single value.
pub fn population_variance(values: &[f64]) -> f64 {
    match values.len() {
        0 => f64::NAN,
        1 => 0.0,
        n => {
            let m = mean(values);
            values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / n as f64
        }
    }
}

/// Population standard deviation (divides by n).
///
/// Returns NaN for empty input and 0.0 for a single value.
pub fn population_std(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Mean and population std in one pass over the slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub std: f64,
}

impl Moments {
    pub fn of(values: &[f64]) -> Self {
        Moments {
            mean: mean(values),
            std: population_std(values),
        }
    }
}
