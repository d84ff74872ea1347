//! Empirical quantiles.

/// Quantile of an ascending slice with linear interpolation between ranks.
///
/// Returns NaN for an empty slice. `q` is clamped to [0, 1].
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let idx = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = idx - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Sort a copy of `values` (NaN last) and take several quantiles.
pub fn quantiles(values: &[f64], qs: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    qs.iter().map(|&q| quantile_sorted(&sorted, q)).collect()
}

/// Fraction of values at or below `threshold`.
///
/// Returns NaN for an empty slice.
pub fn fraction_at_or_below(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().filter(|&&v| v <= threshold).count() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(quantile_sorted(&sorted, 1.0), 4.0);
        assert_eq!(quantile_sorted(&sorted, 0.5), 2.5);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(quantile_sorted(&[], 0.5).is_nan());
        assert_eq!(quantile_sorted(&[7.0], 0.16), 7.0);
        assert_eq!(quantile_sorted(&[1.0, 2.0], 2.0), 2.0);
    }

    #[test]
    fn quantiles_sort_first() {
        let q = quantiles(&[5.0, 1.0, 3.0], &[0.0, 0.5, 1.0]);
        assert_eq!(q, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn fraction_counts_ties() {
        assert_eq!(fraction_at_or_below(&[1.0, 2.0, 2.0, 3.0], 2.0), 0.75);
        assert!(fraction_at_or_below(&[], 0.0).is_nan());
    }
}
