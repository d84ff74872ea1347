//! Property-based tests for sp-math numerical functions.
//!
//! Uses proptest to verify statistical invariants hold across many random inputs.

use nalgebra::DMatrix;
use proptest::prelude::*;
use sp_math::{
    elementwise_mean, is_symmetric, mean, population_std, rms_deviation, row_means,
    sample_covariance,
};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

fn matrix_strategy() -> impl Strategy<Value = DMatrix<f64>> {
    (1usize..=4, 0usize..=12).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(-100.0..100.0f64, rows * cols)
            .prop_map(move |data| DMatrix::from_vec(rows, cols, data))
    })
}

// ============================================================================
// moments
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The mean lies between the minimum and the maximum.
    #[test]
    fn mean_is_bounded(values in prop::collection::vec(-1e6..1e6f64, 1..200)) {
        let m = mean(&values);
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(m >= lo - TOL && m <= hi + TOL, "mean {} outside [{}, {}]", m, lo, hi);
    }

    /// Population std is non-negative and shift-invariant.
    #[test]
    fn std_shift_invariant(values in prop::collection::vec(-100.0..100.0f64, 1..100), shift in -50.0..50.0f64) {
        let s = population_std(&values);
        let shifted: Vec<f64> = values.iter().map(|v| v + shift).collect();
        let s2 = population_std(&shifted);
        prop_assert!(s >= 0.0);
        prop_assert!((s - s2).abs() <= 1e-7, "std {} != shifted std {}", s, s2);
    }
}

// ============================================================================
// covariance
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Sample covariance is exactly symmetric with a non-negative diagonal.
    #[test]
    fn covariance_symmetric(data in matrix_strategy()) {
        let cov = sample_covariance(&data);
        prop_assert_eq!(cov.nrows(), data.nrows());
        prop_assert!(is_symmetric(&cov, 0.0));
        for i in 0..cov.nrows() {
            prop_assert!(cov[(i, i)] >= -TOL);
            prop_assert!(!cov[(i, i)].is_nan());
        }
    }

    /// Row means have one entry per row.
    #[test]
    fn row_means_shape(data in matrix_strategy()) {
        let m = row_means(&data);
        prop_assert_eq!(m.len(), data.nrows());
        if data.ncols() > 0 {
            prop_assert!(m.iter().all(|v| v.is_finite()));
        }
    }
}

// ============================================================================
// aggregate
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// A larger divisor never increases the rms deviation.
    #[test]
    fn rms_monotone_in_divisor(
        reps in prop::collection::vec(prop::collection::vec(-10.0..10.0f64, 3), 2..20),
        d1 in 1.0..50.0f64,
        extra in 0.0..50.0f64,
    ) {
        let slices: Vec<&[f64]> = reps.iter().map(|r| r.as_slice()).collect();
        let center = elementwise_mean(&slices).unwrap();
        let a = rms_deviation(&slices, &center, d1).unwrap();
        let b = rms_deviation(&slices, &center, d1 + extra).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!(y <= &(x + TOL));
        }
    }
}
