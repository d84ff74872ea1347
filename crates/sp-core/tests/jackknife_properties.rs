//! Property-based tests for aggregation and jackknife invariants.

use proptest::prelude::*;
use sp_common::{Error, Host, Observable, SeriesComponent};
use sp_config::{FieldSelection, MeanErrorDivisor};
use sp_core::experiment::{Experiment, ExperimentBuilder, GroupStatistics};
use sp_core::jackknife::jackknife_covariance;
use sp_core::normalize::normalize;

/// (value, random, random_sigma) per group; sigma kept away from zero.
fn groups_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((-50.0f64..50.0, -10.0f64..10.0, 0.1f64..5.0), min..max)
}

fn build(groups: &[(f64, f64, f64)]) -> Experiment {
    let mut builder = ExperimentBuilder::new(Host::M31, 11, &Observable::ALL, groups.len());
    for (i, &(value, random, random_sigma)) in groups.iter().enumerate() {
        builder
            .push_group(i as u64, |field| {
                // Decorrelate fields with a per-field skew
                let skew = match field {
                    Observable::Width => 0.0,
                    Observable::CaRatio => (i as f64).sin(),
                    Observable::BaRatio => (i as f64 * 0.7).cos(),
                    _ => 1.0,
                };
                Ok(GroupStatistics {
                    value: value + skew * value.abs().sqrt(),
                    sigma: 0.0,
                    random,
                    random_sigma,
                })
            })
            .unwrap();
    }
    builder.finish().unwrap()
}

proptest! {
    #[test]
    fn copy_without_index_drops_exactly_one(groups in groups_strategy(1, 12), pick in any::<prop::sample::Index>()) {
        let exp = build(&groups);
        let i = pick.index(groups.len());

        prop_assert_eq!(exp.copy_experiment(None).unwrap(), exp.clone());

        let reduced = exp.copy_experiment(Some(i)).unwrap();
        prop_assert_eq!(reduced.points(), groups.len() - 1);
        for key in exp.series_keys() {
            let mut expected = exp.series(key).unwrap().to_vec();
            expected.remove(i);
            prop_assert_eq!(reduced.series(key).unwrap(), expected.as_slice());
        }
        prop_assert!(!reduced.group_ids().contains(&(i as u64)));
    }

    #[test]
    fn copy_out_of_range_fails(groups in groups_strategy(0, 6), extra in 0usize..4) {
        let exp = build(&groups);
        let index = groups.len() + extra;
        let is_out_of_range = matches!(
            exp.copy_experiment(Some(index)),
            Err(Error::IndexOutOfRange { .. })
        );
        prop_assert!(is_out_of_range);
    }

    #[test]
    fn normalization_is_deterministic(groups in groups_strategy(1, 10)) {
        let exp = build(&groups);
        let selection = FieldSelection::default();
        let a = normalize(&exp, &selection).unwrap();
        let b = normalize(&exp, &selection).unwrap();
        prop_assert_eq!(a.data(), b.data());
        prop_assert!(a.data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn jackknife_is_symmetric_and_non_negative(groups in groups_strategy(2, 12)) {
        let exp = build(&groups);
        let est = jackknife_covariance(&exp, &FieldSelection::default(), MeanErrorDivisor::LegacyFixed).unwrap();

        prop_assert_eq!(est.n_groups, groups.len());
        prop_assert_eq!(est.mean.len(), 3);
        prop_assert_eq!(&est.covariance, &est.covariance.transpose());
        prop_assert_eq!(&est.covariance_error, &est.covariance_error.transpose());
        prop_assert!(est.covariance_error.iter().all(|v| *v >= 0.0 && v.is_finite()));
        prop_assert!(est.mean_error.iter().all(|v| *v >= 0.0 && v.is_finite()));
        // Variances are non-negative up to rounding
        for k in 0..3 {
            prop_assert!(est.covariance[(k, k)] >= -1e-9);
        }
    }

    #[test]
    fn divisor_only_scales_mean_error(groups in groups_strategy(2, 10)) {
        let exp = build(&groups);
        let sel = FieldSelection::default();
        let legacy = jackknife_covariance(&exp, &sel, MeanErrorDivisor::LegacyFixed).unwrap();
        let by_n = jackknife_covariance(&exp, &sel, MeanErrorDivisor::GroupCount).unwrap();

        prop_assert_eq!(&legacy.covariance, &by_n.covariance);
        prop_assert_eq!(&legacy.mean, &by_n.mean);
        let scale = (20.0 / groups.len() as f64).sqrt();
        for k in 0..3 {
            let expected = legacy.mean_error[k] * scale;
            prop_assert!((by_n.mean_error[k] - expected).abs() <= 1e-9 * (1.0 + expected.abs()));
        }
    }

    #[test]
    fn single_group_is_insufficient_for_jackknife(groups in groups_strategy(0, 2)) {
        let exp = build(&groups);
        let is_insufficient = matches!(
            jackknife_covariance(&exp, &FieldSelection::default(), MeanErrorDivisor::GroupCount),
            Err(Error::InsufficientData(_))
        );
        prop_assert!(is_insufficient);
    }
}

#[test]
fn zero_sigma_in_any_subset_propagates() {
    let mut groups = vec![(1.0, 0.0, 1.0), (2.0, 0.0, 1.0), (3.0, 0.0, 1.0)];
    groups[2].2 = 0.0;
    let exp = build(&groups);
    let err = jackknife_covariance(&exp, &FieldSelection::default(), MeanErrorDivisor::LegacyFixed)
        .unwrap_err();
    assert!(matches!(err, Error::DivideByZero { .. }));
    assert_eq!(
        exp.values(Observable::Width, SeriesComponent::RandomSigma).unwrap(),
        &[1.0, 1.0, 0.0]
    );
}
