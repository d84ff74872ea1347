//! Fuzz target for normalization and jackknife estimation.
//!
//! Arbitrary per-group statistics (including zero, NaN and infinite
//! spreads) must produce either an estimate or an error, never a panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sp_common::{Host, Observable};
use sp_config::{FieldSelection, MeanErrorDivisor};
use sp_core::experiment::{ExperimentBuilder, GroupStatistics};
use sp_core::jackknife::jackknife_covariance;

#[derive(Debug, Arbitrary)]
struct Group {
    value: f64,
    random: f64,
    random_sigma: f64,
}

#[derive(Debug, Arbitrary)]
struct Input {
    groups: Vec<Group>,
    by_group_count: bool,
}

fuzz_target!(|input: Input| {
    let groups = &input.groups[..input.groups.len().min(64)];
    let mut builder = ExperimentBuilder::new(Host::M31, 11, &Observable::ALL, groups.len());
    for (i, g) in groups.iter().enumerate() {
        let _ = builder.push_group(i as u64, |_| {
            Ok(GroupStatistics {
                value: g.value,
                sigma: 0.0,
                random: g.random,
                random_sigma: g.random_sigma,
            })
        });
    }
    let Ok(experiment) = builder.finish() else {
        return;
    };

    let divisor = if input.by_group_count {
        MeanErrorDivisor::GroupCount
    } else {
        MeanErrorDivisor::LegacyFixed
    };
    if let Ok(estimate) = jackknife_covariance(&experiment, &FieldSelection::default(), divisor) {
        if estimate.covariance.iter().all(|v| v.is_finite()) {
            assert_eq!(estimate.covariance, estimate.covariance.transpose());
        }
    }
});
