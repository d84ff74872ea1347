//! Leave-one-out (jackknife) covariance and mean estimation.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use sp_common::{Error, Observable, Result};
use sp_config::{FieldSelection, MeanErrorDivisor};
use sp_math::{elementwise_mean, rms_deviation, row_means, sample_covariance};

use crate::experiment::Experiment;
use crate::logging::event_names;
use crate::normalize::normalize;

/// Covariance and mean of an experiment's normalized fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceAndMean {
    /// `n_fields × n_fields` sample covariance (ddof 1).
    pub covariance: DMatrix<f64>,
    pub mean: DVector<f64>,
    pub fields: BTreeMap<usize, Observable>,
}

/// Normalize an experiment and take the covariance and mean across groups.
///
/// With a single group the covariance is the zero matrix.
pub fn covariance_and_mean(
    experiment: &Experiment,
    selection: &FieldSelection,
) -> Result<CovarianceAndMean> {
    let normalized = normalize(experiment, selection)?;
    Ok(CovarianceAndMean {
        covariance: sample_covariance(normalized.data()),
        mean: row_means(normalized.data()),
        fields: normalized.fields().clone(),
    })
}

/// Jackknife-averaged covariance and mean with their resampling errors.
#[derive(Debug, Clone, PartialEq)]
pub struct JackknifeEstimate {
    pub covariance: DMatrix<f64>,
    pub covariance_error: DMatrix<f64>,
    pub mean: DVector<f64>,
    pub mean_error: DVector<f64>,
    pub fields: BTreeMap<usize, Observable>,
    /// Number of leave-one-out replicates (groups).
    pub n_groups: usize,
    pub divisor_policy: MeanErrorDivisor,
    /// Divisor actually applied to the mean error.
    pub mean_error_divisor: f64,
}

impl JackknifeEstimate {
    pub fn n_fields(&self) -> usize {
        self.mean.len()
    }

    pub fn to_view(&self) -> JackknifeView {
        JackknifeView {
            fields: self.fields.values().copied().collect(),
            n_groups: self.n_groups,
            mean: self.mean.iter().copied().collect(),
            mean_error: self.mean_error.iter().copied().collect(),
            covariance: matrix_rows(&self.covariance),
            covariance_error: matrix_rows(&self.covariance_error),
            divisor_policy: self.divisor_policy,
            mean_error_divisor: self.mean_error_divisor,
        }
    }
}

/// Row-major JSON form of a [`JackknifeEstimate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JackknifeView {
    pub fields: Vec<Observable>,
    pub n_groups: usize,
    pub mean: Vec<f64>,
    pub mean_error: Vec<f64>,
    pub covariance: Vec<Vec<f64>>,
    pub covariance_error: Vec<Vec<f64>>,
    pub divisor_policy: MeanErrorDivisor,
    pub mean_error_divisor: f64,
}

/// Rows of a matrix as nested vectors.
pub fn matrix_rows(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter().map(|r| r.iter().copied().collect()).collect()
}

/// Leave-one-out estimate over every group of the experiment.
///
/// For each group `i`, the experiment without `i` is normalized and its
/// covariance and mean computed. The replicates are averaged element-wise;
/// the covariance error divides the squared deviations by the group count
/// and the mean error by the divisor chosen by `divisor`.
pub fn jackknife_covariance(
    experiment: &Experiment,
    selection: &FieldSelection,
    divisor: MeanErrorDivisor,
) -> Result<JackknifeEstimate> {
    let n = experiment.points();
    if n < 2 {
        return Err(Error::InsufficientData(format!(
            "jackknife needs at least 2 groups, got {} ({} n_sat={})",
            n,
            experiment.host(),
            experiment.n_sat()
        )));
    }

    tracing::debug!(
        target: event_names::JACKKNIFE_STARTED,
        host = %experiment.host(),
        groups = n,
        "Starting leave-one-out replicates"
    );

    let mut replicates = Vec::with_capacity(n);
    for i in 0..n {
        let subset = experiment.copy_experiment(Some(i))?;
        let replicate = covariance_and_mean(&subset, selection)?;
        tracing::trace!(
            target: event_names::JACKKNIFE_REPLICATE,
            left_out = i,
            group_id = experiment.group_ids()[i],
            "Computed replicate"
        );
        replicates.push(replicate);
    }

    let d = selection.len();
    let covs: Vec<&[f64]> = replicates.iter().map(|r| r.covariance.as_slice()).collect();
    let means: Vec<&[f64]> = replicates.iter().map(|r| r.mean.as_slice()).collect();

    let cov_avg = elementwise_mean(&covs).ok_or_else(replicate_shape_error)?;
    let cov_err = rms_deviation(&covs, &cov_avg, n as f64).ok_or_else(replicate_shape_error)?;
    let mean_avg = elementwise_mean(&means).ok_or_else(replicate_shape_error)?;
    let mean_divisor = divisor.divisor(n);
    let mean_err =
        rms_deviation(&means, &mean_avg, mean_divisor).ok_or_else(replicate_shape_error)?;

    let estimate = JackknifeEstimate {
        covariance: symmetrize(DMatrix::from_vec(d, d, cov_avg)),
        covariance_error: symmetrize(DMatrix::from_vec(d, d, cov_err)),
        mean: DVector::from_vec(mean_avg),
        mean_error: DVector::from_vec(mean_err),
        fields: selection.field_index_map(),
        n_groups: n,
        divisor_policy: divisor,
        mean_error_divisor: mean_divisor,
    };

    tracing::info!(
        target: event_names::JACKKNIFE_FINISHED,
        host = %experiment.host(),
        n_sat = experiment.n_sat(),
        groups = n,
        divisor = %divisor,
        "Jackknife estimate ready"
    );
    Ok(estimate)
}

fn replicate_shape_error() -> Error {
    Error::NumericalInstability("jackknife replicates have inconsistent shapes".to_string())
}

/// Mirror the upper triangle onto the lower one.
fn symmetrize(mut m: DMatrix<f64>) -> DMatrix<f64> {
    for i in 0..m.nrows() {
        for j in (i + 1)..m.ncols() {
            m[(j, i)] = m[(i, j)];
        }
    }
    m
}
