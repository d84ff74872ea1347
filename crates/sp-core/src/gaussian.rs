//! Multivariate Gaussian model built from a jackknife estimate.
//!
//! Draws are `x = μ + L z` with `L` the lower Cholesky factor of the
//! covariance and `z ~ N(0, I)`.

use std::collections::BTreeMap;

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;
use sp_common::{Error, Observable, Result};
use sp_math::{fraction_at_or_below, quantiles, Moments};

use crate::jackknife::JackknifeEstimate;
use crate::logging::event_names;

/// Absolute part of the diagonal jitter added when factorization fails.
pub const JITTER_FLOOR: f64 = 1e-10;

/// Jitter relative to the mean variance (trace / d).
pub const JITTER_RELATIVE: f64 = 1e-8;

/// A factorized multivariate Gaussian.
#[derive(Debug, Clone)]
pub struct GaussianModel {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    factor: DMatrix<f64>,
    jitter: f64,
    fields: BTreeMap<usize, Observable>,
}

impl GaussianModel {
    /// Factorize `covariance`, regularizing the diagonal once if needed.
    pub fn new(mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self> {
        let d = mean.len();
        if d == 0 || covariance.nrows() != d || covariance.ncols() != d {
            return Err(Error::InsufficientData(format!(
                "Gaussian model needs a {d}x{d} covariance for a mean of length {d}, got {}x{}",
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        if mean.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
            return Err(Error::NumericalInstability(
                "mean or covariance contains non-finite values".to_string(),
            ));
        }

        let (factor, jitter) = factorize(&covariance)?;
        Ok(GaussianModel {
            mean,
            covariance,
            factor,
            jitter,
            fields: BTreeMap::new(),
        })
    }

    /// Model of a jackknife estimate's mean and covariance.
    pub fn from_estimate(estimate: &JackknifeEstimate) -> Result<Self> {
        let mut model = Self::new(estimate.mean.clone(), estimate.covariance.clone())?;
        model.fields = estimate.fields.clone();
        Ok(model)
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Covariance as given (without jitter).
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Lower-triangular Cholesky factor actually used for sampling.
    pub fn factor(&self) -> &DMatrix<f64> {
        &self.factor
    }

    /// Diagonal jitter added before factorization (0 when none was needed).
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Draw `n` samples; row `i` of the result is one draw.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> DMatrix<f64> {
        let d = self.dim();
        let mut out = DMatrix::zeros(n, d);
        let mut z = DVector::zeros(d);
        for i in 0..n {
            for k in 0..d {
                z[k] = StandardNormal.sample(rng);
            }
            let x = &self.mean + &self.factor * &z;
            out.row_mut(i).copy_from(&x.transpose());
        }
        tracing::debug!(
            target: event_names::SAMPLE_FINISHED,
            samples = n,
            dim = d,
            "Sampled Gaussian model"
        );
        out
    }

    /// Summarize draws against a reference point (typically the observation).
    pub fn compare(
        &self,
        samples: &DMatrix<f64>,
        reference: &[f64],
        qs: &[f64],
    ) -> Result<ModelComparison> {
        let d = self.dim();
        if samples.ncols() != d || reference.len() != d {
            return Err(Error::InsufficientData(format!(
                "comparison needs {} columns and a reference of length {}, got {} and {}",
                d,
                d,
                samples.ncols(),
                reference.len()
            )));
        }
        if samples.nrows() == 0 {
            return Err(Error::InsufficientData(
                "comparison needs at least one sample".to_string(),
            ));
        }

        let fields = (0..d)
            .map(|k| {
                let column: Vec<f64> = samples.column(k).iter().copied().collect();
                let moments = Moments::of(&column);
                FieldComparison {
                    index: k,
                    field: self.fields.get(&k).copied(),
                    reference: reference[k],
                    sample_mean: moments.mean,
                    sample_std: moments.std,
                    quantiles: qs
                        .iter()
                        .copied()
                        .zip(quantiles(&column, qs))
                        .map(|(q, value)| QuantileValue { q, value })
                        .collect(),
                    fraction_at_or_below: fraction_at_or_below(&column, reference[k]),
                }
            })
            .collect();

        Ok(ModelComparison {
            n_samples: samples.nrows(),
            jitter: self.jitter,
            fields,
        })
    }
}

/// Cholesky factor of `cov`, retrying once with diagonal jitter.
fn factorize(cov: &DMatrix<f64>) -> Result<(DMatrix<f64>, f64)> {
    if let Some(chol) = Cholesky::<f64, Dyn>::new(cov.clone()) {
        return Ok((chol.l(), 0.0));
    }

    let d = cov.nrows();
    let mean_var = cov.trace() / d as f64;
    let jitter = JITTER_FLOOR + mean_var.abs() * JITTER_RELATIVE;
    let regularized = cov + DMatrix::identity(d, d) * jitter;

    match Cholesky::<f64, Dyn>::new(regularized) {
        Some(chol) => {
            tracing::warn!(
                target: event_names::SAMPLE_JITTER_APPLIED,
                jitter,
                dim = d,
                "Covariance not positive definite; added diagonal jitter"
            );
            Ok((chol.l(), jitter))
        }
        None => Err(Error::NumericalInstability(format!(
            "covariance is not positive definite even with jitter {:e}",
            jitter
        ))),
    }
}

/// One requested quantile of a field's draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileValue {
    pub q: f64,
    pub value: f64,
}

/// Model draws of one field against the reference value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldComparison {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Observable>,
    pub reference: f64,
    pub sample_mean: f64,
    pub sample_std: f64,
    pub quantiles: Vec<QuantileValue>,
    /// Fraction of draws at or below the reference.
    pub fraction_at_or_below: f64,
}

/// Per-field summary of Gaussian model draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    pub n_samples: usize,
    pub jitter: f64,
    pub fields: Vec<FieldComparison>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model_2d() -> GaussianModel {
        GaussianModel::new(
            DVector::from_vec(vec![1.0, -2.0]),
            DMatrix::from_row_slice(2, 2, &[4.0, 1.2, 1.2, 1.0]),
        )
        .unwrap()
    }

    #[test]
    fn factor_reconstructs_covariance() {
        let model = model_2d();
        let l = model.factor();
        let rebuilt = l * l.transpose();
        assert!((rebuilt - model.covariance()).abs().max() < 1e-12);
        assert_eq!(model.jitter(), 0.0);
    }

    #[test]
    fn zero_covariance_gets_jitter() {
        let model = GaussianModel::new(DVector::from_vec(vec![1.0, 1.0]), DMatrix::zeros(2, 2)).unwrap();
        assert_eq!(model.jitter(), JITTER_FLOOR);

        let mut rng = StdRng::seed_from_u64(1);
        let draws = model.sample(100, &mut rng);
        assert!(draws.iter().all(|&v| (v - 1.0).abs() < 1e-3));
    }

    #[test]
    fn indefinite_covariance_fails() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        let err = GaussianModel::new(DVector::zeros(2), cov).unwrap_err();
        assert!(matches!(err, Error::NumericalInstability(_)));
    }

    #[test]
    fn dimension_mismatch_is_insufficient() {
        let err = GaussianModel::new(DVector::zeros(3), DMatrix::identity(2, 2)).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let err = GaussianModel::new(DVector::from_vec(vec![f64::NAN]), DMatrix::identity(1, 1))
            .unwrap_err();
        assert!(matches!(err, Error::NumericalInstability(_)));
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let model = model_2d();
        let a = model.sample(50, &mut StdRng::seed_from_u64(42));
        let b = model.sample(50, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert_eq!(a.shape(), (50, 2));
    }

    #[test]
    fn sample_moments_match_model() {
        let model = model_2d();
        let draws = model.sample(40_000, &mut StdRng::seed_from_u64(7));
        let comparison = model.compare(&draws, &[1.0, -2.0], &[0.16, 0.5, 0.84]).unwrap();

        let width = &comparison.fields[0];
        assert!((width.sample_mean - 1.0).abs() < 0.05);
        assert!((width.sample_std - 2.0).abs() < 0.05);
        assert!((width.fraction_at_or_below - 0.5).abs() < 0.02);
        // N(1, 2): 16th/84th percentiles near mean ∓ sigma
        assert!((width.quantiles[0].value - -1.0).abs() < 0.1);
        assert!((width.quantiles[2].value - 3.0).abs() < 0.1);

        let second = &comparison.fields[1];
        assert!((second.sample_std - 1.0).abs() < 0.03);
        assert_eq!(comparison.n_samples, 40_000);
    }

    #[test]
    fn compare_checks_shapes() {
        let model = model_2d();
        let draws = model.sample(10, &mut StdRng::seed_from_u64(3));
        assert!(model.compare(&draws, &[0.0], &[0.5]).is_err());
        assert!(model
            .compare(&DMatrix::zeros(0, 2), &[0.0, 0.0], &[0.5])
            .is_err());
    }
}
