//! Element-wise aggregation over equally shaped resampling replicates.
//!
//! Replicates are passed as flat slices (e.g. `DMatrix::as_slice`), so the
//! same kernels serve matrices and vectors.

/// Element-wise mean of equally sized replicates.
///
/// Returns `None` when there are no replicates or their lengths differ.
pub fn elementwise_mean(replicates: &[&[f64]]) -> Option<Vec<f64>> {
    let first = replicates.first()?;
    let len = first.len();
    if replicates.iter().any(|r| r.len() != len) {
        return None;
    }

    let mut acc = vec![0.0; len];
    for replicate in replicates {
        for (a, v) in acc.iter_mut().zip(replicate.iter()) {
            *a += v;
        }
    }
    let n = replicates.len() as f64;
    for a in &mut acc {
        *a /= n;
    }
    Some(acc)
}

/// Element-wise `sqrt(Σ (r - center)² / divisor)`.
///
/// The divisor is explicit because jackknife callers do not all divide by the
/// replicate count. Returns `None` when lengths disagree or the divisor is not
/// strictly positive.
pub fn rms_deviation(replicates: &[&[f64]], center: &[f64], divisor: f64) -> Option<Vec<f64>> {
    if divisor.is_nan() || divisor <= 0.0 || replicates.iter().any(|r| r.len() != center.len()) {
        return None;
    }

    let mut acc = vec![0.0; center.len()];
    for replicate in replicates {
        for ((a, v), c) in acc.iter_mut().zip(replicate.iter()).zip(center.iter()) {
            let d = v - c;
            *a += d * d;
        }
    }
    Some(acc.into_iter().map(|s| (s / divisor).sqrt()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_replicates() {
        let a = [1.0, 2.0];
        let b = [3.0, 6.0];
        let m = elementwise_mean(&[&a, &b]).unwrap();
        assert_eq!(m, vec![2.0, 4.0]);
    }

    #[test]
    fn mean_rejects_empty_and_ragged() {
        assert!(elementwise_mean(&[]).is_none());
        let a = [1.0, 2.0];
        let b = [3.0];
        assert!(elementwise_mean(&[&a, &b]).is_none());
    }

    #[test]
    fn rms_with_explicit_divisor() {
        let a = [1.5];
        let b = [1.0];
        let c = [0.5];
        let center = [1.0];
        // Σ d² = 0.5
        let by_n = rms_deviation(&[&a, &b, &c], &center, 3.0).unwrap();
        assert!((by_n[0] - (0.5f64 / 3.0).sqrt()).abs() < 1e-12);
        let by_20 = rms_deviation(&[&a, &b, &c], &center, 20.0).unwrap();
        assert!((by_20[0] - (0.025f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn rms_rejects_bad_divisor() {
        let a = [1.0];
        assert!(rms_deviation(&[&a], &[1.0], 0.0).is_none());
        assert!(rms_deviation(&[&a], &[1.0], f64::NAN).is_none());
    }

    #[test]
    fn rms_of_identical_replicates_is_zero() {
        let a = [2.0, -1.0];
        let r = rms_deviation(&[&a, &a, &a], &a, 3.0).unwrap();
        assert_eq!(r, vec![0.0, 0.0]);
    }
}
