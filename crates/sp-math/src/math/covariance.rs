//! Row-wise means and sample covariance of variable-by-observation matrices.
//!
//! Input matrices hold one variable per row and one observation per column.

use nalgebra::{DMatrix, DVector};

/// Mean of each row.
///
/// A matrix with zero columns yields a vector of NaN.
pub fn row_means(data: &DMatrix<f64>) -> DVector<f64> {
    let n = data.ncols();
    DVector::from_fn(data.nrows(), |i, _| {
        if n == 0 {
            f64::NAN
        } else {
            data.row(i).iter().sum::<f64>() / n as f64
        }
    })
}

/// Unbiased sample covariance (divides by n - 1) between the rows.
///
/// With fewer than two observations there is no spread to estimate and the
/// zero matrix is returned instead of NaN. Only the upper triangle is
/// computed; the lower triangle is mirrored, so the result is exactly
/// symmetric.
pub fn sample_covariance(data: &DMatrix<f64>) -> DMatrix<f64> {
    let d = data.nrows();
    let n = data.ncols();
    let mut cov = DMatrix::zeros(d, d);
    if n < 2 {
        return cov;
    }

    let means = row_means(data);
    let denom = (n - 1) as f64;
    for i in 0..d {
        for j in i..d {
            let mut acc = 0.0;
            for k in 0..n {
                acc += (data[(i, k)] - means[i]) * (data[(j, k)] - means[j]);
            }
            let value = acc / denom;
            cov[(i, j)] = value;
            cov[(j, i)] = value;
        }
    }
    cov
}

/// Whether a square matrix is symmetric within an absolute tolerance.
pub fn is_symmetric(matrix: &DMatrix<f64>, tol: f64) -> bool {
    if matrix.nrows() != matrix.ncols() {
        return false;
    }
    let d = matrix.nrows();
    for i in 0..d {
        for j in (i + 1)..d {
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > tol {
                return false;
            }
        }
    }
    true
}
