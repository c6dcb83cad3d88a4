//! Per-bin Hermitian block helpers shared by the estimators
//!
//! Blocks are promoted to double precision before any decomposition.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use ndarray::{s, ArrayView2, ArrayViewMut2};
use num_complex::{Complex32, Complex64};

use crate::error::{FrontendError, FrontendResult};

/// Iteration cap handed to the eigen solver
const MAX_EIGEN_ITERATIONS: usize = 1000;

/// Bin count of a stacked `[(bins * channels) x channels]` covariance
pub fn covariance_bins(psd: ArrayView2<Complex32>) -> FrontendResult<usize> {
    let channels = psd.ncols();
    if channels == 0 || psd.nrows() % channels != 0 {
        return Err(FrontendError::dims(format!(
            "covariance of shape {:?} is not a stack of square blocks",
            psd.dim()
        )));
    }
    Ok(psd.nrows() / channels)
}

/// Copy block `f` out of a stacked covariance, in double precision
pub fn block(psd: ArrayView2<Complex32>, f: usize) -> DMatrix<Complex64> {
    let c = psd.ncols();
    let rows = psd.slice(s![f * c..(f + 1) * c, ..]);
    DMatrix::from_fn(c, c, |i, j| {
        let v = rows[[i, j]];
        Complex64::new(v.re as f64, v.im as f64)
    })
}

/// Write a double-precision block back into a stacked covariance
pub fn store_block(psd: &mut ArrayViewMut2<Complex32>, f: usize, m: &DMatrix<Complex64>) {
    let c = m.nrows();
    for i in 0..c {
        for j in 0..c {
            let v = m[(i, j)];
            psd[[f * c + i, j]] = Complex32::new(v.re as f32, v.im as f32);
        }
    }
}

/// (A + A^H) / 2
pub fn hermitian_part(m: &DMatrix<Complex64>) -> DMatrix<Complex64> {
    (m + m.adjoint()) * Complex64::new(0.5, 0.0)
}

/// Row `f` of a `[bins x channels]` matrix as a double-precision vector
pub fn row_vector(m: ArrayView2<Complex32>, f: usize) -> DVector<Complex64> {
    DVector::from_iterator(
        m.ncols(),
        m.row(f).iter().map(|v| Complex64::new(v.re as f64, v.im as f64)),
    )
}

/// Eigendecomposition of a Hermitian block; `None` on non-finite input or
/// when the solver does not converge.
pub fn eigen(m: &DMatrix<Complex64>) -> Option<SymmetricEigen<Complex64, nalgebra::Dyn>> {
    if m.iter().any(|v| !v.re.is_finite() || !v.im.is_finite()) {
        return None;
    }
    SymmetricEigen::try_new(m.clone(), f64::EPSILON, MAX_EIGEN_ITERATIONS)
}

/// Check that every block of a stacked covariance equals its conjugate transpose
pub fn is_hermitian(psd: ArrayView2<Complex32>, tolerance: f32) -> bool {
    let Ok(bins) = covariance_bins(psd) else {
        return false;
    };
    let c = psd.ncols();
    (0..bins).all(|f| {
        (0..c).all(|i| {
            (0..c).all(|j| (psd[[f * c + i, j]] - psd[[f * c + j, i]].conj()).norm() <= tolerance)
        })
    })
}
