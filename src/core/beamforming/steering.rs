//! Steering vector estimation from spatial covariance
//!
//! Under a point-source model the target's relative channel response is the
//! principal eigenvector of its covariance block.

use log::debug;
use ndarray::{Array2, ArrayView2};
use num_complex::{Complex32, Complex64};

use super::hermitian::{block, covariance_bins, eigen, hermitian_part};
use crate::error::FrontendResult;

/// Components below this magnitude are not used as a phase reference
const PHASE_REFERENCE_FLOOR: f64 = 1e-12;

/// Per-bin principal eigenvector of a stacked Hermitian covariance.
///
/// Returns `[bins x channels]`, every row of unit norm. The global phase is
/// chosen so the first channel with non-negligible magnitude is real and
/// positive.
pub fn estimate_steer_vector(psd: ArrayView2<Complex32>) -> FrontendResult<Array2<Complex32>> {
    let num_bins = covariance_bins(psd)?;
    let channels = psd.ncols();
    let mut steer = Array2::<Complex32>::zeros((num_bins, channels));
    let mut fallback = 0usize;

    for f in 0..num_bins {
        let covar = hermitian_part(&block(psd, f));
        let vector = match principal_eigenvector(&covar) {
            Some(v) => v,
            None => {
                fallback += 1;
                vec![Complex64::new(1.0 / (channels as f64).sqrt(), 0.0); channels]
            }
        };
        for (c, v) in vector.iter().enumerate() {
            steer[[f, c]] = Complex32::new(v.re as f32, v.im as f32);
        }
    }

    if fallback > 0 {
        debug!("{} bin(s) without a usable eigenvector, using a broadside vector", fallback);
    }
    Ok(steer)
}

/// Unit-norm eigenvector of the largest eigenvalue, phase-normalized
pub fn principal_eigenvector(covar: &nalgebra::DMatrix<Complex64>) -> Option<Vec<Complex64>> {
    let eig = eigen(covar)?;
    let (index, _) = eig
        .eigenvalues
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;

    let mut vector: Vec<Complex64> = eig.eigenvectors.column(index).iter().copied().collect();
    let norm = vector.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt();
    if !(norm > 0.0) || !norm.is_finite() {
        return None;
    }

    let reference = vector
        .iter()
        .find(|v| v.norm() > PHASE_REFERENCE_FLOOR)
        .copied()
        .unwrap_or(Complex64::new(1.0, 0.0));
    let rotation = reference.conj() / reference.norm();
    vector.iter_mut().for_each(|v| *v = *v * rotation / norm);
    Some(vector)
}
