//! Minimum variance distortionless response weights
//!
//! ```text
//! w(f) = Phi(f)^-1 v(f) / (v(f)^H Phi(f)^-1 v(f))
//! ```
//!
//! Phi is the interference covariance, v the target steering vector. The
//! constraint `w^H v = 1` holds for every bin, including the ones where Phi had
//! to be diagonally loaded.

use log::debug;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, ArrayView2};
use num_complex::{Complex32, Complex64};

use super::hermitian::{block, covariance_bins, eigen, hermitian_part, row_vector};
use crate::config::BeamformerOptions;
use crate::error::{FrontendError, FrontendResult};

/// Denominators below this magnitude are treated as a failed solve
const MIN_RESPONSE: f64 = 1e-30;

/// How the weight for one bin was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinSolve {
    /// Phi was well conditioned and inverted as is
    Direct,
    /// Phi was diagonally loaded before inversion
    Loaded,
    /// Inversion failed; delay-and-sum weight v / (v^H v)
    DelayAndSum,
}

/// Weights plus per-bin solve diagnostics
#[derive(Debug, Clone)]
pub struct MvdrSolution {
    /// `[bins x channels]`
    pub weights: Array2<Complex32>,
    pub solves: Vec<BinSolve>,
}

impl MvdrSolution {
    pub fn loaded_bins(&self) -> usize {
        self.solves.iter().filter(|s| **s == BinSolve::Loaded).count()
    }

    pub fn fallback_bins(&self) -> usize {
        self.solves.iter().filter(|s| **s == BinSolve::DelayAndSum).count()
    }
}

/// Per-bin MVDR solver with diagonal loading
#[derive(Debug, Clone)]
pub struct MvdrWeightSolver {
    opts: BeamformerOptions,
}

impl MvdrWeightSolver {
    pub fn new(opts: BeamformerOptions) -> FrontendResult<Self> {
        opts.validate()?;
        Ok(Self { opts })
    }

    /// Weights for a stacked covariance `[(bins * C) x C]` and steering `[bins x C]`
    pub fn solve(
        &self,
        psd: ArrayView2<Complex32>,
        steer: ArrayView2<Complex32>,
    ) -> FrontendResult<MvdrSolution> {
        let num_bins = covariance_bins(psd)?;
        let channels = psd.ncols();
        if steer.dim() != (num_bins, channels) {
            return Err(FrontendError::dims(format!(
                "steering vector {:?} does not match covariance of {} bins x {} channels",
                steer.dim(),
                num_bins,
                channels
            )));
        }

        let mut weights = Array2::<Complex32>::zeros((num_bins, channels));
        let mut solves = Vec::with_capacity(num_bins);

        for f in 0..num_bins {
            let phi = hermitian_part(&block(psd, f));
            let v = row_vector(steer, f);
            let (w, solve) = self.solve_bin(phi, &v);
            for (c, value) in w.iter().enumerate() {
                weights[[f, c]] = Complex32::new(value.re as f32, value.im as f32);
            }
            solves.push(solve);
        }

        let solution = MvdrSolution { weights, solves };
        debug!(
            "MVDR: {} bins, {} diagonally loaded, {} delay-and-sum",
            num_bins,
            solution.loaded_bins(),
            solution.fallback_bins()
        );
        Ok(solution)
    }

    /// Weight vector for one bin
    pub fn solve_bin(&self, mut phi: DMatrix<Complex64>, v: &DVector<Complex64>) -> (DVector<Complex64>, BinSolve) {
        let mut solve = BinSolve::Direct;
        if self.needs_loading(&phi) {
            let channels = phi.nrows();
            let mean_eig = (phi.trace().re / channels as f64).max(self.opts.loading_floor);
            let lambda = self.opts.diagonal_loading * mean_eig;
            for i in 0..channels {
                phi[(i, i)] += Complex64::new(lambda, 0.0);
            }
            solve = BinSolve::Loaded;
        }

        let Some(inv) = phi.try_inverse() else {
            return (delay_and_sum(v), BinSolve::DelayAndSum);
        };
        let numerator = &inv * v;
        let response = v.dotc(&numerator);
        if !(response.norm() > MIN_RESPONSE) || !response.re.is_finite() || !response.im.is_finite() {
            return (delay_and_sum(v), BinSolve::DelayAndSum);
        }
        (numerator / response, solve)
    }

    /// Singular or ill-conditioned according to the eigenvalue spread
    fn needs_loading(&self, phi: &DMatrix<Complex64>) -> bool {
        let Some(eig) = eigen(phi) else {
            return true;
        };
        let max = eig.eigenvalues.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = eig.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
        !(max > 0.0) || min * self.opts.condition_limit <= max
    }
}

/// v / (v^H v); the zero vector stays zero
fn delay_and_sum(v: &DVector<Complex64>) -> DVector<Complex64> {
    let energy = v.norm_squared();
    if energy > 0.0 {
        v / Complex64::new(energy, 0.0)
    } else {
        v.clone()
    }
}
