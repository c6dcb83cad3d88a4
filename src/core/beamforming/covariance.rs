//! Mask-weighted spatial covariance estimation
//!
//! For every bin f the estimator accumulates
//! `sum_t w(t, f) * x(t, f) * x(t, f)^H` over frames and normalizes by the
//! summed weight. Without a mask every frame has unit weight.

use log::debug;
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2};
use num_complex::{Complex32, Complex64};

use super::hermitian::{hermitian_part, store_block};
use crate::error::{FrontendError, FrontendResult};

/// Summed weights at or below this magnitude leave the block at zero
const MIN_WEIGHT_SUM: f64 = 1e-10;

/// Per-bin spatial covariance of bin-major multichannel spectra
#[derive(Debug, Clone, Copy)]
pub struct CovarianceEstimator {
    num_bins: usize,
}

impl CovarianceEstimator {
    pub fn new(num_bins: usize) -> Self {
        Self { num_bins }
    }

    /// Covariance `[(bins * channels) x channels]` of `[(bins * frames) x channels]` spectra.
    ///
    /// `mask` is `[frames x bins]`; `None` weights every frame by one.
    pub fn estimate(
        &self,
        spectra: ArrayView2<Complex32>,
        mask: Option<ArrayView2<f32>>,
    ) -> FrontendResult<Array2<Complex32>> {
        let num_frames = self.check_shapes(spectra, mask)?;
        Ok(self.accumulate(spectra, num_frames, |t, f| match mask {
            Some(m) => m[[t, f]] as f64,
            None => 1.0,
        }))
    }

    /// Target and interference covariances from one mask.
    ///
    /// The target is weighted by `mask`, the interference by `1 - mask`.
    pub fn estimate_pair(
        &self,
        spectra: ArrayView2<Complex32>,
        mask: ArrayView2<f32>,
    ) -> FrontendResult<(Array2<Complex32>, Array2<Complex32>)> {
        let num_frames = self.check_shapes(spectra, Some(mask))?;
        let target = self.accumulate(spectra, num_frames, |t, f| mask[[t, f]] as f64);
        let noise = self.accumulate(spectra, num_frames, |t, f| 1.0 - mask[[t, f]] as f64);
        Ok((target, noise))
    }

    fn accumulate<W>(&self, spectra: ArrayView2<Complex32>, num_frames: usize, weight: W) -> Array2<Complex32>
    where
        W: Fn(usize, usize) -> f64,
    {
        let channels = spectra.ncols();
        let mut psd = Array2::<Complex32>::zeros((self.num_bins * channels, channels));
        let mut silent_bins = 0usize;

        for f in 0..self.num_bins {
            let mut covar = DMatrix::<Complex64>::zeros(channels, channels);
            let mut weight_sum = 0.0f64;

            for t in 0..num_frames {
                let w = weight(t, f);
                weight_sum += w;
                let x = spectra.row(f * num_frames + t);
                for i in 0..channels {
                    let xi = Complex64::new(x[i].re as f64, x[i].im as f64);
                    for j in 0..channels {
                        let xj = Complex64::new(x[j].re as f64, x[j].im as f64);
                        covar[(i, j)] += xi * xj.conj() * w;
                    }
                }
            }

            if weight_sum.abs() <= MIN_WEIGHT_SUM {
                silent_bins += 1;
                continue;
            }
            covar /= Complex64::new(weight_sum, 0.0);
            store_block(&mut psd.view_mut(), f, &hermitian_part(&covar));
        }

        if silent_bins > 0 {
            debug!("{} bin(s) with zero total weight left as zero covariance", silent_bins);
        }
        psd
    }

    fn check_shapes(
        &self,
        spectra: ArrayView2<Complex32>,
        mask: Option<ArrayView2<f32>>,
    ) -> FrontendResult<usize> {
        if self.num_bins == 0 || spectra.ncols() == 0 || spectra.nrows() % self.num_bins != 0 {
            return Err(FrontendError::dims(format!(
                "spectra of shape {:?} do not split into {} bins",
                spectra.dim(),
                self.num_bins
            )));
        }
        let num_frames = spectra.nrows() / self.num_bins;
        if let Some(mask) = mask {
            if mask.dim() != (num_frames, self.num_bins) {
                return Err(FrontendError::dims(format!(
                    "mask of shape {:?} does not match {} frames x {} bins",
                    mask.dim(),
                    num_frames,
                    self.num_bins
                )));
            }
        }
        Ok(num_frames)
    }
}
