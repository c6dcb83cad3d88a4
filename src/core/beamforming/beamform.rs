//! Weighted channel combination

use ndarray::{Array2, ArrayView2};
use num_complex::Complex32;

use super::reshape::ChannelReshaper;
use crate::error::{FrontendError, FrontendResult};

/// Apply per-bin weights to bin-major multichannel spectra.
///
/// `enhanced(t, f) = sum_c conj(w(f, c)) * x(t, f, c)`; returns `[frames x bins]`.
pub fn beamform(
    spectra: ArrayView2<Complex32>,
    weights: ArrayView2<Complex32>,
) -> FrontendResult<Array2<Complex32>> {
    let (num_bins, channels) = weights.dim();
    if num_bins == 0 || channels != spectra.ncols() || spectra.nrows() % num_bins != 0 {
        return Err(FrontendError::dims(format!(
            "weights {:?} do not match spectra {:?}",
            weights.dim(),
            spectra.dim()
        )));
    }

    let num_frames = spectra.nrows() / num_bins;
    let mut enhanced = Array2::<Complex32>::zeros((num_frames, num_bins));
    for f in 0..num_bins {
        let w = weights.row(f);
        for t in 0..num_frames {
            let x = spectra.row(f * num_frames + t);
            enhanced[[t, f]] = w.iter().zip(x.iter()).map(|(w, x)| w.conj() * x).sum();
        }
    }
    Ok(enhanced)
}

/// [`beamform`] followed by packing into transform-buffer rows, ready for
/// the inverse transform
pub fn beamform_packed(
    spectra: ArrayView2<Complex32>,
    weights: ArrayView2<Complex32>,
) -> FrontendResult<Array2<f32>> {
    let enhanced = beamform(spectra, weights)?;
    ChannelReshaper::new(weights.ncols(), weights.nrows())?.pack(enhanced.view())
}
