// src/core/pipeline.rs
//
// Per-utterance driver: STFT -> covariance -> steering -> MVDR -> beamform -> iSTFT

use log::{debug, info};
use ndarray::{Array2, ArrayView2};
use num_complex::Complex32;

use super::beamforming::{
    beamform_packed, estimate_steer_vector, ChannelReshaper, CovarianceEstimator, MvdrSolution,
    MvdrWeightSolver,
};
use super::dsp::WindowedTransform;
use crate::config::{BeamformerOptions, FrontendConfig, StftOptions};
use crate::error::FrontendResult;

/// Everything produced while enhancing one utterance
#[derive(Debug, Clone)]
pub struct Enhancement {
    /// `[1 x samples]`
    pub waveform: Array2<f32>,
    /// `[frames x padded_length]`, packed
    pub spectra: Array2<f32>,
    /// `[bins x channels]`
    pub steering: Array2<Complex32>,
    pub solution: MvdrSolution,
}

/// Mask-based MVDR enhancement of multichannel utterances.
///
/// Owns one [`WindowedTransform`]; build one pipeline per worker thread.
pub struct MvdrPipeline {
    transform: WindowedTransform,
    solver: MvdrWeightSolver,
    range: f32,
}

impl MvdrPipeline {
    pub fn new(stft: StftOptions, beamformer: BeamformerOptions) -> FrontendResult<Self> {
        let range = beamformer.range;
        Ok(Self {
            transform: WindowedTransform::new(stft)?,
            solver: MvdrWeightSolver::new(beamformer)?,
            range,
        })
    }

    pub fn from_config(config: &FrontendConfig) -> FrontendResult<Self> {
        Self::new(config.stft.clone(), config.beamformer.clone())
    }

    pub fn transform(&self) -> &WindowedTransform {
        &self.transform
    }

    /// `(frames, bins)` a mask must have for a signal of `num_samples`
    pub fn mask_shape(&self, num_samples: usize) -> (usize, usize) {
        (self.transform.num_frames(num_samples), self.transform.num_bins())
    }

    /// Enhance a `[channels x samples]` waveform.
    ///
    /// With a `[frames x bins]` mask the steering vector comes from the
    /// mask-weighted covariance and the MVDR noise covariance from `1 - mask`.
    /// Without one, a single unweighted covariance serves both roles.
    pub fn enhance(
        &mut self,
        wave: ArrayView2<f32>,
        mask: Option<ArrayView2<f32>>,
    ) -> FrontendResult<Enhancement> {
        let stft = self.transform.forward(wave)?;
        let reshaper = ChannelReshaper::for_padded_length(wave.nrows(), self.transform.padded_length())?;
        let spectra = reshaper.unpack(stft.view())?;
        // the transform buffer is no longer needed once unpacked
        drop(stft);

        let estimator = CovarianceEstimator::new(reshaper.num_bins());
        let (target, noise) = match mask {
            Some(mask) => estimator.estimate_pair(spectra.view(), mask)?,
            None => {
                let psd = estimator.estimate(spectra.view(), None)?;
                (psd.clone(), psd)
            }
        };

        let steering = estimate_steer_vector(target.view())?;
        let solution = self.solver.solve(noise.view(), steering.view())?;
        let enhanced = beamform_packed(spectra.view(), solution.weights.view())?;
        debug!("beamformed {} frames", enhanced.nrows());

        let waveform = self.transform.inverse(enhanced.view(), self.range)?;
        info!(
            "enhanced {} channel(s) x {} samples -> {} samples",
            wave.nrows(),
            wave.ncols(),
            waveform.ncols()
        );

        Ok(Enhancement {
            waveform,
            spectra: enhanced,
            steering,
            solution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dsp::WindowType;

    fn pipeline() -> MvdrPipeline {
        let stft = StftOptions::new(64, 32, WindowType::Hanning);
        MvdrPipeline::new(stft, BeamformerOptions::default()).unwrap()
    }

    fn wave(channels: usize, samples: usize) -> Array2<f32> {
        Array2::from_shape_fn((channels, samples), |(c, n)| {
            let t = n as f32;
            (0.05 * t).sin() + 0.3 * ((0.31 + 0.07 * c as f32) * t).cos()
        })
    }

    #[test]
    fn test_enhance_shapes_without_mask() {
        let mut pipeline = pipeline();
        let wave = wave(3, 640);
        let out = pipeline.enhance(wave.view(), None).unwrap();
        let (frames, bins) = pipeline.mask_shape(640);
        assert_eq!((frames, bins), (19, 33));
        assert_eq!(out.spectra.dim(), (frames, 64));
        assert_eq!(out.steering.dim(), (bins, 3));
        assert_eq!(out.solution.weights.dim(), (bins, 3));
        assert_eq!(out.waveform.dim(), (1, 640));
    }

    #[test]
    fn test_enhance_with_mask() {
        let mut pipeline = pipeline();
        let wave = wave(2, 400);
        let (frames, bins) = pipeline.mask_shape(400);
        let mask = Array2::from_shape_fn((frames, bins), |(t, f)| if (t + f) % 3 == 0 { 0.9 } else { 0.2 });
        let out = pipeline.enhance(wave.view(), Some(mask.view())).unwrap();
        assert!(out.waveform.iter().all(|s| s.is_finite()));
        let peak = out.waveform.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!((peak - crate::config::INT16_MAX).abs() < 0.5);
    }

    #[test]
    fn test_mask_shape_mismatch_is_fatal() {
        let mut pipeline = pipeline();
        let wave = wave(2, 400);
        let mask = Array2::<f32>::ones((3, 3));
        assert!(pipeline.enhance(wave.view(), Some(mask.view())).is_err());
    }
}
