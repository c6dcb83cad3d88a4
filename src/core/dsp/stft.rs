//! Multichannel short-time Fourier transform
//!
//! Analysis frames every channel of a `[channels x samples]` waveform and
//! stores one packed real-FFT spectrum per row, channel-major:
//! row `c * num_frames + t` is frame `t` of channel `c`. Synthesis runs the
//! inverse per row and overlap-adds into a single-channel waveform.

use log::{debug, warn};
use ndarray::{Array2, ArrayView2, Axis};
use num_complex::Complex32;

use super::fft::{num_bins, packed_bin, set_packed_bin, PackedRealFft};
use super::windows::create_window;
use crate::config::{StftOptions, INT16_MAX};
use crate::error::{FrontendError, FrontendResult};

/// Windowed forward/inverse transform for one configuration.
///
/// The window cache and FFT context belong to this instance. Use one instance
/// per worker when processing utterances in parallel.
pub struct WindowedTransform {
    opts: StftOptions,
    window: Vec<f32>,
    fft: PackedRealFft,
}

/// Output of [`WindowedTransform::compute`]
#[derive(Debug, Clone)]
pub struct StftStats {
    pub stft: Array2<f32>,
    pub spectrogram: Array2<f32>,
    pub phase: Array2<f32>,
}

impl WindowedTransform {
    pub fn new(opts: StftOptions) -> FrontendResult<Self> {
        opts.validate()?;
        let window = create_window(opts.frame_length, opts.window);
        let fft = PackedRealFft::new(opts.padded_length())?;
        Ok(Self { opts, window, fft })
    }

    pub fn options(&self) -> &StftOptions {
        &self.opts
    }

    pub fn window(&self) -> &[f32] {
        &self.window
    }

    pub fn padded_length(&self) -> usize {
        self.fft.size()
    }

    pub fn num_bins(&self) -> usize {
        num_bins(self.fft.size())
    }

    /// Frame count for a signal of `num_samples`; a signal shorter than one
    /// frame still yields a single zero-padded frame.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        if num_samples < self.opts.frame_length {
            return 1;
        }
        (num_samples - self.opts.frame_length) / self.opts.frame_shift + 1
    }

    /// Length of the overlap-added signal for `num_frames`
    pub fn num_samples(&self, num_frames: usize) -> usize {
        match num_frames {
            0 => 0,
            n => (n - 1) * self.opts.frame_shift + self.opts.frame_length,
        }
    }

    /// Forward transform of a `[channels x samples]` waveform.
    ///
    /// Returns `[(channels * frames) x padded_length]`, channel-major.
    pub fn forward(&mut self, wave: ArrayView2<f32>) -> FrontendResult<Array2<f32>> {
        self.check_window()?;

        let (num_channels, num_samples) = wave.dim();
        if num_channels == 0 || num_samples == 0 {
            return Err(FrontendError::param(format!(
                "cannot transform an empty waveform ({} x {})",
                num_channels, num_samples
            )));
        }

        let frame_length = self.opts.frame_length;
        let frame_shift = self.opts.frame_shift;
        let num_frames = self.num_frames(num_samples);
        let mut stft = Array2::<f32>::zeros((num_channels * num_frames, self.padded_length()));

        let mut samples = vec![0.0f32; num_samples];
        for (c, channel) in wave.axis_iter(Axis(0)).enumerate() {
            samples.iter_mut().zip(channel.iter()).for_each(|(d, &s)| *d = s);
            self.condition_channel(c, &mut samples);

            for t in 0..num_frames {
                let mut row = stft.row_mut(c * num_frames + t);
                let row = row
                    .as_slice_mut()
                    .ok_or_else(|| FrontendError::dims("non-contiguous transform row"))?;

                let begin = t * frame_shift;
                let end = (begin + frame_length).min(num_samples);
                row[..end - begin]
                    .iter_mut()
                    .zip(samples[begin..end].iter().zip(self.window.iter()))
                    .for_each(|(d, (&s, &w))| *d = s * w);

                self.fft.forward_in_place(row)?;
            }
        }

        debug!(
            "STFT: {} channel(s), {} samples -> {} frames x {} bins",
            num_channels,
            num_samples,
            num_frames,
            self.num_bins()
        );
        Ok(stft)
    }

    /// Magnitude (or power, with `apply_pow`) spectrogram: `[rows x bins]`
    pub fn compute_spectrogram(&self, stft: ArrayView2<f32>) -> FrontendResult<Array2<f32>> {
        let bins = self.check_width(stft)?;
        let mut spectra = Array2::<f32>::zeros((stft.nrows(), bins));

        for (row, mut out) in stft.outer_iter().zip(spectra.outer_iter_mut()) {
            let row = row
                .as_slice()
                .ok_or_else(|| FrontendError::dims("non-contiguous transform row"))?;
            for f in 0..bins {
                out[f] = packed_bin(row, f).norm_sqr();
            }
        }

        if !self.opts.apply_pow {
            spectra.mapv_inplace(f32::sqrt);
        }
        if self.opts.apply_log {
            spectra.mapv_inplace(|v| v.max(f32::EPSILON).ln());
        }
        Ok(spectra)
    }

    /// Phase angle per bin: `[rows x bins]`
    pub fn compute_phase_angle(&self, stft: ArrayView2<f32>) -> FrontendResult<Array2<f32>> {
        let bins = self.check_width(stft)?;
        let mut angle = Array2::<f32>::zeros((stft.nrows(), bins));

        for (row, mut out) in stft.outer_iter().zip(angle.outer_iter_mut()) {
            let row = row
                .as_slice()
                .ok_or_else(|| FrontendError::dims("non-contiguous transform row"))?;
            for f in 0..bins {
                out[f] = packed_bin(row, f).arg();
            }
        }
        Ok(angle)
    }

    /// Rebuild a packed buffer from a spectrogram and phase angles.
    ///
    /// Undoes `apply_log`/`apply_pow`. Bin 0 keeps its magnitude, the Nyquist
    /// bin stores the negated magnitude.
    pub fn polar(
        &self,
        spectra: ArrayView2<f32>,
        angle: ArrayView2<f32>,
    ) -> FrontendResult<Array2<f32>> {
        if spectra.dim() != angle.dim() {
            return Err(FrontendError::dims(format!(
                "spectrogram {:?} and phase {:?} differ in shape",
                spectra.dim(),
                angle.dim()
            )));
        }
        let (num_frames, bins) = spectra.dim();
        if bins < 2 {
            return Err(FrontendError::dims("polar needs at least two bins"));
        }
        let window_size = (bins - 1) * 2;

        let mut magnitude = spectra.to_owned();
        if self.opts.apply_log {
            magnitude.mapv_inplace(f32::exp);
        }
        if self.opts.apply_pow {
            magnitude.mapv_inplace(f32::sqrt);
        }

        let mut stft = Array2::<f32>::zeros((num_frames, window_size));
        for t in 0..num_frames {
            let mut row = vec![0.0f32; window_size];
            row[0] = magnitude[[t, 0]];
            row[1] = -magnitude[[t, bins - 1]];
            for f in 1..bins - 1 {
                let value = Complex32::from_polar(magnitude[[t, f]], angle[[t, f]]);
                set_packed_bin(&mut row, f, value);
            }
            stft.row_mut(t).iter_mut().zip(row).for_each(|(d, s)| *d = s);
        }
        Ok(stft)
    }

    /// Forward transform plus spectrogram and phase of the same buffer
    pub fn compute(&mut self, wave: ArrayView2<f32>) -> FrontendResult<StftStats> {
        let stft = self.forward(wave)?;
        let spectrogram = self.compute_spectrogram(stft.view())?;
        let phase = self.compute_phase_angle(stft.view())?;
        Ok(StftStats {
            stft,
            spectrogram,
            phase,
        })
    }

    /// Overlap-add synthesis of a single-channel packed buffer `[frames x padded_length]`.
    ///
    /// The synthesis window is the analysis window itself, not its
    /// orthogonal dual; overall level is controlled by `range` instead.
    /// `range == 0` rescales the peak to the 16-bit maximum, `range < 0` keeps
    /// the raw overlap-add output. Returns `[1 x samples]`.
    pub fn inverse(&mut self, stft: ArrayView2<f32>, range: f32) -> FrontendResult<Array2<f32>> {
        self.check_window()?;
        self.check_width(stft)?;

        let frame_length = self.opts.frame_length;
        let frame_shift = self.opts.frame_shift;
        let num_frames = stft.nrows();
        let mut samples = vec![0.0f32; self.num_samples(num_frames)];
        let mut seg = vec![0.0f32; self.padded_length()];
        let scale = 1.0 / frame_length as f32;

        for (t, spectra) in stft.outer_iter().enumerate() {
            seg.iter_mut().zip(spectra.iter()).for_each(|(d, &s)| *d = s);
            self.fft.inverse_in_place(&mut seg)?;

            let offset = t * frame_shift;
            samples[offset..offset + frame_length]
                .iter_mut()
                .zip(seg.iter().zip(self.window.iter()))
                .for_each(|(d, (&s, &w))| *d += s * scale * w);
        }

        let range = if range == 0.0 { INT16_MAX } else { range };
        if range >= 0.0 {
            let samp_norm = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
            if samp_norm > 0.0 {
                let factor = range / samp_norm;
                samples.iter_mut().for_each(|s| *s *= factor);
                debug!("Rescale samples({}/{})", range, samp_norm);
            } else {
                warn!("synthesized waveform is silent, skipping rescale");
            }
        }

        let len = samples.len();
        Array2::from_shape_vec((1, len), samples)
            .map_err(|e| FrontendError::dims(e.to_string()))
    }

    fn condition_channel(&self, channel: usize, samples: &mut [f32]) {
        if self.opts.normalize_input {
            samples.iter_mut().for_each(|s| *s /= INT16_MAX);
        }
        if self.opts.enable_scale {
            let samp_norm = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
            if samp_norm > 0.0 {
                let factor = INT16_MAX / samp_norm;
                samples.iter_mut().for_each(|s| *s *= factor);
            } else {
                debug!("channel {} is silent, not scaled", channel);
            }
        }
    }

    fn check_window(&self) -> FrontendResult<()> {
        if self.window.len() != self.opts.frame_length {
            return Err(FrontendError::WindowMismatch {
                window: self.window.len(),
                frame_length: self.opts.frame_length,
            });
        }
        Ok(())
    }

    fn check_width(&self, stft: ArrayView2<f32>) -> FrontendResult<usize> {
        if stft.ncols() != self.padded_length() {
            return Err(FrontendError::dims(format!(
                "transform buffer has {} columns, expected {}",
                stft.ncols(),
                self.padded_length()
            )));
        }
        Ok(self.num_bins())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dsp::WindowType;
    use ndarray::array;

    fn rectangular(frame_length: usize, frame_shift: usize) -> WindowedTransform {
        WindowedTransform::new(StftOptions::new(frame_length, frame_shift, WindowType::Rectangular))
            .unwrap()
    }

    #[test]
    fn test_frame_counts() {
        let stft = rectangular(4, 2);
        assert_eq!(stft.num_frames(6), 2);
        assert_eq!(stft.num_frames(7), 2);
        assert_eq!(stft.num_frames(8), 3);
        assert_eq!(stft.num_frames(3), 1);
        assert_eq!(stft.num_samples(2), 6);
        assert_eq!(stft.num_samples(0), 0);
    }

    #[test]
    fn test_forward_small_signal() {
        let mut stft = rectangular(4, 2);
        let wave = array![[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]];
        let out = stft.forward(wave.view()).unwrap();
        assert_eq!(out.dim(), (2, 4));
        // frame 0 = rfft([1, 2, 3, 4]), frame 1 = rfft([3, 4, 5, 6])
        let expected = array![[10.0f32, -2.0, -2.0, 2.0], [18.0, -2.0, -2.0, 2.0]];
        for (a, b) in out.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-5, "{:?}", out);
        }
    }

    #[test]
    fn test_forward_is_channel_major() {
        let mut stft = rectangular(4, 4);
        let wave = array![[1.0f32, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0], [3.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0]];
        let out = stft.forward(wave.view()).unwrap();
        assert_eq!(out.nrows(), 4);
        // an impulse at frame start gives a flat spectrum: DC == Nyquist == amplitude
        let dc: Vec<f32> = out.column(0).to_vec();
        assert_eq!(dc, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_input_conditioning_flags() {
        let mut scaled = WindowedTransform::new(
            StftOptions::new(4, 4, WindowType::Rectangular).enable_scale(true),
        )
        .unwrap();
        let out = scaled.forward(array![[1.0f32, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0]].view()).unwrap();
        assert!((out[[0, 0]] - INT16_MAX).abs() < 1e-2);
        // a silent channel is left untouched
        assert!(out.row(1).iter().all(|v| v.abs() == 0.0));

        let mut normalized = WindowedTransform::new(
            StftOptions::new(4, 4, WindowType::Rectangular).normalize_input(true),
        )
        .unwrap();
        let out = normalized.forward(array![[INT16_MAX, 0.0, 0.0, 0.0]].view()).unwrap();
        assert!((out[[0, 0]] - 1.0).abs() < 1e-6);

        // normalization runs first, so the peak still lands on the 16-bit maximum
        let mut both = WindowedTransform::new(
            StftOptions::new(4, 4, WindowType::Rectangular)
                .normalize_input(true)
                .enable_scale(true),
        )
        .unwrap();
        let out = both.forward(array![[2.0f32, 0.0, 0.0, 0.0]].view()).unwrap();
        assert!((out[[0, 0]] - INT16_MAX).abs() < 1e-2);
    }

    #[test]
    fn test_short_signal_is_zero_padded() {
        let mut stft = rectangular(4, 2);
        let out = stft.forward(array![[1.0f32, 1.0]].view()).unwrap();
        assert_eq!(out.nrows(), 1);
        assert!((out[[0, 0]] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_waveform_is_rejected() {
        let mut stft = rectangular(4, 2);
        let wave = Array2::<f32>::zeros((1, 0));
        assert!(matches!(
            stft.forward(wave.view()),
            Err(FrontendError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_spectrogram_and_phase_of_dc_and_nyquist() {
        let stft = rectangular(4, 4);
        // DC = 3, Nyquist = -1, bin 1 = 0 + 2j
        let buffer = array![[3.0f32, -1.0, 0.0, 2.0]];
        let spec = stft.compute_spectrogram(buffer.view()).unwrap();
        assert_eq!(spec.dim(), (1, 3));
        assert!((spec[[0, 0]] - 3.0).abs() < 1e-6);
        assert!((spec[[0, 1]] - 2.0).abs() < 1e-6);
        assert!((spec[[0, 2]] - 1.0).abs() < 1e-6);

        let phase = stft.compute_phase_angle(buffer.view()).unwrap();
        assert!(phase[[0, 0]].abs() < 1e-6);
        assert!((phase[[0, 1]] - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((phase[[0, 2]] - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_log_spectrogram_is_floored() {
        let stft = WindowedTransform::new(
            StftOptions::new(4, 4, WindowType::Rectangular).apply_log(true),
        )
        .unwrap();
        let spec = stft.compute_spectrogram(Array2::<f32>::zeros((1, 4)).view()).unwrap();
        assert!(spec.iter().all(|v| v.is_finite()));
        assert!((spec[[0, 0]] - f32::EPSILON.ln()).abs() < 1e-4);
    }

    #[test]
    fn test_polar_rebuilds_interior_bins() {
        for opts in [
            StftOptions::new(8, 4, WindowType::Hanning),
            StftOptions::new(8, 4, WindowType::Hanning).apply_pow(true),
            StftOptions::new(8, 4, WindowType::Hanning).apply_log(true),
        ] {
            let mut stft = WindowedTransform::new(opts).unwrap();
            let wave = array![[0.3f32, -1.2, 2.5, 0.7, -0.1, 1.9, -2.2, 0.4, 1.1, -0.6, 0.2, 0.9]];
            let stats = stft.compute(wave.view()).unwrap();
            let rebuilt = stft.polar(stats.spectrogram.view(), stats.phase.view()).unwrap();
            assert_eq!(rebuilt.dim(), stats.stft.dim());
            for t in 0..rebuilt.nrows() {
                assert!((rebuilt[[t, 0]] - stats.stft[[t, 0]].abs()).abs() < 1e-3);
                assert!((rebuilt[[t, 1]] + stats.stft[[t, 1]].abs()).abs() < 1e-3);
                for k in 2..8 {
                    assert!((rebuilt[[t, k]] - stats.stft[[t, k]]).abs() < 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_polar_rejects_shape_mismatch() {
        let stft = rectangular(4, 4);
        let spec = Array2::<f32>::zeros((2, 3));
        let phase = Array2::<f32>::zeros((3, 3));
        assert!(stft.polar(spec.view(), phase.view()).is_err());
    }

    #[test]
    fn test_inverse_rejects_wrong_width() {
        let mut stft = rectangular(4, 4);
        let buffer = Array2::<f32>::zeros((2, 8));
        assert!(matches!(
            stft.inverse(buffer.view(), -1.0),
            Err(FrontendError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_inverse_of_silence_is_not_rescaled() {
        let mut stft = rectangular(4, 2);
        let wave = stft.inverse(Array2::<f32>::zeros((3, 4)).view(), 0.0).unwrap();
        assert_eq!(wave.dim(), (1, 8));
        assert!(wave.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_default_range_is_int16_max() {
        let mut stft = rectangular(4, 4);
        let wave = array![[0.1f32, -0.4, 0.2, 0.3, 0.0, 0.25, -0.05, 0.1]];
        let buffer = stft.forward(wave.view()).unwrap();
        let out = stft.inverse(buffer.view(), 0.0).unwrap();
        let peak = out.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!((peak - INT16_MAX).abs() < 1e-2);
    }
}
