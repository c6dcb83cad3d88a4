//! Layout adapters between transform buffers and beamforming matrices
//!
//! Three layouts are involved:
//!
//! - packed transform buffer, `[(channels * frames) x padded_length]` real,
//!   channel-major row blocks (output of the forward transform)
//! - multichannel spectra, `[(bins * frames) x channels]` complex, bin-major
//!   row blocks; row `f * frames + t` is the channel vector x(t, f)
//! - channel-concatenated spectra, `[frames x (channels * bins)]` complex,
//!   channel `c` in columns `c * bins .. (c + 1) * bins`
//!
//! None of the conversions change any value.

use ndarray::{s, Array2, ArrayView2};
use num_complex::Complex32;

use crate::core::dsp::fft::{packed_bin, set_packed_bin};
use crate::error::{FrontendError, FrontendResult};

/// Re-derives per-channel views of stacked buffers for a fixed channel and bin count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelReshaper {
    num_channels: usize,
    num_bins: usize,
}

impl ChannelReshaper {
    pub fn new(num_channels: usize, num_bins: usize) -> FrontendResult<Self> {
        if num_channels == 0 || num_bins < 2 {
            return Err(FrontendError::param(format!(
                "reshaper needs at least one channel and two bins, got {} and {}",
                num_channels, num_bins
            )));
        }
        Ok(Self {
            num_channels,
            num_bins,
        })
    }

    /// Reshaper matching a packed transform buffer width
    pub fn for_padded_length(num_channels: usize, padded_length: usize) -> FrontendResult<Self> {
        Self::new(num_channels, padded_length / 2 + 1)
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn padded_length(&self) -> usize {
        (self.num_bins - 1) * 2
    }

    /// Frames per channel in a packed transform buffer
    pub fn num_frames(&self, stft: ArrayView2<f32>) -> FrontendResult<usize> {
        if stft.ncols() != self.padded_length() {
            return Err(FrontendError::dims(format!(
                "transform buffer has {} columns, expected {}",
                stft.ncols(),
                self.padded_length()
            )));
        }
        if stft.nrows() % self.num_channels != 0 {
            return Err(FrontendError::dims(format!(
                "{} transform rows do not split into {} channels",
                stft.nrows(),
                self.num_channels
            )));
        }
        Ok(stft.nrows() / self.num_channels)
    }

    /// Row block of channel `c` in a packed transform buffer
    pub fn channel<'a>(
        &self,
        stft: ArrayView2<'a, f32>,
        c: usize,
    ) -> FrontendResult<ArrayView2<'a, f32>> {
        let num_frames = self.num_frames(stft)?;
        if c >= self.num_channels {
            return Err(FrontendError::dims(format!(
                "channel {} out of range ({} channels)",
                c, self.num_channels
            )));
        }
        Ok(stft.slice_move(s![c * num_frames..(c + 1) * num_frames, ..]))
    }

    /// Packed transform buffer to bin-major multichannel spectra
    pub fn unpack(&self, stft: ArrayView2<f32>) -> FrontendResult<Array2<Complex32>> {
        let num_frames = self.num_frames(stft)?;
        let mut spectra = Array2::<Complex32>::zeros((self.num_bins * num_frames, self.num_channels));

        for c in 0..self.num_channels {
            for t in 0..num_frames {
                let row = stft.row(c * num_frames + t);
                let row = row
                    .as_slice()
                    .ok_or_else(|| FrontendError::dims("non-contiguous transform row"))?;
                for f in 0..self.num_bins {
                    spectra[[f * num_frames + t, c]] = packed_bin(row, f);
                }
            }
        }
        Ok(spectra)
    }

    /// Single-channel `[frames x bins]` complex spectra to packed rows
    pub fn pack(&self, spectra: ArrayView2<Complex32>) -> FrontendResult<Array2<f32>> {
        if spectra.ncols() != self.num_bins {
            return Err(FrontendError::dims(format!(
                "spectra have {} bins, expected {}",
                spectra.ncols(),
                self.num_bins
            )));
        }
        let padded_length = self.padded_length();
        let mut packed = Array2::<f32>::zeros((spectra.nrows(), padded_length));

        for (src, mut dst) in spectra.outer_iter().zip(packed.outer_iter_mut()) {
            let mut row = vec![0.0f32; padded_length];
            for (f, &value) in src.iter().enumerate() {
                set_packed_bin(&mut row, f, value);
            }
            dst.iter_mut().zip(row).for_each(|(d, v)| *d = v);
        }
        Ok(packed)
    }

    /// Channel-concatenated `[frames x (channels * bins)]` to bin-major
    /// `[(target_bins * frames) x channels]`, keeping the first `target_bins`
    /// bins of every channel.
    pub fn trim(
        &self,
        src: ArrayView2<Complex32>,
        target_bins: usize,
    ) -> FrontendResult<Array2<Complex32>> {
        if src.ncols() != self.num_channels * self.num_bins {
            return Err(FrontendError::dims(format!(
                "expected {} columns ({} channels x {} bins), got {}",
                self.num_channels * self.num_bins,
                self.num_channels,
                self.num_bins,
                src.ncols()
            )));
        }
        if target_bins == 0 || target_bins > self.num_bins {
            return Err(FrontendError::dims(format!(
                "cannot trim {} bins to {}",
                self.num_bins, target_bins
            )));
        }

        let num_frames = src.nrows();
        let mut dst = Array2::<Complex32>::zeros((target_bins * num_frames, self.num_channels));
        for c in 0..self.num_channels {
            for f in 0..target_bins {
                dst.slice_mut(s![f * num_frames..(f + 1) * num_frames, c])
                    .assign(&src.column(c * self.num_bins + f));
            }
        }
        Ok(dst)
    }

    /// Bin-major multichannel spectra back to channel-concatenated frames
    pub fn to_frame_major(&self, spectra: ArrayView2<Complex32>) -> FrontendResult<Array2<Complex32>> {
        let num_frames = self.spectra_frames(spectra)?;
        let mut dst = Array2::<Complex32>::zeros((num_frames, self.num_channels * self.num_bins));
        for c in 0..self.num_channels {
            for f in 0..self.num_bins {
                dst.column_mut(c * self.num_bins + f)
                    .assign(&spectra.slice(s![f * num_frames..(f + 1) * num_frames, c]));
            }
        }
        Ok(dst)
    }

    /// Frame count of bin-major multichannel spectra
    pub fn spectra_frames(&self, spectra: ArrayView2<Complex32>) -> FrontendResult<usize> {
        if spectra.ncols() != self.num_channels || spectra.nrows() % self.num_bins != 0 {
            return Err(FrontendError::dims(format!(
                "spectra of shape {:?} do not match {} bins x {} channels",
                spectra.dim(),
                self.num_bins,
                self.num_channels
            )));
        }
        Ok(spectra.nrows() / self.num_bins)
    }
}
