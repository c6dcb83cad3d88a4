// src/config/options.rs
//
// Transform and beamformer options

use serde::{Deserialize, Serialize};

use crate::core::dsp::WindowType;
use crate::error::{FrontendError, FrontendResult};

/// Largest positive 16-bit sample, the default synthesis range
pub const INT16_MAX: f32 = i16::MAX as f32;

/// Short-time Fourier transform options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StftOptions {
    /// Frame shift in number of samples
    pub frame_shift: usize,
    /// Frame length in number of samples
    pub frame_length: usize,
    /// Analysis (and synthesis) window
    pub window: WindowType,
    /// Scale samples into [-1, 1] by dividing by the 16-bit maximum
    pub normalize_input: bool,
    /// Scale each channel so its infinity norm equals the 16-bit maximum
    pub enable_scale: bool,
    /// Power spectrum instead of magnitude (spectrogram and polar only)
    pub apply_pow: bool,
    /// Natural log on the computed spectrogram
    pub apply_log: bool,
}

impl Default for StftOptions {
    fn default() -> Self {
        Self {
            frame_shift: 256,
            frame_length: 1024,
            window: WindowType::Hamming,
            normalize_input: false,
            enable_scale: false,
            apply_pow: false,
            apply_log: false,
        }
    }
}

impl StftOptions {
    pub fn new(frame_length: usize, frame_shift: usize, window: WindowType) -> Self {
        Self {
            frame_length,
            frame_shift,
            window,
            ..Default::default()
        }
    }

    pub fn apply_pow(mut self, enabled: bool) -> Self {
        self.apply_pow = enabled;
        self
    }

    pub fn apply_log(mut self, enabled: bool) -> Self {
        self.apply_log = enabled;
        self
    }

    pub fn normalize_input(mut self, enabled: bool) -> Self {
        self.normalize_input = enabled;
        self
    }

    pub fn enable_scale(mut self, enabled: bool) -> Self {
        self.enable_scale = enabled;
        self
    }

    /// FFT size: next power of two not below the frame length
    pub fn padded_length(&self) -> usize {
        self.frame_length.next_power_of_two()
    }

    /// Number of non-redundant real-FFT bins
    pub fn num_bins(&self) -> usize {
        self.padded_length() / 2 + 1
    }

    pub fn validate(&self) -> FrontendResult<()> {
        if self.frame_length == 0 || self.frame_shift == 0 {
            return Err(FrontendError::param(format!(
                "frame_length ({}) and frame_shift ({}) must be positive",
                self.frame_length, self.frame_shift
            )));
        }
        // The packed layout needs distinct DC and Nyquist slots
        if self.padded_length() < 2 {
            return Err(FrontendError::param("frame_length must be at least 2"));
        }
        Ok(())
    }
}

/// MVDR solver and synthesis options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamformerOptions {
    /// Loading factor, relative to the mean eigenvalue of the covariance
    pub diagonal_loading: f64,
    /// Lower bound on the mean eigenvalue used to scale the loading
    pub loading_floor: f64,
    /// Eigenvalue spread above which a covariance block counts as ill-conditioned
    pub condition_limit: f64,
    /// Peak amplitude of the synthesized waveform (0: 16-bit max, < 0: no rescale)
    pub range: f32,
}

impl Default for BeamformerOptions {
    fn default() -> Self {
        Self {
            diagonal_loading: 1e-3,
            loading_floor: 1e-8,
            condition_limit: 1e6,
            range: 0.0,
        }
    }
}

impl BeamformerOptions {
    pub fn validate(&self) -> FrontendResult<()> {
        if !(self.diagonal_loading > 0.0) || !(self.loading_floor > 0.0) {
            return Err(FrontendError::param(
                "diagonal_loading and loading_floor must be positive",
            ));
        }
        if !(self.condition_limit >= 1.0) {
            return Err(FrontendError::param("condition_limit must be at least 1"));
        }
        Ok(())
    }
}

/// Complete front-end configuration, as read from JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub stft: StftOptions,
    pub beamformer: BeamformerOptions,
}

impl FrontendConfig {
    pub fn from_json(json: &str) -> FrontendResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.stft.validate()?;
        config.beamformer.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> FrontendResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
