//! Error types for the transform engine and beamforming algebra.
//!
//! Everything returned here is a configuration or precondition violation.
//! Numerical edge cases (singular covariance, silent frames, log of zero) are
//! absorbed where they occur and never surface as errors.

use thiserror::Error;

/// Convenience alias for results produced by this crate
pub type FrontendResult<T> = Result<T, FrontendError>;

/// Fatal errors raised by the front-end
#[derive(Error, Debug)]
pub enum FrontendError {
    /// Window name not in {hamming, hanning, blackman, rectangular}
    #[error("Unknown window type: {0}")]
    UnknownWindow(String),

    /// Option value outside its valid domain (zero frame sizes, empty input, ...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Cached analysis window does not match the configured frame length
    #[error("Window length {window} does not match frame length {frame_length}")]
    WindowMismatch { window: usize, frame_length: usize },

    /// Buffer shapes that do not agree with each other
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Malformed JSON configuration
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Failure inside the real FFT
    #[error("FFT error: {0}")]
    Fft(#[from] realfft::FftError),
}

impl FrontendError {
    pub(crate) fn dims(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    pub(crate) fn param(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}
