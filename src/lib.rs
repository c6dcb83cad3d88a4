//! mvdr-frontend - Multichannel speech enhancement front-end
//!
//! Windowed short-time Fourier analysis/synthesis and mask-based MVDR
//! beamforming for microphone arrays.
//!
//! ## Module Structure
//!
//! - `core::dsp` - Window functions, packed real FFT, multichannel STFT
//! - `core::beamforming` - Covariance, steering vectors, MVDR weights, combination
//! - `core::pipeline` - Per-utterance driver tying the stages together
//! - `config` - Transform and beamformer options (serde)
//! - `cli` - Command-line front end for the `mvdr-enhance` binary
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mvdr_frontend::{MvdrPipeline, StftOptions, BeamformerOptions, WindowType};
//!
//! let stft = StftOptions::new(512, 128, WindowType::Hanning);
//! let mut pipeline = MvdrPipeline::new(stft, BeamformerOptions::default())?;
//!
//! // wave: [channels x samples], mask: optional [frames x bins]
//! let out = pipeline.enhance(wave.view(), Some(mask.view()))?;
//! println!("{} samples, {} loaded bins", out.waveform.ncols(), out.solution.loaded_bins());
//! ```
//!
//! ## Packed spectrum layout
//!
//! Transform buffers keep one real row per frame and channel:
//! `[re(0), re(N/2), re(1), im(1), ..., re(N/2-1), im(N/2-1)]`, where N is the
//! frame length rounded up to a power of two.
//!
//! ## Synthesis
//!
//! Overlap-add uses the analysis window as the synthesis window without
//! orthogonalizing it, then rescales the peak to a target range.

// Core transform and beamforming functionality
pub mod core;

// Command-line interface
pub mod cli;

// Transform and beamformer options
pub mod config;

// Error types
pub mod error;

// Re-export commonly used types at crate root for convenience
pub use config::{BeamformerOptions, FrontendConfig, StftOptions};
pub use core::{
    beamform, beamform_packed, estimate_steer_vector, ChannelReshaper, CovarianceEstimator,
    Enhancement, MvdrPipeline, MvdrSolution, MvdrWeightSolver, StftStats, WindowType,
    WindowedTransform,
};
pub use error::{FrontendError, FrontendResult};
