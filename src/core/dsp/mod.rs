//! Digital Signal Processing utilities
//!
//! Window functions, the packed real FFT and the multichannel short-time
//! Fourier transform built on them.

pub mod fft;
mod stft;
mod windows;

pub use fft::PackedRealFft;
pub use stft::{StftStats, WindowedTransform};
pub use windows::{create_window, WindowType};
