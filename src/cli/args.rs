//! CLI argument parsing

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::FrontendConfig;
use crate::core::dsp::WindowType;

/// Parsed CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "mvdr-enhance")]
#[command(about = "Mask-based MVDR enhancement of microphone array recordings")]
pub struct Args {
    /// Comma-separated per-channel WAV files, or a single multichannel WAV
    #[arg(short, long, required_unless_present = "batch")]
    pub input: Option<String>,

    /// Enhanced output WAV (16-bit PCM)
    #[arg(short, long, required_unless_present = "batch")]
    pub output: Option<PathBuf>,

    /// JSON time-frequency mask, an array of frames each holding one weight per bin
    #[arg(short, long)]
    pub mask: Option<PathBuf>,

    /// JSON configuration with "stft" and "beamformer" sections
    #[arg(short, long, env = "MVDR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Batch list; each line is "<inputs> <output> [mask]"
    #[arg(short, long)]
    pub batch: Option<PathBuf>,

    /// Frame length in number of samples
    #[arg(long)]
    pub frame_length: Option<usize>,

    /// Frame shift in number of samples
    #[arg(long)]
    pub frame_shift: Option<usize>,

    /// Window type (hamming, hanning, blackman, rectangular)
    #[arg(long)]
    pub window: Option<String>,

    /// Output peak amplitude (0: 16-bit maximum, negative: keep raw level)
    #[arg(long, allow_negative_numbers = true)]
    pub range: Option<f32>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Configuration file (if any) with command-line overrides applied
    pub fn resolve_config(&self) -> Result<FrontendConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                FrontendConfig::from_json(&json)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => FrontendConfig::default(),
        };

        if let Some(frame_length) = self.frame_length {
            config.stft.frame_length = frame_length;
        }
        if let Some(frame_shift) = self.frame_shift {
            config.stft.frame_shift = frame_shift;
        }
        if let Some(window) = &self.window {
            config.stft.window = window.parse::<WindowType>()?;
        }
        if let Some(range) = self.range {
            config.beamformer.range = range;
        }

        config.stft.validate()?;
        config.beamformer.validate()?;
        Ok(config)
    }
}
