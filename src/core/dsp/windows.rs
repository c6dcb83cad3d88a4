//! Analysis/synthesis window functions

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FrontendError;

/// Window function types accepted by the short-time transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    #[default]
    Hamming,
    Hanning,
    Blackman,
    Rectangular,
}

impl WindowType {
    pub fn all() -> Vec<Self> {
        vec![Self::Hamming, Self::Hanning, Self::Blackman, Self::Rectangular]
    }

    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Hamming => "hamming",
            WindowType::Hanning => "hanning",
            WindowType::Blackman => "blackman",
            WindowType::Rectangular => "rectangular",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowType {
    type Err = FrontendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hamming" => Ok(Self::Hamming),
            "hanning" | "hann" => Ok(Self::Hanning),
            "blackman" => Ok(Self::Blackman),
            "rectangular" => Ok(Self::Rectangular),
            _ => Err(FrontendError::UnknownWindow(s.to_string())),
        }
    }
}

/// Create a symmetric window of `size` samples.
///
/// Uses the `(size - 1)` denominator, so Hann/Blackman end points are zero
/// (numpy convention, blackman coefficient 0.42).
pub fn create_window(size: usize, window_type: WindowType) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0; size];
    }

    let a = 2.0 * PI / (size - 1) as f64;
    (0..size)
        .map(|i| {
            let x = a * i as f64;
            let w = match window_type {
                WindowType::Hamming => 0.54 - 0.46 * x.cos(),
                WindowType::Hanning => 0.5 - 0.5 * x.cos(),
                WindowType::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                WindowType::Rectangular => 1.0,
            };
            w as f32
        })
        .collect()
}
