//! WAV and mask file handling for the CLI

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use ndarray::Array2;

use crate::config::INT16_MAX;

/// Multichannel recording loaded into `[channels x samples]`
#[derive(Debug, Clone)]
pub struct Recording {
    pub samples: Array2<f32>,
    pub sample_rate: u32,
}

/// Split a comma-separated input list, dropping empty entries
pub fn split_paths(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Read one WAV file, deinterleaved, samples on the 16-bit integer scale
fn read_wav(path: &Path) -> Result<(Vec<Vec<f32>>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();
    debug!(
        "{}: {} Hz, {} channel(s), {:?} {}-bit",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.sample_format,
        spec.bits_per_sample
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v * INT16_MAX))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            // rescale any integer depth onto the 16-bit range
            let shift = spec.bits_per_sample as i32 - 16;
            let scale = 2f32.powi(-shift);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mut out = vec![Vec::with_capacity(interleaved.len() / channels); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (c, &s) in frame.iter().enumerate() {
            out[c].push(s);
        }
    }
    Ok((out, spec.sample_rate))
}

/// Load the array signal.
///
/// A single path may be a multichannel file; several paths are stacked as
/// one channel each. Sample rates must agree and lengths are truncated to the
/// shortest channel.
pub fn read_channels(paths: &[PathBuf]) -> Result<Recording> {
    if paths.is_empty() {
        bail!("No input files given");
    }

    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut sample_rate = None;
    for path in paths {
        let (mut data, rate) = read_wav(path)?;
        match sample_rate {
            None => sample_rate = Some(rate),
            Some(expected) if expected != rate => {
                bail!(
                    "Sample rate mismatch: {} is {} Hz, expected {} Hz",
                    path.display(),
                    rate,
                    expected
                );
            }
            Some(_) => {}
        }
        if paths.len() > 1 && data.len() > 1 {
            warn!("{} has {} channels, keeping the first", path.display(), data.len());
            data.truncate(1);
        }
        channels.extend(data);
    }

    let min_len = channels.iter().map(Vec::len).min().unwrap_or(0);
    let max_len = channels.iter().map(Vec::len).max().unwrap_or(0);
    if min_len != max_len {
        warn!("Channel lengths differ ({} vs {}), truncating to {}", min_len, max_len, min_len);
    }
    if min_len == 0 {
        bail!("Input contains no samples");
    }

    let num_channels = channels.len();
    let samples = Array2::from_shape_fn((num_channels, min_len), |(c, n)| channels[c][n]);
    Ok(Recording {
        samples,
        sample_rate: sample_rate.unwrap_or(16000),
    })
}

/// Write a mono 16-bit PCM WAV, clamping to the integer range
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &s in samples {
        let v = s.round().clamp(i16::MIN as f32, INT16_MAX) as i16;
        writer.write_sample(v)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a JSON mask: an array of frames, each an array of per-bin weights
pub fn read_mask(path: &Path) -> Result<Array2<f32>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mask {}", path.display()))?;
    let rows: Vec<Vec<f32>> = serde_json::from_str(&json)
        .with_context(|| format!("Invalid mask {}", path.display()))?;
    mask_from_rows(rows)
}

pub(crate) fn mask_from_rows(rows: Vec<Vec<f32>>) -> Result<Array2<f32>> {
    let frames = rows.len();
    let bins = rows.first().map(Vec::len).unwrap_or(0);
    if frames == 0 || bins == 0 {
        bail!("Mask is empty");
    }
    if let Some(t) = rows.iter().position(|r| r.len() != bins) {
        bail!("Mask frame {} has {} bins, expected {}", t, rows[t].len(), bins);
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((frames, bins), flat)?)
}
