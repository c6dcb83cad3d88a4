// tests/test_utils/mod.rs
//
// Shared helpers for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::Command;

use ndarray::Array2;
use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mvdr-enhance"))
}

pub fn run_enhance() -> Command {
    Command::new(get_binary_path())
}

/// Scratch directory unique to this test process
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mvdr-test-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `[rows x cols]` complex samples with unit-variance parts
pub fn random_complex(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<Complex32> {
    Array2::from_shape_fn((rows, cols), |_| {
        Complex32::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    })
}

/// Random unit-norm channel vector
pub fn random_unit_vector(rng: &mut StdRng, channels: usize) -> Vec<Complex32> {
    let v: Vec<Complex32> = (0..channels)
        .map(|_| Complex32::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();
    let norm = v.iter().map(|c| c.norm_sqr()).sum::<f32>().sqrt();
    v.into_iter().map(|c| c / norm).collect()
}

/// Multichannel tone plus noise on the 16-bit scale: `[channels x samples]`
pub fn array_signal(rng: &mut StdRng, channels: usize, samples: usize) -> Array2<f32> {
    Array2::from_shape_fn((channels, samples), |(c, n)| {
        let t = (n as f32 - 2.0 * c as f32) / 16000.0;
        let tone = (2.0 * std::f32::consts::PI * 440.0 * t).sin();
        8000.0 * tone + 500.0 * rng.gen_range(-1.0f32..1.0)
    })
}

pub fn write_wav(path: &std::path::Path, channels: u16, interleaved: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create wav");
    for &s in interleaved {
        writer.write_sample(s).expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize wav");
}
