// tests/stft_test.rs
// Analysis/synthesis behavior of the windowed transform

mod test_utils;

use mvdr_frontend::{StftOptions, WindowType, WindowedTransform};
use ndarray::{arr2, Array2};
use test_utils::*;

fn transform(frame_length: usize, frame_shift: usize, window: WindowType) -> WindowedTransform {
    WindowedTransform::new(StftOptions::new(frame_length, frame_shift, window)).unwrap()
}

#[test]
fn overlapping_frames_match_plain_rfft() {
    let mut stft = transform(4, 2, WindowType::Rectangular);
    let wave = arr2(&[[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]]);
    let packed = stft.forward(wave.view()).unwrap();

    assert_eq!(packed.dim(), (2, 4));
    // rfft([1,2,3,4]) = [10, -2+2j, -2]
    assert_eq!(packed.row(0).to_vec(), vec![10.0, -2.0, -2.0, 2.0]);
    // rfft([3,4,5,6]) = [18, -2+2j, -2]
    assert_eq!(packed.row(1).to_vec(), vec![18.0, -2.0, -2.0, 2.0]);
}

#[test]
fn rectangular_hop_equal_to_length_reconstructs() {
    let mut stft = transform(8, 8, WindowType::Rectangular);
    let mut rng = rng(7);
    let wave = array_signal(&mut rng, 1, 64);
    let peak = wave.iter().fold(0.0f32, |m, &s| m.max(s.abs()));

    let packed = stft.forward(wave.view()).unwrap();
    let out = stft.inverse(packed.view(), peak).unwrap();

    assert_eq!(out.dim(), (1, 64));
    for (a, b) in out.iter().zip(wave.iter()) {
        assert!((a - b).abs() < 1e-2 * peak.max(1.0), "{} vs {}", a, b);
    }
}

#[test]
fn negative_range_keeps_overlap_add_level() {
    let mut stft = transform(4, 4, WindowType::Rectangular);
    let wave = arr2(&[[0.5f32, -0.25, 0.125, 1.0]]);
    let packed = stft.forward(wave.view()).unwrap();
    let out = stft.inverse(packed.view(), -1.0).unwrap();
    for (a, b) in out.iter().zip(wave.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn spectrogram_and_polar_rebuild_the_buffer() {
    let opts = StftOptions::new(16, 8, WindowType::Hanning).apply_log(true);
    let mut stft = WindowedTransform::new(opts).unwrap();
    let mut rng = rng(11);
    let wave = array_signal(&mut rng, 2, 80);

    let stats = stft.compute(wave.view()).unwrap();
    assert_eq!(stats.spectrogram.dim(), (2 * 9, 9));
    assert_eq!(stats.phase.dim(), stats.spectrogram.dim());

    let rebuilt = stft.polar(stats.spectrogram.view(), stats.phase.view()).unwrap();
    assert_eq!(rebuilt.dim(), stats.stft.dim());
    for (row_a, row_b) in rebuilt.outer_iter().zip(stats.stft.outer_iter()) {
        // interior bins come back exactly up to rounding; bin 0 keeps its magnitude
        let scale = row_b.iter().fold(1.0f32, |m, &s| m.max(s.abs()));
        assert!((row_a[0] - row_b[0].abs()).abs() < 1e-3 * scale);
        for k in 2..row_a.len() {
            assert!((row_a[k] - row_b[k]).abs() < 1e-3 * scale);
        }
    }
}

#[test]
fn short_signal_yields_one_padded_frame() {
    let mut stft = transform(8, 4, WindowType::Hamming);
    let wave = Array2::from_elem((3, 5), 1.0f32);
    let packed = stft.forward(wave.view()).unwrap();
    assert_eq!(packed.dim(), (3, 8));
    assert!(stft.forward(Array2::<f32>::zeros((1, 0)).view()).is_err());
}

#[test]
fn unknown_window_name_is_rejected() {
    assert!("triangular".parse::<WindowType>().is_err());
    assert_eq!("hann".parse::<WindowType>().unwrap(), WindowType::Hanning);
}
