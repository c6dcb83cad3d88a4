//! Real FFT with the packed spectrum layout
//!
//! A length-N row holds the N/2 + 1 non-redundant bins of a real FFT:
//!
//! ```text
//! [re(0), re(N/2), re(1), im(1), re(2), im(2), ..., re(N/2-1), im(N/2-1)]
//! ```
//!
//! The imaginary parts of bin 0 and the Nyquist bin are identically zero for
//! real input, so they are not stored.

use std::sync::Arc;

use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use crate::error::{FrontendError, FrontendResult};

/// Number of bins held by a packed row of `padded_length` scalars
pub fn num_bins(padded_length: usize) -> usize {
    padded_length / 2 + 1
}

/// Read bin `f` of a packed row as a complex value
pub fn packed_bin(row: &[f32], f: usize) -> Complex32 {
    let n = row.len();
    if f == 0 {
        Complex32::new(row[0], 0.0)
    } else if f == n / 2 {
        Complex32::new(row[1], 0.0)
    } else {
        Complex32::new(row[2 * f], row[2 * f + 1])
    }
}

/// Write bin `f` of a packed row; the imaginary part of DC/Nyquist is dropped
pub fn set_packed_bin(row: &mut [f32], f: usize, value: Complex32) {
    let n = row.len();
    if f == 0 {
        row[0] = value.re;
    } else if f == n / 2 {
        row[1] = value.re;
    } else {
        row[2 * f] = value.re;
        row[2 * f + 1] = value.im;
    }
}

/// Pack `padded_length / 2 + 1` complex bins into a row of `padded_length` scalars
pub fn pack_spectrum(spectrum: &[Complex32], row: &mut [f32]) {
    debug_assert_eq!(spectrum.len(), num_bins(row.len()));
    for (f, &value) in spectrum.iter().enumerate() {
        set_packed_bin(row, f, value);
    }
}

/// Expand a packed row into its complex bins
pub fn unpack_spectrum(row: &[f32], spectrum: &mut [Complex32]) {
    debug_assert_eq!(spectrum.len(), num_bins(row.len()));
    for (f, value) in spectrum.iter_mut().enumerate() {
        *value = packed_bin(row, f);
    }
}

/// Forward/inverse real FFT of one fixed size, operating on packed rows in place.
///
/// Owns its plans and scratch space; not meant to be shared between threads.
pub struct PackedRealFft {
    size: usize,
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
    time: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl PackedRealFft {
    pub fn new(size: usize) -> FrontendResult<Self> {
        if size < 2 || size % 2 != 0 {
            return Err(FrontendError::param(format!(
                "packed real FFT needs an even size >= 2, got {}",
                size
            )));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward.get_scratch_len().max(inverse.get_scratch_len());

        Ok(Self {
            size,
            time: forward.make_input_vec(),
            spectrum: forward.make_output_vec(),
            scratch: vec![Complex32::new(0.0, 0.0); scratch_len],
            forward,
            inverse,
        })
    }

    /// Replace a row of time samples by its packed spectrum
    pub fn forward_in_place(&mut self, row: &mut [f32]) -> FrontendResult<()> {
        self.check_len(row.len())?;
        self.time.copy_from_slice(row);
        self.forward
            .process_with_scratch(&mut self.time, &mut self.spectrum, &mut self.scratch)?;
        pack_spectrum(&self.spectrum, row);
        Ok(())
    }

    /// Replace a packed spectrum by its (unnormalized) inverse transform.
    ///
    /// Like the forward direction the result is scaled by `size`.
    pub fn inverse_in_place(&mut self, row: &mut [f32]) -> FrontendResult<()> {
        self.check_len(row.len())?;
        unpack_spectrum(row, &mut self.spectrum);
        self.inverse
            .process_with_scratch(&mut self.spectrum, &mut self.time, &mut self.scratch)?;
        row.copy_from_slice(&self.time);
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn check_len(&self, len: usize) -> FrontendResult<()> {
        if len != self.size {
            return Err(FrontendError::dims(format!(
                "row of length {} passed to FFT of size {}",
                len, self.size
            )));
        }
        Ok(())
    }
}
