//! 2D frequency transform boundary over RustFFT.
//!
//! RustFFT plans one-dimensional transforms, so the 2D pass runs every row in
//! place and then every column through a gathered scratch buffer. The crate's
//! own [`Complex`] is converted to the library's interleaved layout on entry
//! and back on exit; nothing else in the crate sees `Complex32`.

use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use super::complex::Complex;

/// Forward 2D discrete Fourier transform of a square complex grid.
pub struct Fft2d {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    work: Vec<Complex32>,
    column: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl Fft2d {
    /// Plan a forward transform for a `size x size` grid.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();
        Self {
            size,
            fft,
            work: vec![Complex32::default(); size * size],
            column: vec![Complex32::default(); size],
            scratch: vec![Complex32::default(); scratch_len],
        }
    }

    /// Grid side length this transform was planned for.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Transform `field` in place. Unnormalized, forward (`e^{-i...}`) sign
    /// convention, row-major layout.
    ///
    /// # Panics
    ///
    /// Panics if `field.len() != size * size`.
    pub fn process(&mut self, field: &mut [Complex]) {
        let n = self.size;
        assert_eq!(field.len(), n * n, "field does not match planned grid");

        for (dst, src) in self.work.iter_mut().zip(field.iter()) {
            *dst = (*src).into();
        }

        // Row pass: rows are contiguous, transform them where they sit.
        for row in self.work.chunks_exact_mut(n) {
            self.fft.process_with_scratch(row, &mut self.scratch);
        }

        // Column pass: gather, transform, scatter.
        for x in 0..n {
            for z in 0..n {
                self.column[z] = self.work[z * n + x];
            }
            self.fft
                .process_with_scratch(&mut self.column, &mut self.scratch);
            for z in 0..n {
                self.work[z * n + x] = self.column[z];
            }
        }

        for (dst, src) in field.iter_mut().zip(self.work.iter()) {
            *dst = (*src).into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_field_concentrates_at_dc() {
        let n = 8;
        let mut fft = Fft2d::new(n);
        let mut field = vec![Complex::new(0.5, 0.0); n * n];
        fft.process(&mut field);

        // Unnormalized forward transform: DC bin collects n² * value.
        assert!((field[0].re - 0.5 * (n * n) as f32).abs() < 1e-3);
        assert!(field[0].im.abs() < 1e-3);
        for value in &field[1..] {
            assert!(value.re.abs() < 1e-3);
            assert!(value.im.abs() < 1e-3);
        }
    }

    #[test]
    fn test_impulse_spreads_flat() {
        let n = 4;
        let mut fft = Fft2d::new(n);
        let mut field = vec![Complex::ZERO; n * n];
        field[0] = Complex::new(1.0, 0.0);
        fft.process(&mut field);

        for value in &field {
            assert!((value.re - 1.0).abs() < 1e-5);
            assert!(value.im.abs() < 1e-5);
        }
    }

    #[test]
    #[should_panic(expected = "field does not match planned grid")]
    fn test_rejects_mismatched_field() {
        let mut fft = Fft2d::new(8);
        let mut field = vec![Complex::ZERO; 16];
        fft.process(&mut field);
    }
}
