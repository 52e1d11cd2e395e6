//! Frequency-domain side of the simulation.
//!
//! This module provides:
//! - A plain two-field complex type with explicit transform-boundary conversion
//! - Phillips-spectrum seeding from a seeded Gaussian source
//! - Quantized dispersion and per-frame time evolution
//! - A 2D forward FFT over RustFFT

pub mod complex;
pub mod gaussian;
pub mod phillips;
pub mod transform;

pub use complex::Complex;
pub use gaussian::standard_normal_pair;
pub use phillips::{SpectrumParams, WAVEVECTOR_EPSILON};
pub use transform::Fft2d;
