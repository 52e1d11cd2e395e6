//! Two-component complex number used throughout the spectral synthesis.
//!
//! Simulation logic works with this plain two-field type; conversion to the
//! transform library's layout happens only at the [`crate::spectrum::transform`]
//! boundary.

use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub};

use rustfft::num_complex::Complex32;

/// A complex number with `f32` components.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f32,
    pub im: f32,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    /// Complex conjugate.
    pub fn conjugate(self) -> Self {
        Self::new(self.re, -self.im)
    }

    /// `e^{i theta}` on the unit circle.
    pub fn from_angle(theta: f32) -> Self {
        Self::new(theta.cos(), theta.sin())
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl AddAssign for Complex {
    fn add_assign(&mut self, rhs: Complex) {
        *self = *self + rhs;
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Mul<f32> for Complex {
    type Output = Complex;

    fn mul(self, rhs: f32) -> Complex {
        Complex::new(self.re * rhs, self.im * rhs)
    }
}

impl MulAssign<f32> for Complex {
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        Complex::new(-self.re, -self.im)
    }
}

impl From<Complex> for Complex32 {
    fn from(c: Complex) -> Complex32 {
        Complex32::new(c.re, c.im)
    }
}

impl From<Complex32> for Complex {
    fn from(c: Complex32) -> Complex {
        Complex::new(c.re, c.im)
    }
}
