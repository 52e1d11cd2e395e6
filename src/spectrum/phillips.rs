//! Phillips-spectrum seeding and dispersion-driven time evolution.
//!
//! The statistical model behind the height field: each wavevector gets a
//! time-zero complex amplitude drawn from the Phillips spectral density, and
//! is advanced through time by a quantized deep-water dispersion relation.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::complex::Complex;
use super::gaussian::standard_normal_pair;

/// Wavevector magnitudes below this are treated as zero frequency.
pub const WAVEVECTOR_EPSILON: f32 = 1.0e-4;

/// Physical parameters of the wave spectrum. Fixed for the lifetime of a
/// simulation; changing them requires re-seeding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpectrumParams {
    /// Scales overall spectral energy. Not directly a wave height.
    pub amplitude: f32,
    /// Gravitational constant in m/s².
    pub gravity: f32,
    /// Wind direction and magnitude in m/s.
    pub wind: [f32; 2],
    /// Small-wave suppression constant. Empirical, kept configurable on
    /// purpose; tune against reference renders rather than deriving it.
    pub damping: f32,
    /// Real-world seconds after which the animation repeats exactly.
    pub loop_period: f32,
}

impl Default for SpectrumParams {
    fn default() -> Self {
        Self {
            amplitude: 5.0e-5,
            gravity: 9.81,
            wind: [64.0, 64.0],
            damping: 0.001,
            loop_period: 200.0,
        }
    }
}

impl SpectrumParams {
    /// Phillips spectral density at wavevector `k`.
    ///
    /// Zero below [`WAVEVECTOR_EPSILON`]; otherwise
    /// `A * exp(-1/(|k|² L²)) / |k|⁴ * (k̂·ŵ)² * exp(-|k|² l²)` where
    /// `L = |wind|²/g` is the characteristic largest wave and `l = L*damping`
    /// suppresses waves much smaller than that.
    pub fn spectral_density(&self, k: Vec2) -> f32 {
        let k_magnitude = k.length();
        if k_magnitude < WAVEVECTOR_EPSILON {
            return 0.0;
        }
        let wind = Vec2::from(self.wind);
        let wind_speed = wind.length();
        let largest_wave = wind_speed * wind_speed / self.gravity;
        let largest_wave_sq = largest_wave * largest_wave;

        let k_sq = k_magnitude * k_magnitude;
        let k_pow4 = k_sq * k_sq;
        let alignment = (k / k_magnitude).dot(wind / wind_speed);
        let small_wave_sq = largest_wave_sq * self.damping * self.damping;

        self.amplitude * (-1.0 / (k_sq * largest_wave_sq)).exp() / k_pow4
            * alignment
            * alignment
            * (-k_sq * small_wave_sq).exp()
    }

    /// Time-zero seed coefficient for wavevector `k`:
    /// `(q0 + i q1) * sqrt(P(k)/2)` with `(q0, q1)` standard-normal.
    pub fn seed_coefficient<R: Rng + ?Sized>(&self, k: Vec2, rng: &mut R) -> Complex {
        let (q0, q1) = standard_normal_pair(rng);
        Complex::new(q0, q1) * (self.spectral_density(k) / 2.0).sqrt()
    }

    /// Deep-water dispersion `sqrt(g|k|)`, quantized to a multiple of the
    /// base frequency `2π/loop_period` so the whole field is exactly
    /// periodic in time.
    pub fn dispersion(&self, k: Vec2) -> f32 {
        let base = std::f32::consts::TAU / self.loop_period;
        ((self.gravity * k.length()).sqrt() / base).floor() * base
    }

    /// Current frequency-domain value for one wavevector at time `t`:
    /// `seed * e^{iωt} + seed_conj * e^{-iωt}`.
    pub fn evolve(&self, seed: Complex, seed_conj: Complex, k: Vec2, time: f32) -> Complex {
        let omega_t = self.dispersion(k) * time;
        let forward = Complex::from_angle(omega_t);
        seed * forward + seed_conj * forward.conjugate()
    }
}
