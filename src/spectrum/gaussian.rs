//! Gaussian random source for spectral seeding.
//!
//! Polar (Marsaglia) rejection sampling: cheap, branchy, and produces the two
//! independent standard-normal variates each seed coefficient needs in one go.

use rand::Rng;

/// Draw two independent standard-normal variates.
pub fn standard_normal_pair<R: Rng + ?Sized>(rng: &mut R) -> (f32, f32) {
    loop {
        let x1 = rng.gen_range(-1.0f32..1.0);
        let x2 = rng.gen_range(-1.0f32..1.0);
        let w = x1 * x1 + x2 * x2;
        // Reject points outside the unit disc and the origin (ln(0) below).
        if w >= 1.0 || w == 0.0 {
            continue;
        }
        let m = ((-2.0 * w.ln()) / w).sqrt();
        return (x1 * m, x2 * m);
    }
}
