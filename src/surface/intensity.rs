//! Intensity map: a bilinearly sampled scalar field in `[0, 1]` used to
//! locally attenuate the synthesis.
//!
//! Decoding goes through the `image` crate; a file that fails to decode is
//! treated as "no map attached" rather than an error.

use std::path::Path;

/// Single-channel raster sampled with normalized coordinates.
#[derive(Debug, Clone)]
pub struct IntensityMap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl IntensityMap {
    /// Decode an image file into a luma map. Returns `None` (with a logged
    /// warning) when the file cannot be decoded; the caller simulates at
    /// full intensity in that case.
    pub fn load(path: &Path) -> Option<Self> {
        match image::open(path) {
            Ok(img) => {
                let luma = img.into_luma8();
                log::info!(
                    "loaded intensity map {} ({}x{})",
                    path.display(),
                    luma.width(),
                    luma.height()
                );
                Some(Self {
                    width: luma.width(),
                    height: luma.height(),
                    data: luma.into_raw(),
                })
            }
            Err(err) => {
                log::warn!(
                    "intensity map {} failed to decode ({err}); simulating at full intensity",
                    path.display()
                );
                None
            }
        }
    }

    /// Build a map from raw single-channel samples, row-major.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != width * height`.
    pub fn from_luma(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height) as usize,
            "luma data does not match dimensions"
        );
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bilinear sample at normalized coordinates, result in `[0, 1]`.
    /// Upper neighbor indices clamp to the image bounds.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let max_x = self.width - 1;
        let max_y = self.height - 1;

        let uf = u * self.width as f32;
        let vf = v * self.height as f32;

        let x0 = (uf as u32).min(max_x);
        let y0 = (vf as u32).min(max_y);
        let x1 = (x0 + 1).min(max_x);
        let y1 = (y0 + 1).min(max_y);

        let xt = uf - x0 as f32;
        let yt = vf - y0 as f32;

        let at = |x: u32, y: u32| self.data[(y * self.width + x) as usize] as f32 / 255.0;
        let top = at(x0, y0) + (at(x1, y0) - at(x0, y0)) * xt;
        let bottom = at(x0, y1) + (at(x1, y1) - at(x0, y1)) * xt;
        top + (bottom - top) * yt
    }
}
