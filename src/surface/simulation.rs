//! The ocean-surface simulation context.
//!
//! Owns the seed coefficients, the five frequency-domain fields, the 2D
//! transform, and the double-buffered vertex arrays. One `update` call
//! evolves the spectrum to the given time and synthesizes a complete spatial
//! frame into the write buffer; `swap_buffers` publishes it to queries and
//! exports.

use std::mem;
use std::path::Path;

use bytemuck::Zeroable;
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::spectrum::{Complex, Fft2d, SpectrumParams, WAVEVECTOR_EPSILON};
use crate::surface::intensity::IntensityMap;
use crate::surface::mesh::{
    build_index_buffer, build_instance_offsets, FrameView, GridLayout, InstanceOffset, Vertex,
    VertexExtra,
};
use crate::surface::SurfaceError;

/// Smallest meaningful distance between neighboring vertices, in meters.
pub const MIN_GRID_SPACING: f32 = 0.02;

/// Substituted for an exactly-zero intensity sample so the normal's inverse
/// scaling never divides by zero.
const INTENSITY_EPSILON: f32 = 1.0e-4;

/// Construction parameters. All of them are fixed for the lifetime of the
/// surface; changing the spectrum requires building a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Simulated cells per side. Must be a power of two.
    pub grid_dimension: usize,
    /// Physical side length of one tile in meters.
    pub domain_length: f32,
    /// The tiling renderer draws `expansion²` copies of the base tile.
    pub expansion: u32,
    /// RNG seed for the spectral initializer; same seed, same ocean.
    pub seed: u64,
    /// Scales synthesized heights.
    pub height_scale: f32,
    /// Scales horizontal (choppy) displacement.
    pub displace_scale: f32,
    pub spectrum: SpectrumParams,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            grid_dimension: 256,
            domain_length: 256.0,
            expansion: 5,
            seed: 0,
            height_scale: 1.0,
            displace_scale: 1.0,
            spectrum: SpectrumParams::default(),
        }
    }
}

/// Spectral ocean-surface simulation driving a tileable mesh.
pub struct OceanSurface {
    layout: GridLayout,
    spectrum: SpectrumParams,
    height_scale: f32,
    displace_scale: f32,
    extras: Vec<VertexExtra>,
    height: Vec<Complex>,
    slope_x: Vec<Complex>,
    slope_z: Vec<Complex>,
    displace_x: Vec<Complex>,
    displace_z: Vec<Complex>,
    fft: Fft2d,
    intensity: Option<IntensityMap>,
    front: Vec<Vertex>,
    back: Vec<Vertex>,
    indices: Vec<u32>,
    instances: Vec<InstanceOffset>,
}

impl OceanSurface {
    /// Build a surface, seeding every wavevector once.
    ///
    /// Fails with a typed configuration error when the grid dimension is not
    /// a power of two or the resulting vertex spacing falls below
    /// [`MIN_GRID_SPACING`]. Neither error is retryable with the same
    /// parameters.
    pub fn new(config: SurfaceConfig) -> Result<Self, SurfaceError> {
        if !config.grid_dimension.is_power_of_two() {
            return Err(SurfaceError::InvalidGridDimension(config.grid_dimension));
        }
        let spacing = config.domain_length / config.grid_dimension as f32;
        if spacing < MIN_GRID_SPACING {
            return Err(SurfaceError::ExcessiveGridSpacing {
                spacing,
                minimum: MIN_GRID_SPACING,
            });
        }

        let layout = GridLayout {
            grid_dim: config.grid_dimension,
            x_length: config.domain_length,
            z_length: config.domain_length,
        };
        log::info!(
            "ocean surface: {0}x{0} cells over {1}x{1} m ({2:.3} m spacing), {3}² instances",
            layout.grid_dim,
            layout.x_length,
            spacing,
            config.expansion,
        );

        // Seed every cell once: the coefficient for k, and the conjugated
        // coefficient for -k. The pair keeps the synthesized field real.
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut extras = Vec::with_capacity(layout.cell_count());
        for z in 0..layout.grid_dim {
            for x in 0..layout.grid_dim {
                let k = layout.wavevector(x, z);
                let seed = config.spectrum.seed_coefficient(k, &mut rng);
                let seed_conj = config.spectrum.seed_coefficient(-k, &mut rng).conjugate();
                extras.push(VertexExtra {
                    origin: layout.origin_position(x, z),
                    seed,
                    seed_conj,
                });
            }
        }

        let mut at_rest = Vec::with_capacity(layout.vertex_count());
        for z in 0..layout.stride() {
            for x in 0..layout.stride() {
                at_rest.push(Vertex::at_rest(layout.origin_position(x, z)));
            }
        }

        let cells = layout.cell_count();
        Ok(Self {
            spectrum: config.spectrum,
            height_scale: config.height_scale,
            displace_scale: config.displace_scale,
            extras,
            height: vec![Complex::ZERO; cells],
            slope_x: vec![Complex::ZERO; cells],
            slope_z: vec![Complex::ZERO; cells],
            displace_x: vec![Complex::ZERO; cells],
            displace_z: vec![Complex::ZERO; cells],
            fft: Fft2d::new(layout.grid_dim),
            intensity: None,
            front: at_rest.clone(),
            back: at_rest,
            indices: build_index_buffer(&layout),
            instances: build_instance_offsets(&layout, config.expansion),
            layout,
        })
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn set_height_scale(&mut self, scale: f32) {
        self.height_scale = scale;
    }

    pub fn set_displace_scale(&mut self, scale: f32) {
        self.displace_scale = scale;
    }

    /// Attach an intensity map. Only call between frames; the map is read
    /// during synthesis and is not internally synchronized.
    pub fn attach_intensity_map(&mut self, map: IntensityMap) {
        self.intensity = Some(map);
    }

    /// Detach the intensity map, returning whether one was attached.
    pub fn detach_intensity_map(&mut self) -> bool {
        self.intensity.take().is_some()
    }

    /// Load an intensity map from an image file. A decode failure leaves the
    /// feature disabled and returns `false`.
    pub fn load_intensity_map<P: AsRef<Path>>(&mut self, path: P) -> bool {
        match IntensityMap::load(path.as_ref()) {
            Some(map) => {
                self.attach_intensity_map(map);
                true
            }
            None => false,
        }
    }

    /// Advance the simulation to `time` seconds, writing a complete frame
    /// into the write buffer. Does not touch the read buffer; follow with
    /// [`swap_buffers`](Self::swap_buffers) to publish.
    pub fn update(&mut self, time: f32) {
        let mut back = mem::take(&mut self.back);
        self.synthesize_into(&mut back, time);
        self.back = back;
    }

    /// Swap read and write buffers. O(1); the vertex data never moves.
    pub fn swap_buffers(&mut self) {
        mem::swap(&mut self.front, &mut self.back);
    }

    /// Evolve all five frequency-domain fields to `time`, transform them,
    /// and assemble the spatial frame into `frame`.
    pub(crate) fn synthesize_into(&mut self, frame: &mut Vec<Vertex>, time: f32) {
        let grid = self.layout.grid_dim;
        let stride = self.layout.stride();
        frame.resize(self.layout.vertex_count(), Vertex::zeroed());

        for z in 0..grid {
            for x in 0..grid {
                let cell = z * grid + x;
                let extra = &self.extras[cell];
                let k = self.layout.wavevector(x, z);
                let h = self.spectrum.evolve(extra.seed, extra.seed_conj, k, time);
                self.height[cell] = h;
                self.slope_x[cell] = h * Complex::new(0.0, k.x);
                self.slope_z[cell] = h * Complex::new(0.0, k.y);
                let k_magnitude = k.length();
                if k_magnitude < WAVEVECTOR_EPSILON {
                    // No meaningful direction to displace toward at k ~ 0.
                    self.displace_x[cell] = Complex::ZERO;
                    self.displace_z[cell] = Complex::ZERO;
                } else {
                    self.displace_x[cell] = h * Complex::new(0.0, -k.x / k_magnitude);
                    self.displace_z[cell] = h * Complex::new(0.0, -k.y / k_magnitude);
                }
            }
        }

        self.fft.process(&mut self.height);
        self.fft.process(&mut self.slope_x);
        self.fft.process(&mut self.slope_z);
        self.fft.process(&mut self.displace_x);
        self.fft.process(&mut self.displace_z);

        for z in 0..grid {
            for x in 0..grid {
                let cell = z * grid + x;
                // The spectrum was authored with zero frequency at the grid
                // center; the transform puts it at index zero. The
                // checkerboard sign undoes the implied half-grid shift.
                let sign = if (x + z) % 2 == 0 { 1.0f32 } else { -1.0 };

                let mut height_factor = self.height_scale;
                let mut normal_y = 1.0 / self.height_scale;
                if let Some(map) = &self.intensity {
                    let mut intensity =
                        map.sample(x as f32 / grid as f32, z as f32 / grid as f32);
                    if intensity == 0.0 {
                        intensity = INTENSITY_EPSILON;
                    }
                    height_factor *= intensity;
                    normal_y /= intensity;
                }

                let origin = self.extras[cell].origin;
                let vert = &mut frame[z * stride + x];
                vert.position = [
                    origin.x + self.displace_scale * sign * self.displace_x[cell].re,
                    height_factor * sign * self.height[cell].re,
                    origin.z + self.displace_scale * sign * self.displace_z[cell].re,
                    0.0,
                ];
                vert.normal = [
                    -(sign * self.slope_x[cell].re),
                    normal_y,
                    -(sign * self.slope_z[cell].re),
                    0.0,
                ];
            }
        }

        self.stitch_seams(frame);
    }

    /// Duplicate the first row/column onto the last, offset by the domain
    /// length, so tiled copies of the mesh meet exactly.
    fn stitch_seams(&self, frame: &mut [Vertex]) {
        let grid = self.layout.grid_dim;
        let stride = self.layout.stride();
        let (x_length, z_length) = (self.layout.x_length, self.layout.z_length);

        for z in 0..grid {
            let src = frame[z * stride];
            frame[z * stride + grid] = offset_vertex(src, x_length, 0.0);
        }
        for x in 0..grid {
            let src = frame[x];
            frame[grid * stride + x] = offset_vertex(src, 0.0, z_length);
        }
        frame[grid * stride + grid] = offset_vertex(frame[0], x_length, z_length);
    }

    /// View of the frame currently readable by the consumer.
    pub fn frame(&self) -> FrameView<'_> {
        FrameView::new(self.layout, &self.front)
    }

    /// Interpolated height at a world location, read from the read buffer.
    pub fn height_at(&self, location: Vec2) -> f32 {
        self.frame().height_at(location)
    }

    /// Interpolated height and unit normal at a world location.
    pub fn height_normal_at(&self, location: Vec2) -> (f32, Vec3) {
        self.frame().height_normal_at(location)
    }

    /// Raw bytes of the readable vertex buffer.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.front)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Hand both vertex buffers to the threading harness. The surface is
    /// unusable for standalone updates until they are reattached.
    pub(crate) fn detach_buffers(&mut self) -> (Vec<Vertex>, Vec<Vertex>) {
        (mem::take(&mut self.front), mem::take(&mut self.back))
    }

    /// Reattach circulating buffers, installing `front` as the read buffer.
    pub(crate) fn attach_buffers(&mut self, mut front: Vec<Vertex>, mut back: Vec<Vertex>) {
        front.resize(self.layout.vertex_count(), Vertex::zeroed());
        back.resize(self.layout.vertex_count(), Vertex::zeroed());
        self.front = front;
        self.back = back;
    }
}

fn offset_vertex(mut v: Vertex, dx: f32, dz: f32) -> Vertex {
    v.position[0] += dx;
    v.position[2] += dz;
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SurfaceConfig {
        SurfaceConfig {
            grid_dimension: 8,
            domain_length: 8.0,
            expansion: 1,
            seed: 11,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_non_power_of_two_grid() {
        for dim in [0, 3, 5, 12, 100] {
            let err = OceanSurface::new(SurfaceConfig {
                grid_dimension: dim,
                ..small_config()
            })
            .err()
            .expect("construction must fail");
            assert!(matches!(err, SurfaceError::InvalidGridDimension(d) if d == dim));
        }
    }

    #[test]
    fn test_rejects_excessive_grid_spacing() {
        let err = OceanSurface::new(SurfaceConfig {
            grid_dimension: 64,
            domain_length: 0.5,
            ..small_config()
        })
        .err()
        .expect("construction must fail");
        assert!(matches!(err, SurfaceError::ExcessiveGridSpacing { .. }));
    }

    #[test]
    fn test_initial_mesh_is_flat() {
        let surface = OceanSurface::new(small_config()).unwrap();
        for v in surface.frame().vertices() {
            assert_eq!(v.position[1], 0.0);
            assert_eq!(v.normal, [0.0, 1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_update_produces_nonflat_surface() {
        let mut surface = OceanSurface::new(small_config()).unwrap();
        surface.update(1.0);
        surface.swap_buffers();
        let peak = surface
            .frame()
            .vertices()
            .iter()
            .map(|v| v.position[1].abs())
            .fold(0.0f32, f32::max);
        assert!(peak > 0.0, "spectrum synthesized a flat ocean");
    }

    #[test]
    fn test_update_only_touches_write_buffer() {
        let mut surface = OceanSurface::new(small_config()).unwrap();
        let before = surface.vertex_bytes().to_vec();
        surface.update(2.5);
        assert_eq!(surface.vertex_bytes(), &before[..]);
        surface.swap_buffers();
        assert_ne!(surface.vertex_bytes(), &before[..]);
    }

    #[test]
    fn test_same_seed_same_ocean() {
        let mut a = OceanSurface::new(small_config()).unwrap();
        let mut b = OceanSurface::new(small_config()).unwrap();
        a.update(3.25);
        b.update(3.25);
        a.swap_buffers();
        b.swap_buffers();
        assert_eq!(a.vertex_bytes(), b.vertex_bytes());
    }

    #[test]
    fn test_intensity_map_scales_heights_and_normals() {
        let mut plain = OceanSurface::new(small_config()).unwrap();
        let mut damped = OceanSurface::new(small_config()).unwrap();
        // 50% gray everywhere: heights halve, normal Y doubles.
        damped.attach_intensity_map(IntensityMap::from_luma(2, 2, vec![128; 4]));

        plain.update(1.0);
        damped.update(1.0);
        plain.swap_buffers();
        damped.swap_buffers();

        let factor = 128.0 / 255.0;
        let grid = plain.layout().grid_dim;
        let stride = plain.layout().stride();
        for z in 0..grid {
            for x in 0..grid {
                let a = plain.frame().vertices()[z * stride + x];
                let b = damped.frame().vertices()[z * stride + x];
                assert!((b.position[1] - a.position[1] * factor).abs() < 1e-5);
                assert!((b.normal[1] - a.normal[1] / factor).abs() < 1e-4);
                // Horizontal displacement and slopes are unaffected.
                assert!((b.position[0] - a.position[0]).abs() < 1e-6);
                assert!((b.normal[0] - a.normal[0]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_zero_intensity_substitutes_epsilon() {
        let mut surface = OceanSurface::new(small_config()).unwrap();
        surface.attach_intensity_map(IntensityMap::from_luma(1, 1, vec![0]));
        surface.update(1.0);
        surface.swap_buffers();
        for v in surface.frame().vertices() {
            assert!(v.normal[1].is_finite());
            assert!(v.position[1].is_finite());
        }
    }

    #[test]
    fn test_detach_intensity_map_reports_presence() {
        let mut surface = OceanSurface::new(small_config()).unwrap();
        assert!(!surface.detach_intensity_map());
        surface.attach_intensity_map(IntensityMap::from_luma(1, 1, vec![255]));
        assert!(surface.detach_intensity_map());
        assert!(!surface.detach_intensity_map());
    }

    #[test]
    fn test_export_sizes() {
        let surface = OceanSurface::new(SurfaceConfig {
            expansion: 3,
            ..small_config()
        })
        .unwrap();
        let verts = surface.layout().vertex_count();
        assert_eq!(surface.vertex_bytes().len(), verts * 32);
        assert_eq!(surface.index_count(), 6 * surface.layout().cell_count());
        assert_eq!(surface.index_bytes().len(), surface.index_count() * 4);
        assert_eq!(surface.instance_count(), 9);
        assert_eq!(surface.instance_bytes().len(), 9 * 16);
    }
}
