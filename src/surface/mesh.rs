//! Grid geometry, vertex records, and the static render buffers.
//!
//! The simulated field lives on a `grid_dim x grid_dim` periodic grid; the
//! rendered mesh carries one extra row and column of duplicated seam vertices
//! so adjacent tiled copies meet without a crack.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::spectrum::Complex;

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn quad_lerp(a: f32, b: f32, c: f32, d: f32, tx: f32, tz: f32) -> f32 {
    lerp(lerp(a, b, tx), lerp(c, d, tx), tz)
}

/// Dimensions of the simulated grid and its physical extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Simulated cells per side. Power of two.
    pub grid_dim: usize,
    /// Physical side length along X in meters.
    pub x_length: f32,
    /// Physical side length along Z in meters.
    pub z_length: f32,
}

impl GridLayout {
    /// Vertices per mesh side: one more than the grid so the seam can be
    /// duplicated.
    pub fn stride(&self) -> usize {
        self.grid_dim + 1
    }

    /// Total mesh vertices, seam included.
    pub fn vertex_count(&self) -> usize {
        self.stride() * self.stride()
    }

    /// Simulated cells (transform grid size).
    pub fn cell_count(&self) -> usize {
        self.grid_dim * self.grid_dim
    }

    /// Physical distance between neighboring vertices along X.
    pub fn x_spacing(&self) -> f32 {
        self.x_length / self.grid_dim as f32
    }

    /// Physical distance between neighboring vertices along Z.
    pub fn z_spacing(&self) -> f32 {
        self.z_length / self.grid_dim as f32
    }

    /// Wavevector for grid cell `(x, z)`, zero frequency at the grid center.
    pub fn wavevector(&self, x: usize, z: usize) -> Vec2 {
        let half = self.grid_dim as f32 / 2.0;
        let n = x as f32 - half;
        let m = z as f32 - half;
        Vec2::new(
            std::f32::consts::TAU * n / self.x_length,
            std::f32::consts::TAU * m / self.z_length,
        )
    }

    /// Undisplaced world position of mesh vertex `(x, z)`.
    pub fn origin_position(&self, x: usize, z: usize) -> Vec3 {
        let half = self.grid_dim as f32 / 2.0;
        Vec3::new(
            self.x_length * (x as f32 - half) / self.grid_dim as f32,
            0.0,
            self.z_length * (z as f32 - half) / self.grid_dim as f32,
        )
    }

    /// Map an arbitrary world-space location onto the mesh: nearest vertex
    /// index plus bilinear fractions toward +X and +Z.
    ///
    /// Both negative and overflowing coordinates wrap modulo the simulated
    /// grid, so the result is periodic in the domain length.
    pub fn locate(&self, location: Vec2) -> MeshPosition {
        let half = self.grid_dim as f32 / 2.0;
        let range_x = self.grid_dim as f32;
        let range_z = self.grid_dim as f32;

        let mut xf = location.x / self.x_spacing() + half;
        if xf >= range_x {
            xf -= (xf / range_x).floor() * range_x;
        }
        while xf < 0.0 {
            xf += range_x;
        }

        let mut zf = location.y / self.z_spacing() + half;
        if zf >= range_z {
            zf -= (zf / range_z).floor() * range_z;
        }
        while zf < 0.0 {
            zf += range_z;
        }

        let x_index = (xf as usize).min(self.grid_dim - 1);
        let z_index = (zf as usize).min(self.grid_dim - 1);
        MeshPosition {
            vertex_index: z_index * self.stride() + x_index,
            xt: xf - x_index as f32,
            zt: zf - z_index as f32,
        }
    }
}

/// A query result: vertex index and interpolation fractions in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshPosition {
    pub vertex_index: usize,
    pub xt: f32,
    pub zt: f32,
}

/// One mesh vertex as uploaded to the renderer.
///
/// The fourth components exist only to keep the record at a fixed 32-byte
/// stride for transfer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub normal: [f32; 4],
}

impl Vertex {
    /// Flat-water vertex at the given world position.
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position: [position.x, position.y, position.z, 0.0],
            normal: [0.0, 1.0, 0.0, 0.0],
        }
    }

    pub fn position_vec(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }

    pub fn normal_vec(&self) -> Vec3 {
        Vec3::new(self.normal[0], self.normal[1], self.normal[2])
    }
}

/// Immutable per-cell data computed once at construction: the undisplaced
/// vertex position and the Hermitian seed pair for its wavevector.
#[derive(Debug, Clone, Copy)]
pub struct VertexExtra {
    pub origin: Vec3,
    pub seed: Complex,
    pub seed_conj: Complex,
}

/// Per-instance world offset for tiled rendering.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceOffset {
    pub offset: [f32; 4],
}

/// Two triangles per quad, fixed winding, `u32` indices.
pub fn build_index_buffer(layout: &GridLayout) -> Vec<u32> {
    let stride = layout.stride() as u32;
    let grid = layout.grid_dim as u32;
    let mut indices = Vec::with_capacity(6 * layout.cell_count());
    for z in 0..grid {
        for x in 0..grid {
            let i = z * stride + x;
            indices.extend_from_slice(&[i, i + 1, i + stride]);
            indices.extend_from_slice(&[i + 1, i + stride + 1, i + stride]);
        }
    }
    indices
}

/// World offsets placing `expansion²` copies of the base tile.
pub fn build_instance_offsets(layout: &GridLayout, expansion: u32) -> Vec<InstanceOffset> {
    let count = expansion * expansion;
    let mut offsets = Vec::with_capacity(count as usize);
    for i in 0..count {
        let x = (i % expansion) as f32;
        let z = (i / expansion) as f32;
        offsets.push(InstanceOffset {
            offset: [x * layout.x_length, 0.0, z * layout.z_length, 1.0],
        });
    }
    offsets
}

/// Read-only view of one completed frame, shared between the single-threaded
/// surface and the threading harness's consumer handle.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    layout: GridLayout,
    vertices: &'a [Vertex],
}

impl<'a> FrameView<'a> {
    pub(crate) fn new(layout: GridLayout, vertices: &'a [Vertex]) -> Self {
        debug_assert_eq!(vertices.len(), layout.vertex_count());
        Self { layout, vertices }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn vertices(&self) -> &'a [Vertex] {
        self.vertices
    }

    /// Raw bytes of the vertex array, ready for upload.
    pub fn vertex_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.vertices)
    }

    fn corners(&self, mp: MeshPosition) -> [&Vertex; 4] {
        let stride = self.layout.stride();
        [
            &self.vertices[mp.vertex_index],
            &self.vertices[mp.vertex_index + 1],
            &self.vertices[mp.vertex_index + stride],
            &self.vertices[mp.vertex_index + stride + 1],
        ]
    }

    /// Interpolated surface height at a world location.
    pub fn height_at(&self, location: Vec2) -> f32 {
        let mp = self.layout.locate(location);
        let [a, b, c, d] = self.corners(mp);
        quad_lerp(
            a.position[1],
            b.position[1],
            c.position[1],
            d.position[1],
            mp.xt,
            mp.zt,
        )
    }

    /// Interpolated height and unit normal at a world location.
    pub fn height_normal_at(&self, location: Vec2) -> (f32, Vec3) {
        let mp = self.layout.locate(location);
        let [a, b, c, d] = self.corners(mp);
        let height = quad_lerp(
            a.position[1],
            b.position[1],
            c.position[1],
            d.position[1],
            mp.xt,
            mp.zt,
        );
        let top = a.normal_vec().lerp(b.normal_vec(), mp.xt);
        let bottom = c.normal_vec().lerp(d.normal_vec(), mp.xt);
        let normal = top.lerp(bottom, mp.zt).normalize();
        (height, normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: GridLayout = GridLayout {
        grid_dim: 4,
        x_length: 16.0,
        z_length: 16.0,
    };

    #[test]
    fn test_origin_positions_are_centered() {
        assert_eq!(LAYOUT.origin_position(0, 0), Vec3::new(-8.0, 0.0, -8.0));
        assert_eq!(LAYOUT.origin_position(2, 2), Vec3::ZERO);
        assert_eq!(LAYOUT.origin_position(4, 4), Vec3::new(8.0, 0.0, 8.0));
    }

    #[test]
    fn test_wavevector_center_is_zero_frequency() {
        assert_eq!(LAYOUT.wavevector(2, 2), Vec2::ZERO);
        let k = LAYOUT.wavevector(3, 2);
        assert!((k.x - std::f32::consts::TAU / 16.0).abs() < 1e-6);
        assert_eq!(k.y, 0.0);
    }

    #[test]
    fn test_locate_center() {
        let mp = LAYOUT.locate(Vec2::ZERO);
        assert_eq!(mp.vertex_index, 2 * LAYOUT.stride() + 2);
        assert!(mp.xt.abs() < 1e-6);
        assert!(mp.zt.abs() < 1e-6);
    }

    #[test]
    fn test_locate_wraps_negative_and_overflowing() {
        let base = LAYOUT.locate(Vec2::new(1.0, -3.0));
        let wrapped_pos = LAYOUT.locate(Vec2::new(1.0 + 16.0, -3.0 + 32.0));
        let wrapped_neg = LAYOUT.locate(Vec2::new(1.0 - 16.0, -3.0 - 16.0));
        assert_eq!(base.vertex_index, wrapped_pos.vertex_index);
        assert_eq!(base.vertex_index, wrapped_neg.vertex_index);
        assert!((base.xt - wrapped_pos.xt).abs() < 1e-4);
        assert!((base.zt - wrapped_neg.zt).abs() < 1e-4);
    }

    #[test]
    fn test_index_buffer_winding() {
        let layout = GridLayout {
            grid_dim: 2,
            x_length: 2.0,
            z_length: 2.0,
        };
        let indices = build_index_buffer(&layout);
        assert_eq!(indices.len(), 6 * 4);
        // First quad: stride is 3.
        assert_eq!(&indices[..6], &[0, 1, 3, 1, 4, 3]);
    }

    #[test]
    fn test_instance_offsets_tile_the_domain() {
        let offsets = build_instance_offsets(&LAYOUT, 2);
        assert_eq!(offsets.len(), 4);
        assert_eq!(offsets[0].offset, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(offsets[1].offset, [16.0, 0.0, 0.0, 1.0]);
        assert_eq!(offsets[2].offset, [0.0, 0.0, 16.0, 1.0]);
        assert_eq!(offsets[3].offset, [16.0, 0.0, 16.0, 1.0]);
    }

    #[test]
    fn test_frame_view_bilinear_height() {
        let mut vertices = Vec::with_capacity(LAYOUT.vertex_count());
        for z in 0..LAYOUT.stride() {
            for x in 0..LAYOUT.stride() {
                let mut v = Vertex::at_rest(LAYOUT.origin_position(x, z));
                v.position[1] = (z * LAYOUT.stride() + x) as f32;
                vertices.push(v);
            }
        }
        let view = FrameView::new(LAYOUT, &vertices);
        // Halfway into the cell whose corner is vertex (2, 2) = index 12.
        let spacing = LAYOUT.x_spacing();
        let h = view.height_at(Vec2::new(spacing * 0.5, spacing * 0.5));
        let expected = quad_lerp(12.0, 13.0, 17.0, 18.0, 0.5, 0.5);
        assert!((h - expected).abs() < 1e-5);
    }
}
