//! Spatial-domain side of the simulation: mesh layout, the double-buffered
//! surface itself, and the optional intensity map.

pub mod intensity;
pub mod mesh;
pub mod simulation;

pub use intensity::IntensityMap;
pub use mesh::{
    build_index_buffer, build_instance_offsets, FrameView, GridLayout, InstanceOffset,
    MeshPosition, Vertex, VertexExtra,
};
pub use simulation::{OceanSurface, SurfaceConfig, MIN_GRID_SPACING};

use thiserror::Error;

/// Configuration errors raised synchronously at construction. Both are fatal
/// to the construction attempt; there is no partial or retry path.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("grid dimension must be a power of two, got {0}")]
    InvalidGridDimension(usize),

    #[error("vertex spacing {spacing} m is below the {minimum} m minimum; use a shorter grid or a longer domain")]
    ExcessiveGridSpacing { spacing: f32, minimum: f32 },
}
