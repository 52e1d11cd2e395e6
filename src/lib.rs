//! Swell Surface Core
//!
//! Real-time spectral ocean-surface simulation driving a tileable render mesh.
//!
//! # Features
//!
//! - Phillips-spectrum seeding with a seeded Gaussian source
//! - Quantized deep-water dispersion for exact temporal looping
//! - Five-field inverse-transform synthesis (height, slopes, choppy
//!   displacement) via RustFFT
//! - Seam-stitched `(n+1)²` mesh that tiles without cracks
//! - Optional intensity map for local amplitude attenuation (via `image`)
//! - Double-buffered background simulation thread with rendezvous handoff
//!
//! The crate produces vertex/index/instance buffers and point queries; window
//! management, shading, and GPU upload belong to the consumer.

pub mod runtime;
pub mod spectrum;
pub mod surface;

// Re-export commonly used types
pub use runtime::{SimulationThread, WorkerDisconnected};
pub use spectrum::{Complex, Fft2d, SpectrumParams};
pub use surface::{
    FrameView, GridLayout, IntensityMap, InstanceOffset, MeshPosition, OceanSurface,
    SurfaceConfig, SurfaceError, Vertex, MIN_GRID_SPACING,
};
