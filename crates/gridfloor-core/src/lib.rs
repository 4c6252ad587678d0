//! Gridfloor Core — domain layer for the procedural ground grid.
//!
//! Holds the grid parameter set, the GPU uniform layout, the per-frame
//! camera projection math, and a CPU mirror of the per-pixel shading.
//! No GPU or framework dependencies.

pub mod color;
pub mod error;
pub mod fog;
pub mod frame;
pub mod geometry;
pub mod params;
pub mod shading;
pub mod uniforms;

// Re-exports for convenience.
pub use color::GridColor;
pub use error::GridError;
pub use fog::{FogConvention, FogMode, FogSettings};
pub use frame::FrameState;
pub use geometry::PlaneGeometry;
pub use params::{GridParam, GridParams, GridSide};
pub use uniforms::GridUniforms;
