//! Gridfloor GPU — standalone wgpu render pipeline for the ground grid.
//!
//! No Bevy dependency. Draws the grid into any color target, optionally with
//! depth, and reads it back for headless snapshots and reference tests.

pub mod camera;
pub mod device;
pub mod error;
pub mod offscreen;
pub mod renderer;

pub use camera::CameraView;
pub use device::create_device_blocking;
pub use error::GpuError;
pub use offscreen::OffscreenTarget;
pub use renderer::GridRenderer;
