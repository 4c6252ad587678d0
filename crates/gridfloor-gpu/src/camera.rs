//! Camera description consumed by [`GridRenderer`](crate::GridRenderer).

use glam::{Mat4, Vec3};

/// World-space camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub view: Mat4,
    /// Right-handed projection with wgpu's `[0, 1]` depth range.
    pub projection: Mat4,
}

impl CameraView {
    /// Perspective camera at `eye` looking at `target`.
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position: eye,
            view: Mat4::look_at_rh(eye, target, up),
            projection: Mat4::perspective_rh(fov_y_radians, aspect, near, far),
        }
    }

    pub fn clip_from_world(&self) -> Mat4 {
        self.projection * self.view
    }
}
