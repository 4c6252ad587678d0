//! Per-frame camera state derived for the grid.
//!
//! Two values cannot come from static parameters and are recomputed every
//! frame, after transforms settle and before the material is drawn:
//!
//! ```text
//!   plane_position    = world_from_local × (0, 0, 0)
//!   n                 = normalize(normal_matrix × (0, 1, 0))
//!   cam_proj_position = camera − n × dot(n, camera − plane_position)
//! ```
//!
//! `normal_matrix` is the inverse-transpose of the upper 3×3, so non-uniform
//! scale still yields the true plane normal.

use glam::{Mat3, Mat4, Vec3};

/// Camera-relative uniforms for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameState {
    /// Camera position projected orthogonally onto the grid plane.
    pub cam_proj_position: Vec3,
    /// World-space position of the plane's local origin.
    pub plane_position: Vec3,
}

impl FrameState {
    /// Derive the frame state from the camera position and the mesh's
    /// world transform.
    ///
    /// A degenerate transform (zero scale on an axis) has no usable normal;
    /// the camera position is then used unprojected.
    pub fn compute(camera_position: Vec3, world_from_local: Mat4) -> Self {
        let plane_position = world_from_local.transform_point3(Vec3::ZERO);
        let normal = plane_normal(world_from_local);
        let cam_proj_position =
            camera_position - normal * normal.dot(camera_position - plane_position);
        Self {
            cam_proj_position,
            plane_position,
        }
    }

    /// World-space shift applied to the grid when following the camera.
    pub fn follow_offset(&self) -> Vec3 {
        self.cam_proj_position - self.plane_position
    }
}

/// World-space unit normal of the local XZ plane, or zero if degenerate.
pub fn plane_normal(world_from_local: Mat4) -> Vec3 {
    let linear = Mat3::from_mat4(world_from_local);
    if linear.determinant().abs() <= f32::EPSILON {
        return Vec3::ZERO;
    }
    (linear.inverse().transpose() * Vec3::Y).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    const EPSILON: f32 = 1e-5;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, EPSILON), "{a} vs {b}");
    }

    #[test]
    fn test_identity_projects_onto_ground() {
        let state = FrameState::compute(Vec3::new(3.0, 7.0, -2.0), Mat4::IDENTITY);
        assert_vec_eq(state.cam_proj_position, Vec3::new(3.0, 0.0, -2.0));
        assert_vec_eq(state.plane_position, Vec3::ZERO);
    }

    #[test]
    fn test_translated_plane() {
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let state = FrameState::compute(Vec3::new(-4.0, 10.0, 8.0), model);
        assert_vec_eq(state.plane_position, Vec3::new(1.0, 2.0, 3.0));
        assert_vec_eq(state.cam_proj_position, Vec3::new(-4.0, 2.0, 8.0));
    }

    #[test]
    fn test_rotated_plane_uses_local_up() {
        // Rotate the ground into the XY plane: local +Y becomes world +Z.
        let model = Mat4::from_quat(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2));
        let state = FrameState::compute(Vec3::new(2.0, 5.0, 9.0), model);
        assert_vec_eq(state.cam_proj_position, Vec3::new(2.0, 5.0, 0.0));
    }

    #[test]
    fn test_non_uniform_scale_keeps_plane_normal() {
        let model = Mat4::from_scale(Vec3::new(10.0, 0.5, 3.0));
        let state = FrameState::compute(Vec3::new(1.0, 4.0, 1.0), model);
        assert_vec_eq(state.cam_proj_position, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_camera_over_origin_has_zero_follow_offset() {
        let state = FrameState::compute(Vec3::new(0.0, 12.0, 0.0), Mat4::IDENTITY);
        assert_vec_eq(state.follow_offset(), Vec3::ZERO);
    }

    #[test]
    fn test_degenerate_transform_does_not_panic() {
        let model = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        let camera = Vec3::new(1.0, 2.0, 3.0);
        let state = FrameState::compute(camera, model);
        assert_vec_eq(state.cam_proj_position, camera);
    }
}
