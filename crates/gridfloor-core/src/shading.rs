//! CPU reference of the grid shaders. Both `grid.wgsl` files mirror this.
//!
//! # Vertex stage
//! ```text
//!   local = position × infinite_scale
//!   world = world_from_local × local
//!   if follow_camera:
//!       world += cam_proj_position − plane_position
//!       local  = local_from_world × world
//! ```
//!
//! # Fragment stage
//! ```text
//!   g(s, t)  = pattern coverage at spacing s, thickness t   (see line_coverage)
//!   g1, g2   = g(cell_size, cell_thickness), g(section_size, section_thickness)
//!
//!   fade     = fade_attenuation(|cam_proj_position × fade_from − world|)
//!   color    = mix(cell_color, section_color, clamp(section_thickness × g2, 0, 1))
//!   alpha    = (g1 + g2) × fade
//!   alpha    = mix(0.75 × alpha, alpha, g2) × color.a
//!   !(alpha > 0) → discard
//!   out      = fog(color.rgb, alpha)
//! ```

use glam::{Mat4, Vec2, Vec3, Vec3Swizzles};

use crate::color::GridColor;
use crate::uniforms::GridUniforms;

/// Vertex stage output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridVertexOut {
    /// Position the pattern is sampled at.
    pub local_position: Vec3,
    /// Position the fade is measured at.
    pub world_position: Vec3,
}

/// Interpolated fragment inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentInput {
    pub local_position: Vec3,
    pub world_position: Vec3,
    /// Screen-space rate of change of `local_position.xz`, i.e. `fwidth`.
    pub local_fwidth: Vec2,
    /// Depth along the camera's forward axis.
    pub view_depth: f32,
    /// Straight-line distance from the camera.
    pub view_distance: f32,
}

/// Run the vertex stage for one plane vertex.
pub fn transform_vertex(
    uniforms: &GridUniforms,
    world_from_local: Mat4,
    position: Vec3,
) -> GridVertexOut {
    let mut local_position = position * uniforms.infinite_scale;
    let mut world_position = world_from_local.transform_point3(local_position);

    if uniforms.follow_camera() {
        world_position += uniforms.frame().follow_offset();
        local_position = world_from_local.inverse().transform_point3(world_position);
    }

    GridVertexOut {
        local_position,
        world_position,
    }
}

/// Run the fragment stage. `None` means the fragment is discarded.
pub fn shade_fragment(uniforms: &GridUniforms, input: &FragmentInput) -> Option<[f32; 4]> {
    let coord = input.local_position.xz();
    let g1 = line_coverage(
        coord,
        input.local_fwidth,
        uniforms.cell_size,
        uniforms.cell_thickness,
    );
    let g2 = line_coverage(
        coord,
        input.local_fwidth,
        uniforms.section_size,
        uniforms.section_thickness,
    );

    let fade = fade_at(uniforms, input.world_position);

    let weight = (uniforms.section_thickness * g2).clamp(0.0, 1.0);
    let color = GridColor(uniforms.cell_color).mix(&GridColor(uniforms.section_color), weight);

    let base = (g1 + g2) * fade;
    let alpha = (base * (0.75 + 0.25 * g2) * color.alpha()).clamp(0.0, 1.0);
    if !(alpha > 0.0) {
        return None;
    }

    let [r, g, b, _] = color.0;
    Some(
        uniforms
            .fog()
            .apply([r, g, b, alpha], input.view_depth, input.view_distance),
    )
}

/// Coverage of one periodic line pattern, in `[0, 1]`.
///
/// `coord` is the sample position on the plane, `coord_fwidth` its
/// screen-space derivative, so `d` below is the distance to the nearest line
/// in pixels:
///
/// ```text
///   r = coord / size
///   d = min(|fract(r − 0.5) − 0.5| / fwidth(r))
///
///   thickness ≤ 0  →  0
///   thickness ≥ 1  →  1
///   otherwise      →  clamp(1 − d × (1 − thickness) / thickness, 0, 1)
/// ```
///
/// In between, lines are `thickness / (1 − thickness)` pixels wide on each
/// side with a one-pixel anti-aliased edge, independent of distance.
pub fn line_coverage(coord: Vec2, coord_fwidth: Vec2, size: f32, thickness: f32) -> f32 {
    if thickness <= 0.0 {
        return 0.0;
    }
    if thickness >= 1.0 {
        return 1.0;
    }

    let r = coord / size;
    let r_fwidth = coord_fwidth / size.abs();
    let dist = (fract_gl(r - 0.5) - 0.5).abs() / r_fwidth;
    // f32::min drops a NaN operand (0/0 on a line with zero derivative).
    let d = dist.x.min(dist.y);

    // max/min rather than clamp so NaN collapses to 0.
    (1.0 - d * (1.0 - thickness) / thickness).max(0.0).min(1.0)
}

/// Radial fade, `1` at the fade origin and `0` at `fade_distance` and beyond.
///
/// ```text
///   ratio = distance / fade_distance
///   ratio ≥ 1 (or NaN)  →  0
///   otherwise           →  clamp((1 − ratio)^strength, 0, 1)
/// ```
pub fn fade_attenuation(distance: f32, fade_distance: f32, strength: f32) -> f32 {
    let ratio = distance / fade_distance;
    if !(ratio < 1.0) {
        return 0.0;
    }
    (1.0 - ratio).powf(strength).clamp(0.0, 1.0)
}

/// Fade origin: the camera projection scaled by `fade_from`.
pub fn fade_origin(uniforms: &GridUniforms) -> Vec3 {
    uniforms.frame().cam_proj_position * uniforms.fade_from
}

/// Fade attenuation at a world position for the current frame.
pub fn fade_at(uniforms: &GridUniforms, world_position: Vec3) -> f32 {
    let distance = fade_origin(uniforms).distance(world_position);
    fade_attenuation(distance, uniforms.fade_distance, uniforms.fade_strength)
}

/// GLSL/WGSL `fract`: `x − floor(x)`, always in `[0, 1)`.
fn fract_gl(v: Vec2) -> Vec2 {
    v - v.floor()
}
