//! Plane geometry backing the grid.
//!
//! A single quad in the local XZ plane, centered on the origin, facing +Y.
//! Its size is fixed when the grid is created; fade and infinite-grid
//! settings only stretch it in the vertex shader.

use bytemuck::{Pod, Zeroable};

/// Vertex layout consumed by the grid shaders (`@location(0) position`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PlaneVertex {
    pub position: [f32; 3],
}

/// Counter-clockwise when seen from +Y.
pub const PLANE_INDICES: [u16; 6] = [0, 2, 1, 0, 3, 2];

/// A `width × depth` quad.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneGeometry {
    pub width: f32,
    pub depth: f32,
    vertices: [PlaneVertex; 4],
}

impl PlaneGeometry {
    pub fn new(width: f32, depth: f32) -> Self {
        let hw = width * 0.5;
        let hd = depth * 0.5;
        let vertices = [
            PlaneVertex {
                position: [-hw, 0.0, -hd],
            },
            PlaneVertex {
                position: [hw, 0.0, -hd],
            },
            PlaneVertex {
                position: [hw, 0.0, hd],
            },
            PlaneVertex {
                position: [-hw, 0.0, hd],
            },
        ];
        Self {
            width,
            depth,
            vertices,
        }
    }

    /// Build from the `args` of a [`GridParams`](crate::params::GridParams).
    pub fn from_args(args: [f32; 2]) -> Self {
        Self::new(args[0], args[1])
    }

    pub fn vertices(&self) -> &[PlaneVertex; 4] {
        &self.vertices
    }

    pub fn indices(&self) -> &'static [u16; 6] {
        &PLANE_INDICES
    }

    /// Measured `[x extent, z extent]` of the vertex positions.
    pub fn footprint(&self) -> [f32; 2] {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for v in &self.vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(v.position[axis]);
                max[axis] = max[axis].max(v.position[axis]);
            }
        }
        [max[0] - min[0], max[2] - min[2]]
    }

    /// Half of the smaller dimension.
    pub fn min_half_extent(&self) -> f32 {
        let [w, d] = self.footprint();
        w.min(d) * 0.5
    }
}
