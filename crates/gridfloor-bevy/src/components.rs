//! Components placed on grid and camera entities.

use bevy::prelude::*;
use gridfloor_core::GridParams;

use crate::material::GridMaterial;

/// A procedural ground grid. Mesh and material are attached automatically.
///
/// Mutating `params` updates the existing material in place. `params.args`
/// is read once, when the plane mesh is built.
#[derive(Component, Debug, Clone, Default)]
#[require(Transform, Visibility)]
pub struct Grid {
    pub params: GridParams,
}

impl Grid {
    pub fn new(params: GridParams) -> Self {
        Self { params }
    }
}

/// Marks the camera the grid follows and fades around. Without one, the
/// first active `Camera3d` is used.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct GridCamera;

/// Assets owned by a grid entity and the parameters last written to them.
#[derive(Component, Debug)]
pub struct GridBinding {
    pub(crate) applied: GridParams,
    pub(crate) mesh: Handle<Mesh>,
    pub(crate) material: Handle<GridMaterial>,
}

impl GridBinding {
    pub fn applied(&self) -> &GridParams {
        &self.applied
    }

    pub fn mesh(&self) -> &Handle<Mesh> {
        &self.mesh
    }

    pub fn material(&self) -> &Handle<GridMaterial> {
        &self.material
    }
}
