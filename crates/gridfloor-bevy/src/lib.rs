//! Gridfloor Bevy Plugin — the procedural ground grid as a Bevy material.
//!
//! Spawn an entity with a [`Grid`] component and `GridPlugin` attaches the
//! plane mesh and [`GridMaterial`], keeps the material in sync with the
//! component, mirrors the camera's distance fog and recomputes the
//! camera-relative uniforms every frame.

pub mod components;
pub mod material;
pub mod systems;

use bevy::asset::embedded_asset;
use bevy::pbr::MaterialPlugin;
use bevy::prelude::*;
use bevy::transform::TransformSystems;

pub use components::{Grid, GridBinding, GridCamera};
pub use material::GridMaterial;

use systems::{
    attach_grid_assets, release_grid_assets, sync_grid_fog, sync_grid_params,
    update_grid_frame_state,
};

/// Full grid integration: shader, material pipeline and sync systems.
pub struct GridPlugin;

impl Plugin for GridPlugin {
    fn build(&self, app: &mut App) {
        embedded_asset!(app, "shaders/grid.wgsl");
        app.add_plugins(MaterialPlugin::<GridMaterial>::default())
            .add_plugins(GridSyncPlugin);
    }
}

/// ECS side of the grid without the render pipeline.
///
/// Added by [`GridPlugin`]. On its own it only needs `Assets<Mesh>` and
/// `Assets<GridMaterial>`, which is what headless tests provide.
pub struct GridSyncPlugin;

impl Plugin for GridSyncPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PostUpdate,
            (
                attach_grid_assets,
                sync_grid_params,
                sync_grid_fog,
                update_grid_frame_state,
            )
                .chain()
                .after(TransformSystems::Propagate),
        )
        .add_observer(release_grid_assets);
    }
}
