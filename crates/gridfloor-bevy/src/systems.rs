//! Bevy systems that keep grid materials in sync with the ECS.
//!
//! All run in `PostUpdate` after transform propagation, in order:
//! attach assets → apply parameter changes → mirror fog → per-frame update.

use bevy::camera::visibility::NoFrustumCulling;
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

use gridfloor_core::{FogConvention, FogSettings, FrameState, GridColor};

use crate::components::{Grid, GridBinding, GridCamera};
use crate::material::GridMaterial;

/// Build the plane mesh and material for newly spawned grids.
pub fn attach_grid_assets(
    mut commands: Commands,
    grids: Query<(Entity, &Grid), Without<GridBinding>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<GridMaterial>>,
) {
    for (entity, grid) in &grids {
        let [width, depth] = grid.params.args;
        let mesh = meshes.add(Plane3d::default().mesh().size(width, depth));
        let material = materials.add(GridMaterial::from_params(&grid.params));

        // The vertex shader moves the plane outside its mesh bounds.
        commands.entity(entity).insert((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            NoFrustumCulling,
            GridBinding {
                applied: grid.params,
                mesh,
                material,
            },
        ));
        tracing::info!("grid attached to {entity} ({width}x{depth})");
    }
}

/// Write changed `Grid` parameters into the existing material.
pub fn sync_grid_params(
    mut grids: Query<(Entity, &Grid, &mut GridBinding), Changed<Grid>>,
    mut materials: ResMut<Assets<GridMaterial>>,
) {
    for (entity, grid, mut binding) in &mut grids {
        if binding.applied.extent_changed(&grid.params) {
            tracing::warn!(
                "grid {entity}: plane size is fixed at creation, ignoring {:?}",
                grid.params.args
            );
            binding.applied.args = grid.params.args;
        }

        let changes = binding.applied.diff(&grid.params);
        if changes.is_empty() {
            continue;
        }
        let Some(material) = materials.get_mut(binding.material.id()) else {
            tracing::warn!("grid {entity}: material asset missing");
            continue;
        };
        for change in changes {
            tracing::debug!("grid {entity}: {change:?}");
            material.apply(change);
            binding.applied.apply(change);
        }
    }
}

/// Mirror the tracked camera's `DistanceFog` into every grid material.
pub fn sync_grid_fog(
    cameras: Query<(&Camera, Has<GridCamera>, Option<&DistanceFog>), With<Camera3d>>,
    grids: Query<&GridBinding>,
    mut materials: ResMut<Assets<GridMaterial>>,
    mut reported_light_scattering: Local<bool>,
) {
    let Some(fog) = pick_camera(
        cameras
            .iter()
            .map(|(camera, tagged, fog)| (camera.is_active, tagged, fog)),
    ) else {
        return;
    };

    let settings = match fog {
        Some(fog) => {
            if fog.directional_light_color.to_linear().alpha > 0.0 && !*reported_light_scattering {
                tracing::debug!("grid fog: directional light scattering is not mirrored");
                *reported_light_scattering = true;
            }
            fog_settings(fog)
        }
        None => FogSettings::default(),
    };

    for binding in &grids {
        let unchanged = materials
            .get(binding.material.id())
            .is_some_and(|material| material.uniforms.fog() == settings);
        if unchanged {
            continue;
        }
        if let Some(material) = materials.get_mut(binding.material.id()) {
            material.set_fog(&settings);
            tracing::debug!("grid fog updated: {:?}", settings.mode);
        }
    }
}

/// Per-frame updater: project the tracked camera onto each grid plane.
pub fn update_grid_frame_state(
    cameras: Query<(&Camera, Has<GridCamera>, &GlobalTransform), With<Camera3d>>,
    grids: Query<(Entity, &GlobalTransform, &GridBinding)>,
    mut materials: ResMut<Assets<GridMaterial>>,
    mut reported_missing: Local<bool>,
) {
    if grids.is_empty() {
        return;
    }
    let Some(camera_transform) = pick_camera(
        cameras
            .iter()
            .map(|(camera, tagged, transform)| (camera.is_active, tagged, transform)),
    ) else {
        if !*reported_missing {
            tracing::warn!("grid: no active 3D camera, frame state not updated");
            *reported_missing = true;
        }
        return;
    };
    *reported_missing = false;
    let camera_position = camera_transform.translation();

    for (entity, transform, binding) in &grids {
        let frame = FrameState::compute(camera_position, Mat4::from(transform.affine()));
        let Some(current) = materials.get(binding.material.id()) else {
            tracing::warn!("grid {entity}: material asset missing");
            continue;
        };
        if current.uniforms.frame() == frame {
            continue;
        }
        if let Some(material) = materials.get_mut(binding.material.id()) {
            material.set_frame(&frame);
        }
    }
}

/// Drop the mesh and material when `Grid` is removed or the entity despawns.
pub fn release_grid_assets(
    remove: On<Remove, Grid>,
    mut commands: Commands,
    bindings: Query<&GridBinding>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<GridMaterial>>,
) {
    let entity = remove.entity;
    let Ok(binding) = bindings.get(entity) else {
        return;
    };
    meshes.remove(binding.mesh.id());
    materials.remove(binding.material.id());
    commands.entity(entity).try_remove::<(
        Mesh3d,
        MeshMaterial3d<GridMaterial>,
        NoFrustumCulling,
        GridBinding,
    )>();
    tracing::info!("grid released from {entity}");
}

/// Convert Bevy fog to grid fog, measured and blended the way `DistanceFog`
/// does it for the rest of the scene.
pub fn fog_settings(fog: &DistanceFog) -> FogSettings {
    let c = fog.color.to_linear();
    let color = GridColor::linear(c.red, c.green, c.blue, c.alpha);
    let settings = match fog.falloff {
        FogFalloff::Linear { start, end } => FogSettings::linear(color, start, end),
        FogFalloff::Exponential { density } => FogSettings::exponential(color, density),
        FogFalloff::ExponentialSquared { density } => {
            FogSettings::exponential_squared(color, density)
        }
        FogFalloff::Atmospheric {
            extinction,
            inscattering,
        } => FogSettings::atmospheric(color, extinction.to_array(), inscattering.to_array()),
    };
    settings.with_convention(FogConvention::CameraDistance)
}

/// The camera tagged `GridCamera`, else the first active one.
fn pick_camera<T>(candidates: impl IntoIterator<Item = (bool, bool, T)>) -> Option<T> {
    let mut fallback = None;
    for (is_active, tagged, item) in candidates {
        if tagged {
            return Some(item);
        }
        if is_active && fallback.is_none() {
            fallback = Some(item);
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_camera_prefers_tag() {
        let picked = pick_camera([(true, false, 1), (false, true, 2), (true, false, 3)]);
        assert_eq!(picked, Some(2));
    }

    #[test]
    fn test_pick_camera_skips_inactive() {
        let picked = pick_camera([(false, false, 1), (true, false, 2)]);
        assert_eq!(picked, Some(2));
        assert_eq!(pick_camera::<i32>([(false, false, 1)]), None);
    }

    #[test]
    fn test_fog_settings_from_linear() {
        let fog = DistanceFog {
            color: Color::linear_rgba(0.1, 0.2, 0.3, 1.0),
            falloff: FogFalloff::Linear {
                start: 5.0,
                end: 50.0,
            },
            ..default()
        };
        assert_eq!(
            fog_settings(&fog),
            FogSettings::linear(GridColor::linear(0.1, 0.2, 0.3, 1.0), 5.0, 50.0)
                .with_convention(FogConvention::CameraDistance)
        );
    }

    #[test]
    fn test_fog_settings_from_exponential() {
        let fog = DistanceFog {
            color: Color::WHITE,
            falloff: FogFalloff::Exponential { density: 0.1 },
            ..default()
        };
        assert_eq!(
            fog_settings(&fog),
            FogSettings::exponential(GridColor::WHITE, 0.1)
                .with_convention(FogConvention::CameraDistance)
        );
    }

    #[test]
    fn test_fog_settings_from_atmospheric() {
        let fog = DistanceFog {
            color: Color::WHITE,
            falloff: FogFalloff::Atmospheric {
                extinction: Vec3::new(0.1, 0.2, 0.3),
                inscattering: Vec3::new(0.01, 0.02, 0.03),
            },
            ..default()
        };
        assert_eq!(
            fog_settings(&fog),
            FogSettings::atmospheric(GridColor::WHITE, [0.1, 0.2, 0.3], [0.01, 0.02, 0.03])
                .with_convention(FogConvention::CameraDistance)
        );
    }

    #[test]
    fn test_fog_settings_match_distance_fog_off_axis() {
        // Camera at (0, 5, 0) looking down −Z, fragment at (30, 0, −30):
        // 30 units deep but ~42.7 units away.
        let camera = Vec3::new(0.0, 5.0, 0.0);
        let fragment = Vec3::new(30.0, 0.0, -30.0);
        let fog = DistanceFog {
            color: Color::WHITE,
            falloff: FogFalloff::Linear {
                start: 20.0,
                end: 60.0,
            },
            ..default()
        };
        let settings = fog_settings(&fog);
        let distance = camera.distance(fragment);
        let d = settings.distance(camera.z - fragment.z, distance);
        // DistanceFog: 1 − clamp((end − d) / (end − start)).
        let expected = 1.0 - ((60.0 - distance) / 40.0).clamp(0.0, 1.0);
        assert!((settings.factor(d) - expected).abs() < 1e-5);
        assert!((settings.factor(d) - 0.568).abs() < 1e-3);
    }
}
