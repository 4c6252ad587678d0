//! Windowed demo scene: fogged ground grid, reference cubes, moving camera.

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

use gridfloor_bevy::{Grid, GridCamera};

use crate::config::AppConfig;

/// Camera path: circles `center` while `center` drifts along +X, so the
/// follow-camera grid has something to follow.
#[derive(Component, Debug, Clone, Copy)]
pub struct DemoCamera {
    pub radius: f32,
    pub height: f32,
    /// Radians per second around the center.
    pub orbit_speed: f32,
    /// Units per second the center drifts.
    pub drift_speed: f32,
}

impl Default for DemoCamera {
    fn default() -> Self {
        Self {
            radius: 14.0,
            height: 5.0,
            orbit_speed: 0.15,
            drift_speed: 2.0,
        }
    }
}

pub fn setup_scene(
    mut commands: Commands,
    config: Res<AppConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let [r, g, b, a] = config.fog_color.0;
    let fog_color = Color::linear_rgba(r, g, b, a);
    commands.insert_resource(ClearColor(fog_color));

    commands.spawn((
        Camera3d::default(),
        GridCamera,
        DemoCamera::default(),
        Tonemapping::None,
        Transform::from_xyz(14.0, 5.0, 0.0).looking_at(Vec3::ZERO, Vec3::Y),
        DistanceFog {
            color: fog_color,
            falloff: FogFalloff::Linear {
                start: config.fog_start,
                end: config.fog_end,
            },
            ..default()
        },
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let cube = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    let cube_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.8, 0.45, 0.2),
        ..default()
    });
    for i in 0..12 {
        let x = i as f32 * 8.0 - 16.0;
        let z = if i % 2 == 0 { 4.0 } else { -4.0 };
        commands.spawn((
            Mesh3d(cube.clone()),
            MeshMaterial3d(cube_material.clone()),
            Transform::from_xyz(x, 0.5, z),
        ));
    }

    commands.spawn(Grid::new(config.load_grid()));
}

pub fn move_camera(time: Res<Time>, mut cameras: Query<(&DemoCamera, &mut Transform)>) {
    let t = time.elapsed_secs();
    for (path, mut transform) in &mut cameras {
        let center = Vec3::new(t * path.drift_speed, 0.0, 0.0);
        let angle = t * path.orbit_speed;
        let eye = center
            + Vec3::new(
                angle.cos() * path.radius,
                path.height,
                angle.sin() * path.radius,
            );
        *transform = Transform::from_translation(eye).looking_at(center, Vec3::Y);
    }
}
