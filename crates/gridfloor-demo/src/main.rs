//! Gridfloor Demo — fogged ground grid under a moving camera.
//!
//! Opens a Bevy window by default. With `GRIDFLOOR_SNAPSHOT=<path.png>` it
//! renders one frame headlessly through `gridfloor-gpu` instead.

mod config;
mod scene;
mod snapshot;

use bevy::prelude::*;
use gridfloor_bevy::GridPlugin;
use tracing_subscriber::{EnvFilter, fmt};

use config::AppConfig;

fn main() {
    let config = AppConfig::default();

    if let Some(path) = config.snapshot.clone() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,wgpu_core=warn,wgpu_hal=warn"));
        fmt().with_env_filter(filter).with_target(true).init();

        let grid = config.load_grid();
        if let Err(e) = snapshot::render_snapshot(&config, grid, &path) {
            tracing::error!("snapshot failed: {e}");
            std::process::exit(1);
        }
        return;
    }

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "gridfloor".into(),
                resolution: (config.width, config.height).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(GridPlugin)
        .insert_resource(config)
        .add_systems(Startup, scene::setup_scene)
        .add_systems(Update, scene::move_camera)
        .run();
}
