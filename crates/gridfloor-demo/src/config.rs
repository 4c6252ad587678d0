//! Application configuration for the demo.

use std::path::PathBuf;

use bevy::prelude::*;
use gridfloor_core::{GridColor, GridParams};

/// Default window / snapshot width.
const DEFAULT_WIDTH: u32 = 1280;
/// Default window / snapshot height.
const DEFAULT_HEIGHT: u32 = 720;

/// Runtime configuration for the gridfloor demo.
#[derive(Resource, Clone, Debug)]
pub struct AppConfig {
    /// Window or snapshot width in pixels.
    pub width: u32,
    /// Window or snapshot height in pixels.
    pub height: u32,
    /// JSON grid config (`GRIDFLOOR_CONFIG`).
    pub grid_config: Option<PathBuf>,
    /// Render one frame headlessly to this PNG instead of opening a window
    /// (`GRIDFLOOR_SNAPSHOT`).
    pub snapshot: Option<PathBuf>,
    /// Linear fog and background color.
    pub fog_color: GridColor,
    pub fog_start: f32,
    pub fog_end: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: env_u32("GRIDFLOOR_WIDTH").unwrap_or(DEFAULT_WIDTH),
            height: env_u32("GRIDFLOOR_HEIGHT").unwrap_or(DEFAULT_HEIGHT),
            grid_config: std::env::var_os("GRIDFLOOR_CONFIG").map(PathBuf::from),
            snapshot: std::env::var_os("GRIDFLOOR_SNAPSHOT").map(PathBuf::from),
            fog_color: GridColor::linear(0.02, 0.022, 0.028, 1.0),
            fog_start: 20.0,
            fog_end: 60.0,
        }
    }
}

impl AppConfig {
    /// Grid parameters from `grid_config`, or the demo defaults.
    ///
    /// A config that fails to load is logged and replaced by the defaults.
    pub fn load_grid(&self) -> GridParams {
        let Some(path) = &self.grid_config else {
            return demo_grid();
        };
        match GridParams::from_json_file(path) {
            Ok(params) => {
                tracing::info!("grid config loaded from {}", path.display());
                params
            }
            Err(e) => {
                tracing::warn!("failed to load grid config {}: {e}", path.display());
                demo_grid()
            }
        }
    }
}

/// Infinite, camera-following grid with one section every five cells.
pub fn demo_grid() -> GridParams {
    GridParams {
        args: [10.0, 10.0],
        cell_size: 1.0,
        cell_thickness: 0.5,
        cell_color: GridColor::linear(0.3, 0.3, 0.32, 1.0),
        section_size: 5.0,
        section_thickness: 0.75,
        follow_camera: true,
        infinite_grid: true,
        fade_distance: 50.0,
        fade_strength: 1.0,
        ..GridParams::default()
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&v| v > 0)
}
