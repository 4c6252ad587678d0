//! Headless snapshot: render one grid frame with `gridfloor-gpu` and save a
//! PNG.

use std::path::Path;

use glam::Vec3;
use gridfloor_core::{FogSettings, GridParams};
use gridfloor_gpu::{CameraView, GpuError, GridRenderer, OffscreenTarget};

use crate::config::AppConfig;

/// Errors that can occur while producing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("failed to write snapshot: {0}")]
    Encode(#[from] image::ImageError),
    #[error("readback returned {actual} bytes for a {width}x{height} image")]
    Size {
        width: u32,
        height: u32,
        actual: usize,
    },
}

/// Render `grid` from a fixed elevated camera into `path`.
pub fn render_snapshot(
    config: &AppConfig,
    grid: GridParams,
    path: &Path,
) -> Result<(), SnapshotError> {
    let (device, queue) = gridfloor_gpu::create_device_blocking()?;
    let target = OffscreenTarget::new(&device, config.width, config.height)?;

    let mut renderer = GridRenderer::new_offscreen(&device, grid);
    renderer.set_fog(&FogSettings::linear(
        config.fog_color,
        config.fog_start,
        config.fog_end,
    ));

    let camera = CameraView::look_at(
        Vec3::new(8.0, 5.0, 12.0),
        Vec3::ZERO,
        Vec3::Y,
        45.0_f32.to_radians(),
        target.aspect(),
        0.1,
        500.0,
    );

    let [r, g, b, a] = config.fog_color.0;
    let clear = wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    };
    let pixels = renderer.render_offscreen(&device, &queue, &target, &camera, clear)?;

    let actual = pixels.len();
    let image = image::RgbaImage::from_raw(target.width, target.height, pixels).ok_or(
        SnapshotError::Size {
            width: target.width,
            height: target.height,
            actual,
        },
    )?;
    image.save(path)?;

    tracing::info!(
        "snapshot written to {} ({}x{})",
        path.display(),
        target.width,
        target.height
    );
    Ok(())
}
