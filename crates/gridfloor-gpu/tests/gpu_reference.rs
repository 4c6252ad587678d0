//! GPU integration tests. Require a real wgpu adapter and skip without one.
//!
//! Run with: `cargo test -p gridfloor-gpu`

use std::sync::{Mutex, OnceLock};

use glam::Vec3;
use gridfloor_core::{GridParam, GridParams, GridSide};
use gridfloor_gpu::{CameraView, GridRenderer, OffscreenTarget};

const SIZE: u32 = 64;
const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};
const CLEAR_RGBA8: [u8; 4] = [0, 0, 0, 255];

fn create_test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    match gridfloor_gpu::create_device_blocking() {
        Ok(pair) => Some(pair),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

fn gpu_test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Camera 10 units above the origin looking straight down, seeing ±10 units.
fn top_down_camera() -> CameraView {
    CameraView::look_at(
        Vec3::new(0.0, 10.0, 0.0),
        Vec3::ZERO,
        Vec3::NEG_Z,
        std::f32::consts::FRAC_PI_2,
        1.0,
        0.1,
        100.0,
    )
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * SIZE + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

fn assert_rgba_near(actual: [u8; 4], expected: [u8; 4], tolerance: u8) {
    for c in 0..4 {
        assert!(
            actual[c].abs_diff(expected[c]) <= tolerance,
            "got {actual:?}, expected {expected:?}"
        );
    }
}

fn render(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    renderer: &mut GridRenderer,
    camera: &CameraView,
) -> Vec<u8> {
    let target = OffscreenTarget::new(device, SIZE, SIZE).expect("target");
    renderer
        .render_offscreen(device, queue, &target, camera, CLEAR)
        .expect("render")
}

#[test]
fn test_gpu_saturated_section_fills_with_section_color() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some((device, queue)) = create_test_device() else {
        return;
    };

    let params = GridParams {
        args: [40.0, 40.0],
        section_thickness: 1.0,
        ..GridParams::default()
    };
    let mut renderer = GridRenderer::new_offscreen(&device, params);
    let pixels = render(&device, &queue, &mut renderer, &top_down_camera());

    // #2080ff round-trips through the sRGB target.
    assert_rgba_near(pixel(&pixels, SIZE / 2, SIZE / 2), [0x20, 0x80, 0xff, 255], 2);
}

#[test]
fn test_gpu_zero_thickness_draws_nothing() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some((device, queue)) = create_test_device() else {
        return;
    };

    let params = GridParams {
        args: [40.0, 40.0],
        cell_thickness: 0.0,
        section_thickness: 0.0,
        ..GridParams::default()
    };
    let mut renderer = GridRenderer::new_offscreen(&device, params);
    let pixels = render(&device, &queue, &mut renderer, &top_down_camera());

    for chunk in pixels.chunks(4) {
        assert_eq!(chunk, CLEAR_RGBA8);
    }
}

#[test]
fn test_gpu_fade_clears_far_region() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some((device, queue)) = create_test_device() else {
        return;
    };

    let params = GridParams {
        args: [40.0, 40.0],
        section_thickness: 1.0,
        fade_distance: 3.0,
        ..GridParams::default()
    };
    let mut renderer = GridRenderer::new_offscreen(&device, params);
    let pixels = render(&device, &queue, &mut renderer, &top_down_camera());

    assert_ne!(pixel(&pixels, SIZE / 2, SIZE / 2), CLEAR_RGBA8);
    // Corners sit about 14 units from the camera's ground projection.
    for (x, y) in [(0, 0), (SIZE - 1, 0), (0, SIZE - 1), (SIZE - 1, SIZE - 1)] {
        assert_eq!(pixel(&pixels, x, y), CLEAR_RGBA8, "corner ({x}, {y})");
    }
}

#[test]
fn test_gpu_back_side_is_culled_from_above() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some((device, queue)) = create_test_device() else {
        return;
    };

    let params = GridParams {
        args: [40.0, 40.0],
        section_thickness: 1.0,
        ..GridParams::default()
    };
    let mut renderer = GridRenderer::new_offscreen(&device, params);
    let camera = top_down_camera();

    renderer.set_param(GridParam::Side(GridSide::Back));
    let hidden = render(&device, &queue, &mut renderer, &camera);
    assert_eq!(pixel(&hidden, SIZE / 2, SIZE / 2), CLEAR_RGBA8);

    renderer.set_param(GridParam::Side(GridSide::Double));
    let shown = render(&device, &queue, &mut renderer, &camera);
    assert_ne!(pixel(&shown, SIZE / 2, SIZE / 2), CLEAR_RGBA8);
}

#[test]
fn test_gpu_param_update_is_uploaded_in_place() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some((device, queue)) = create_test_device() else {
        return;
    };

    let params = GridParams {
        args: [40.0, 40.0],
        section_thickness: 1.0,
        ..GridParams::default()
    };
    let mut renderer = GridRenderer::new_offscreen(&device, params);
    let camera = top_down_camera();
    let before = render(&device, &queue, &mut renderer, &camera);
    assert_ne!(pixel(&before, SIZE / 2, SIZE / 2), CLEAR_RGBA8);

    renderer.set_params(&GridParams {
        cell_thickness: 0.0,
        section_thickness: 0.0,
        ..params
    });
    assert!(renderer.is_dirty());

    let after = render(&device, &queue, &mut renderer, &camera);
    assert!(!renderer.is_dirty());
    assert_eq!(pixel(&after, SIZE / 2, SIZE / 2), CLEAR_RGBA8);
}
