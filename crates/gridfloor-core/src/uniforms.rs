//! GPU uniform block for the grid shaders.
//!
//! `GridUniforms` is the contract between the parameter set and both
//! `grid.wgsl` shaders. Its layout matches the WGSL `GridUniforms` struct
//! byte for byte (all `vec4` members first, then scalars, 16-byte aligned).
//! `min_half_extent` travels in a padding slot and no shader reads it.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::fog::{FogConvention, FogMode, FogSettings};
use crate::frame::FrameState;
use crate::params::{GridParam, GridParams};

/// `flags` bit: stretch the plane beyond the fade boundary.
pub const FLAG_INFINITE_GRID: u32 = 1 << 0;
/// `flags` bit: shift the pattern under the camera.
pub const FLAG_FOLLOW_CAMERA: u32 = 1 << 1;

/// Uniform block shared by every grid shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GridUniforms {
    pub cell_color: [f32; 4],
    pub section_color: [f32; 4],
    pub fog_color: [f32; 4],
    /// `xyz` = per-channel extinction density, atmospheric fog only.
    pub fog_extinction: [f32; 4],
    /// `xyz` = per-channel inscattering density, atmospheric fog only.
    pub fog_inscattering: [f32; 4],
    /// `xyz` = camera projected onto the plane, `w` unused.
    pub cam_proj_position: [f32; 4],
    /// `xyz` = plane origin in world space, `w` unused.
    pub plane_position: [f32; 4],

    pub cell_size: f32,
    pub section_size: f32,
    pub cell_thickness: f32,
    pub section_thickness: f32,

    pub fade_distance: f32,
    pub fade_strength: f32,
    pub fade_from: f32,
    /// Local-coordinate multiplier, `1.0` unless the infinite grid is on.
    pub infinite_scale: f32,

    pub fog_near: f32,
    pub fog_far: f32,
    pub fog_density: f32,
    pub fog_mode: u32,

    /// [`FogConvention`] as an integer.
    pub fog_convention: u32,
    pub flags: u32,
    /// Half of the plane's smaller dimension. Read on the CPU only, to refresh
    /// `infinite_scale` in place; on the GPU it fills a padding slot.
    pub min_half_extent: f32,
    pub _pad: f32,
}

impl GridUniforms {
    /// Build the uniform block for a freshly created grid. Frame state starts
    /// at the origin and fog starts off until the host mirrors its own.
    pub fn new(params: &GridParams) -> Self {
        let mut uniforms = Self {
            cell_color: params.cell_color.0,
            section_color: params.section_color.0,
            fog_color: [1.0, 1.0, 1.0, 1.0],
            fog_extinction: [0.0; 4],
            fog_inscattering: [0.0; 4],
            cam_proj_position: [0.0, 0.0, 0.0, 1.0],
            plane_position: [0.0, 0.0, 0.0, 1.0],
            cell_size: params.cell_size,
            section_size: params.section_size,
            cell_thickness: params.cell_thickness,
            section_thickness: params.section_thickness,
            fade_distance: params.fade_distance,
            fade_strength: params.fade_strength,
            fade_from: params.fade_from,
            infinite_scale: 1.0,
            fog_near: 0.0,
            fog_far: 0.0,
            fog_density: 0.0,
            fog_mode: FogMode::Off.to_u32(),
            fog_convention: FogConvention::ViewDepth.to_u32(),
            flags: 0,
            min_half_extent: params.min_half_extent(),
            _pad: 0.0,
        };
        uniforms.set_flag(FLAG_INFINITE_GRID, params.infinite_grid);
        uniforms.set_flag(FLAG_FOLLOW_CAMERA, params.follow_camera);
        uniforms.refresh_infinite_scale();
        uniforms
    }

    /// Write one parameter update in place.
    ///
    /// Returns `true` if the uniform bytes changed. `Side` is pipeline state,
    /// not uniform data, and always returns `false`.
    pub fn apply(&mut self, param: &GridParam) -> bool {
        let before = *self;
        match *param {
            GridParam::CellSize(v) => self.cell_size = v,
            GridParam::CellThickness(v) => self.cell_thickness = v,
            GridParam::CellColor(c) => self.cell_color = c.0,
            GridParam::SectionSize(v) => self.section_size = v,
            GridParam::SectionThickness(v) => self.section_thickness = v,
            GridParam::SectionColor(c) => self.section_color = c.0,
            GridParam::FollowCamera(on) => self.set_flag(FLAG_FOLLOW_CAMERA, on),
            GridParam::InfiniteGrid(on) => {
                self.set_flag(FLAG_INFINITE_GRID, on);
                self.refresh_infinite_scale();
            }
            GridParam::FadeDistance(v) => {
                self.fade_distance = v;
                self.refresh_infinite_scale();
            }
            GridParam::FadeStrength(v) => self.fade_strength = v,
            GridParam::FadeFrom(v) => self.fade_from = v,
            GridParam::Side(_) => {}
        }
        bytemuck::bytes_of(&before) != bytemuck::bytes_of(self)
    }

    /// Store the per-frame camera state. Returns `true` if it changed.
    pub fn set_frame(&mut self, frame: &FrameState) -> bool {
        let cam = vec4(frame.cam_proj_position);
        let plane = vec4(frame.plane_position);
        let changed = self.cam_proj_position != cam || self.plane_position != plane;
        self.cam_proj_position = cam;
        self.plane_position = plane;
        changed
    }

    /// Read back the per-frame camera state.
    pub fn frame(&self) -> FrameState {
        FrameState {
            cam_proj_position: Vec3::from_slice(&self.cam_proj_position[..3]),
            plane_position: Vec3::from_slice(&self.plane_position[..3]),
        }
    }

    /// Mirror the host's fog. Returns `true` if it changed.
    pub fn set_fog(&mut self, fog: &FogSettings) -> bool {
        let before = *self;
        self.fog_color = fog.color.0;
        self.fog_mode = fog.mode.to_u32();
        self.fog_convention = fog.convention.to_u32();
        (self.fog_near, self.fog_far, self.fog_density) = match fog.mode {
            FogMode::Linear { near, far } => (near, far, 0.0),
            FogMode::Exponential { density } | FogMode::ExponentialSquared { density } => {
                (0.0, 0.0, density)
            }
            FogMode::Off | FogMode::Atmospheric { .. } => (0.0, 0.0, 0.0),
        };
        (self.fog_extinction, self.fog_inscattering) = match fog.mode {
            FogMode::Atmospheric {
                extinction,
                inscattering,
            } => (xyz0(extinction), xyz0(inscattering)),
            _ => ([0.0; 4], [0.0; 4]),
        };
        bytemuck::bytes_of(&before) != bytemuck::bytes_of(self)
    }

    /// Reconstruct the fog settings held in the block.
    pub fn fog(&self) -> FogSettings {
        let mode = match self.fog_mode {
            1 => FogMode::Linear {
                near: self.fog_near,
                far: self.fog_far,
            },
            2 => FogMode::Exponential {
                density: self.fog_density,
            },
            3 => FogMode::ExponentialSquared {
                density: self.fog_density,
            },
            4 => FogMode::Atmospheric {
                extinction: [
                    self.fog_extinction[0],
                    self.fog_extinction[1],
                    self.fog_extinction[2],
                ],
                inscattering: [
                    self.fog_inscattering[0],
                    self.fog_inscattering[1],
                    self.fog_inscattering[2],
                ],
            },
            _ => FogMode::Off,
        };
        FogSettings {
            color: crate::color::GridColor(self.fog_color),
            mode,
            convention: FogConvention::from_u32(self.fog_convention),
        }
    }

    pub const fn infinite_grid(&self) -> bool {
        self.flags & FLAG_INFINITE_GRID != 0
    }

    pub const fn follow_camera(&self) -> bool {
        self.flags & FLAG_FOLLOW_CAMERA != 0
    }

    fn set_flag(&mut self, flag: u32, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    fn refresh_infinite_scale(&mut self) {
        self.infinite_scale = if self.infinite_grid() {
            infinite_scale(self.fade_distance, self.min_half_extent)
        } else {
            1.0
        };
    }
}

/// Local-coordinate multiplier for the infinite grid.
///
/// ```text
///   scale = (1 + fade_distance) / min(min_half_extent, 1)
/// ```
///
/// Planes at least 2 units across get exactly `1 + fade_distance`; smaller
/// planes get the extra factor that puts their edge past `fade_distance`.
/// A non-positive extent falls back to `1 + fade_distance`.
pub fn infinite_scale(fade_distance: f32, min_half_extent: f32) -> f32 {
    let base = 1.0 + fade_distance;
    if min_half_extent > 0.0 {
        base / min_half_extent.min(1.0)
    } else {
        base
    }
}

fn vec4(v: Vec3) -> [f32; 4] {
    [v.x, v.y, v.z, 1.0]
}

fn xyz0([x, y, z]: [f32; 3]) -> [f32; 4] {
    [x, y, z, 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::GridColor;
    use crate::params::GridSide;

    #[test]
    fn test_layout_is_std140_sized() {
        assert_eq!(std::mem::size_of::<GridUniforms>(), 176);
        assert_eq!(std::mem::size_of::<GridUniforms>() % 16, 0);
    }

    #[test]
    fn test_new_copies_params() {
        let params = GridParams {
            cell_size: 0.25,
            section_thickness: 2.0,
            follow_camera: true,
            ..GridParams::default()
        };
        let u = GridUniforms::new(&params);
        assert_eq!(u.cell_size, 0.25);
        assert_eq!(u.section_thickness, 2.0);
        assert!(u.follow_camera());
        assert!(!u.infinite_grid());
        assert_eq!(u.infinite_scale, 1.0);
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut u = GridUniforms::new(&GridParams::default());
        assert!(u.apply(&GridParam::CellColor(GridColor::WHITE)));
        assert_eq!(u.cell_color, GridColor::WHITE.0);
        assert!(!u.apply(&GridParam::CellColor(GridColor::WHITE)));
        assert!(!u.apply(&GridParam::Side(GridSide::Double)));
    }

    #[test]
    fn test_apply_matches_fresh_build() {
        let start = GridParams::default();
        let target = GridParams {
            cell_size: 2.0,
            section_size: 10.0,
            infinite_grid: true,
            fade_distance: 40.0,
            fade_from: 0.0,
            section_color: GridColor::WHITE,
            ..start
        };
        let mut u = GridUniforms::new(&start);
        for change in start.diff(&target) {
            u.apply(&change);
        }
        assert_eq!(u, GridUniforms::new(&target));
    }

    #[test]
    fn test_infinite_scale_tracks_fade_distance() {
        let params = GridParams {
            args: [10.0, 10.0],
            infinite_grid: true,
            fade_distance: 30.0,
            ..GridParams::default()
        };
        let mut u = GridUniforms::new(&params);
        assert_eq!(u.infinite_scale, 31.0);
        u.apply(&GridParam::FadeDistance(50.0));
        assert_eq!(u.infinite_scale, 51.0);
        u.apply(&GridParam::InfiniteGrid(false));
        assert_eq!(u.infinite_scale, 1.0);
    }

    #[test]
    fn test_infinite_boundary_lies_beyond_fade() {
        for args in [[1.0, 1.0], [10.0, 10.0], [0.2, 4.0], [2.0, 2.0], [50.0, 3.0]] {
            for fade in [0.0, 0.5, 1.0, 10.0, 100.0, 1000.0] {
                let params = GridParams {
                    args,
                    infinite_grid: true,
                    fade_distance: fade,
                    ..GridParams::default()
                };
                let u = GridUniforms::new(&params);
                let boundary = params.min_half_extent() * u.infinite_scale;
                assert!(
                    boundary > fade,
                    "args {args:?}, fade {fade}: boundary {boundary}"
                );
            }
        }
    }

    #[test]
    fn test_frame_round_trip() {
        let mut u = GridUniforms::new(&GridParams::default());
        let frame = FrameState {
            cam_proj_position: Vec3::new(1.0, 0.0, 2.0),
            plane_position: Vec3::new(0.0, 0.5, 0.0),
        };
        assert!(u.set_frame(&frame));
        assert!(!u.set_frame(&frame));
        assert_eq!(u.frame(), frame);
    }

    #[test]
    fn test_fog_round_trip() {
        let mut u = GridUniforms::new(&GridParams::default());
        assert_eq!(u.fog(), FogSettings::default());
        let fog = FogSettings::linear(GridColor::linear(0.5, 0.5, 0.6, 1.0), 5.0, 60.0);
        assert!(u.set_fog(&fog));
        assert!(!u.set_fog(&fog));
        assert_eq!(u.fog(), fog);
        let exp = FogSettings::exponential_squared(GridColor::BLACK, 0.02);
        u.set_fog(&exp);
        assert_eq!(u.fog(), exp);
    }

    #[test]
    fn test_fog_round_trip_every_mode() {
        let color = GridColor::linear(0.2, 0.3, 0.4, 0.9);
        let mut u = GridUniforms::new(&GridParams::default());
        for fog in [
            FogSettings::exponential(color, 0.1),
            FogSettings::atmospheric(color, [0.1, 0.2, 0.3], [0.05, 0.06, 0.07]),
            FogSettings::linear(color, 2.0, 8.0).with_convention(FogConvention::CameraDistance),
            FogSettings::default(),
        ] {
            u.set_fog(&fog);
            assert_eq!(u.fog(), fog);
        }
        assert_eq!(u.fog_extinction, [0.0; 4]);
    }

    #[test]
    fn test_unit_plane_infinite_scale_doubles() {
        let params = GridParams {
            infinite_grid: true,
            fade_distance: 100.0,
            ..GridParams::default()
        };
        assert_eq!(params.args, [1.0, 1.0]);
        assert_eq!(GridUniforms::new(&params).infinite_scale, 2.0 * 101.0);
    }
}
