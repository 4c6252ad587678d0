//! Grid parameter set.
//!
//! `GridParams` is the construction-time configuration of a grid. Every host
//! builds its material from it, and later changes reach the material as a
//! list of [`GridParam`] updates produced by [`GridParams::diff`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::GridColor;
use crate::error::GridError;

/// Which face of the plane is rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSide {
    /// Visible from above (+Y).
    #[default]
    Front,
    /// Visible from below.
    Back,
    /// Visible from both sides.
    Double,
}

impl GridSide {
    /// GPU-compatible integer for pipeline keys.
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::Front => 0,
            Self::Back => 1,
            Self::Double => 2,
        }
    }

    /// Inverse of [`GridSide::to_u32`]. Unknown values render both faces.
    pub const fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Front,
            1 => Self::Back,
            _ => Self::Double,
        }
    }
}

/// Full grid configuration. Every field is optional in serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Plane extent `[width, depth]` in local units. Fixed at construction.
    ///
    /// With the infinite grid on, planes under 2 units across are stretched
    /// further than `1 + fade_distance` so their edge still clears the fade;
    /// the default unit plane stretches by `2 × (1 + fade_distance)`.
    pub args: [f32; 2],

    /// Spacing of the fine (cell) lines.
    pub cell_size: f32,
    /// Coverage bias of the cell lines. `<= 0` hides them, `>= 1` fills.
    pub cell_thickness: f32,
    /// Cell line color.
    pub cell_color: GridColor,

    /// Spacing of the coarse (section) lines.
    pub section_size: f32,
    /// Coverage bias of the section lines. `<= 0` hides them, `>= 1` fills.
    pub section_thickness: f32,
    /// Section line color.
    pub section_color: GridColor,

    /// Re-center the pattern under the camera every frame.
    pub follow_camera: bool,
    /// Stretch the plane so its edges sit beyond the fade boundary.
    pub infinite_grid: bool,

    /// Distance from the fade origin at which the grid is fully transparent.
    pub fade_distance: f32,
    /// Exponent of the fade curve. Higher values cut off more sharply.
    pub fade_strength: f32,
    /// Scale applied to the camera projection to get the fade origin.
    /// `1.0` fades around the camera, `0.0` around the world origin.
    pub fade_from: f32,

    /// Rasterized face.
    pub side: GridSide,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            args: [1.0, 1.0],
            cell_size: 0.5,
            cell_thickness: 0.5,
            cell_color: GridColor::BLACK,
            section_size: 1.0,
            section_thickness: 0.75,
            // #2080ff
            section_color: GridColor::linear(0.014_443, 0.215_861, 1.0, 1.0),
            follow_camera: false,
            infinite_grid: false,
            fade_distance: 100.0,
            fade_strength: 1.0,
            fade_from: 1.0,
            side: GridSide::Front,
        }
    }
}

/// A single reactive parameter update.
///
/// Plane extent is deliberately absent: geometry is not rebuilt after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridParam {
    CellSize(f32),
    CellThickness(f32),
    CellColor(GridColor),
    SectionSize(f32),
    SectionThickness(f32),
    SectionColor(GridColor),
    FollowCamera(bool),
    InfiniteGrid(bool),
    FadeDistance(f32),
    FadeStrength(f32),
    FadeFrom(f32),
    Side(GridSide),
}

impl GridParams {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, GridError> {
        let json = std::fs::read_to_string(path)?;
        let params = Self::from_json_str(&json)?;
        tracing::debug!("loaded grid config from {}", path.display());
        Ok(params)
    }

    /// Half of the smaller plane dimension.
    pub fn min_half_extent(&self) -> f32 {
        self.args[0].abs().min(self.args[1].abs()) * 0.5
    }

    /// Whether `next` asks for a different plane extent than `self`.
    pub fn extent_changed(&self, next: &Self) -> bool {
        self.args != next.args
    }

    /// Updates that turn `self` into `next`, in declaration order.
    pub fn diff(&self, next: &Self) -> Vec<GridParam> {
        let mut changes = Vec::new();
        macro_rules! push_if_changed {
            ($field:ident, $variant:ident) => {
                if self.$field != next.$field {
                    changes.push(GridParam::$variant(next.$field));
                }
            };
        }
        push_if_changed!(cell_size, CellSize);
        push_if_changed!(cell_thickness, CellThickness);
        push_if_changed!(cell_color, CellColor);
        push_if_changed!(section_size, SectionSize);
        push_if_changed!(section_thickness, SectionThickness);
        push_if_changed!(section_color, SectionColor);
        push_if_changed!(follow_camera, FollowCamera);
        push_if_changed!(infinite_grid, InfiniteGrid);
        push_if_changed!(fade_distance, FadeDistance);
        push_if_changed!(fade_strength, FadeStrength);
        push_if_changed!(fade_from, FadeFrom);
        push_if_changed!(side, Side);
        changes
    }

    /// Write one update into the parameter set.
    pub fn apply(&mut self, param: GridParam) {
        match param {
            GridParam::CellSize(v) => self.cell_size = v,
            GridParam::CellThickness(v) => self.cell_thickness = v,
            GridParam::CellColor(v) => self.cell_color = v,
            GridParam::SectionSize(v) => self.section_size = v,
            GridParam::SectionThickness(v) => self.section_thickness = v,
            GridParam::SectionColor(v) => self.section_color = v,
            GridParam::FollowCamera(v) => self.follow_camera = v,
            GridParam::InfiniteGrid(v) => self.infinite_grid = v,
            GridParam::FadeDistance(v) => self.fade_distance = v,
            GridParam::FadeStrength(v) => self.fade_strength = v,
            GridParam::FadeFrom(v) => self.fade_from = v,
            GridParam::Side(v) => self.side = v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_section_color_is_2080ff() {
        let expected = GridColor::from_hex("#2080ff").unwrap();
        let actual = GridParams::default().section_color;
        for c in 0..4 {
            assert!(
                (expected.0[c] - actual.0[c]).abs() < 1e-4,
                "channel {c}: {} vs {}",
                expected.0[c],
                actual.0[c]
            );
        }
    }

    #[test]
    fn test_json_missing_fields_take_defaults() {
        let params = GridParams::from_json_str(r#"{ "cell_size": 2.0 }"#).unwrap();
        assert_eq!(params.cell_size, 2.0);
        assert_eq!(params.section_size, GridParams::default().section_size);
        assert_eq!(params.side, GridSide::Front);
    }

    #[test]
    fn test_json_full_config() {
        let json = r##"{
            "args": [10.5, 10.5],
            "cell_color": "#6f6f6f",
            "section_color": "#9d4b4b",
            "follow_camera": true,
            "infinite_grid": true,
            "side": "double"
        }"##;
        let params = GridParams::from_json_str(json).unwrap();
        assert_eq!(params.args, [10.5, 10.5]);
        assert!(params.follow_camera && params.infinite_grid);
        assert_eq!(params.side, GridSide::Double);
        assert_eq!(params.cell_color.to_hex(), "#6f6f6f");
    }

    #[test]
    fn test_json_rejects_bad_color() {
        let err = GridParams::from_json_str(r#"{ "cell_color": "red" }"#).unwrap_err();
        assert!(matches!(err, GridError::Json(_)), "got {err:?}");
    }

    #[test]
    fn test_diff_of_equal_params_is_empty() {
        let params = GridParams::default();
        assert!(params.diff(&params).is_empty());
    }

    #[test]
    fn test_diff_reports_only_changed_fields() {
        let before = GridParams::default();
        let after = GridParams {
            fade_distance: 25.0,
            side: GridSide::Back,
            ..before
        };
        assert_eq!(
            before.diff(&after),
            vec![GridParam::FadeDistance(25.0), GridParam::Side(GridSide::Back)]
        );
    }

    #[test]
    fn test_diff_ignores_extent() {
        let before = GridParams::default();
        let after = GridParams {
            args: [20.0, 20.0],
            ..before
        };
        assert!(before.diff(&after).is_empty());
        assert!(before.extent_changed(&after));
    }

    #[test]
    fn test_apply_diff_reaches_target() {
        let mut current = GridParams::default();
        let target = GridParams {
            cell_size: 0.25,
            cell_color: GridColor::WHITE,
            follow_camera: true,
            fade_strength: 3.0,
            ..current
        };
        for change in current.diff(&target) {
            current.apply(change);
        }
        assert_eq!(current, target);
    }

    #[test]
    fn test_side_u32_round_trip() {
        for side in [GridSide::Front, GridSide::Back, GridSide::Double] {
            assert_eq!(GridSide::from_u32(side.to_u32()), side);
        }
    }

    #[test]
    fn test_min_half_extent() {
        let params = GridParams {
            args: [4.0, 10.0],
            ..GridParams::default()
        };
        assert_eq!(params.min_half_extent(), 2.0);
    }
}
