//! Distance fog mirrored from the host scene.
//!
//! The grid does its own fog blending so that it composites like the rest of
//! the fogged geometry. Falloffs, with `d` the fog distance:
//!
//! ```text
//!   Linear:              f = ramp(near, far, d)
//!   Exponential:         f = 1 − exp(−density × d)
//!   ExponentialSquared:  f = 1 − exp(−density² × d²)
//!   Atmospheric:         extinction_i   = 1 − exp(−extinction_i × d)
//!                        inscattering_i = 1 − exp(−inscattering_i × d)
//! ```
//!
//! The [`FogConvention`] picks the distance, the linear ramp and the blend:
//!
//! ```text
//!   ViewDepth:       d = depth along the view axis, ramp = smoothstep
//!                    rgb_i = rgb_i × (1 − e_i) + fog_i × s_i
//!                    a     = a × (1 − ē) + fog_a × ē
//!
//!   CameraDistance:  d = |world − camera|, ramp = 1 − clamp((far − d) / (far − near))
//!                    rgb_i = rgb_i × (1 − e_i × fog_a) + fog_i × s_i × fog_a
//!                    a     unchanged
//! ```
//!
//! `e` and `s` are the extinction and inscattering amounts. Every falloff but
//! `Atmospheric` has `e_i = s_i = f`, so `ViewDepth` reduces to
//! `mix(in, fog_color, f)` on all four channels and `CameraDistance` to Bevy's
//! `DistanceFog` blend.

use serde::{Deserialize, Serialize};

use crate::color::GridColor;

/// Fog falloff as understood by the grid shader.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FogMode {
    #[default]
    Off,
    Linear {
        near: f32,
        far: f32,
    },
    Exponential {
        density: f32,
    },
    ExponentialSquared {
        density: f32,
    },
    /// Per-channel extinction and inscattering densities.
    Atmospheric {
        extinction: [f32; 3],
        inscattering: [f32; 3],
    },
}

impl FogMode {
    /// GPU-compatible integer for the shader uniform.
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::Off => 0,
            Self::Linear { .. } => 1,
            Self::Exponential { .. } => 2,
            Self::ExponentialSquared { .. } => 3,
            Self::Atmospheric { .. } => 4,
        }
    }
}

/// Which distance and blend the fog follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FogConvention {
    /// Forward view depth, smoothstep ramp, all four channels blended.
    #[default]
    ViewDepth,
    /// Straight-line camera distance, linear ramp, colour blended by the fog
    /// colour's alpha and fragment alpha kept. Bevy's `DistanceFog`.
    CameraDistance,
}

impl FogConvention {
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::ViewDepth => 0,
            Self::CameraDistance => 1,
        }
    }

    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::CameraDistance,
            _ => Self::ViewDepth,
        }
    }
}

/// Per-channel fog amounts at one distance, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogAmount {
    /// Share of the fragment colour removed.
    pub extinction: [f32; 3],
    /// Share of the fog colour added.
    pub inscattering: [f32; 3],
}

impl FogAmount {
    pub const NONE: Self = Self::uniform(0.0);

    pub const fn uniform(factor: f32) -> Self {
        Self {
            extinction: [factor; 3],
            inscattering: [factor; 3],
        }
    }

    /// Mean extinction, used for the alpha channel. Exact for uniform amounts.
    pub fn mean_extinction(&self) -> f32 {
        let [r, g, b] = self.extinction;
        if r == g && g == b {
            r
        } else {
            (r + g + b) / 3.0
        }
    }
}

/// Fog color, falloff and convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FogSettings {
    pub color: GridColor,
    pub mode: FogMode,
    #[serde(default)]
    pub convention: FogConvention,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            color: GridColor::WHITE,
            mode: FogMode::Off,
            convention: FogConvention::ViewDepth,
        }
    }
}

impl FogSettings {
    pub fn linear(color: GridColor, near: f32, far: f32) -> Self {
        Self::new(color, FogMode::Linear { near, far })
    }

    pub fn exponential(color: GridColor, density: f32) -> Self {
        Self::new(color, FogMode::Exponential { density })
    }

    pub fn exponential_squared(color: GridColor, density: f32) -> Self {
        Self::new(color, FogMode::ExponentialSquared { density })
    }

    pub fn atmospheric(color: GridColor, extinction: [f32; 3], inscattering: [f32; 3]) -> Self {
        Self::new(
            color,
            FogMode::Atmospheric {
                extinction,
                inscattering,
            },
        )
    }

    fn new(color: GridColor, mode: FogMode) -> Self {
        Self {
            color,
            mode,
            convention: FogConvention::ViewDepth,
        }
    }

    pub fn with_convention(mut self, convention: FogConvention) -> Self {
        self.convention = convention;
        self
    }

    /// The fog distance for this convention.
    pub fn distance(&self, view_depth: f32, view_distance: f32) -> f32 {
        match self.convention {
            FogConvention::ViewDepth => view_depth,
            FogConvention::CameraDistance => view_distance,
        }
    }

    /// Fog amount in `[0, 1]` at fog distance `d`. Atmospheric fog reports its
    /// mean extinction.
    pub fn factor(&self, d: f32) -> f32 {
        self.amount(d).mean_extinction()
    }

    /// Per-channel fog amounts at fog distance `d`.
    pub fn amount(&self, d: f32) -> FogAmount {
        fog_amount(self.mode, self.convention, d)
    }

    /// Blend `rgba` toward the fog color. Both distances are passed and the
    /// convention picks one.
    pub fn apply(&self, rgba: [f32; 4], view_depth: f32, view_distance: f32) -> [f32; 4] {
        let amount = self.amount(self.distance(view_depth, view_distance));
        apply_fog(rgba, self.color, &amount, self.convention)
    }
}

/// Per-channel fog amounts. Both `grid.wgsl` files mirror this exactly.
pub fn fog_amount(mode: FogMode, convention: FogConvention, d: f32) -> FogAmount {
    match mode {
        FogMode::Off => FogAmount::NONE,
        FogMode::Linear { near, far } => FogAmount::uniform(match convention {
            FogConvention::ViewDepth => smoothstep(near, far, d),
            FogConvention::CameraDistance => linear_ramp(near, far, d),
        }),
        FogMode::Exponential { density } => FogAmount::uniform(exp_falloff(density * d)),
        FogMode::ExponentialSquared { density } => {
            let x = density * d;
            FogAmount::uniform(exp_falloff(x * x))
        }
        FogMode::Atmospheric {
            extinction,
            inscattering,
        } => FogAmount {
            extinction: extinction.map(|k| exp_falloff(k * d)),
            inscattering: inscattering.map(|k| exp_falloff(k * d)),
        },
    }
}

/// Blend toward `fog_color` with the given amounts.
pub fn apply_fog(
    rgba: [f32; 4],
    fog_color: GridColor,
    amount: &FogAmount,
    convention: FogConvention,
) -> [f32; 4] {
    let [fr, fg, fb, fa] = fog_color.0;
    let fog = [fr, fg, fb];
    // ViewDepth blends at full strength, CameraDistance weights by fog alpha.
    let weight = match convention {
        FogConvention::ViewDepth => 1.0,
        FogConvention::CameraDistance => fa,
    };
    let mut out = rgba;
    for i in 0..3 {
        out[i] = rgba[i] * (1.0 - amount.extinction[i] * weight)
            + fog[i] * amount.inscattering[i] * weight;
    }
    if convention == FogConvention::ViewDepth {
        let e = amount.mean_extinction();
        out[3] = rgba[3] * (1.0 - e) + fa * e;
    }
    out
}

/// Hermite smoothstep. A collapsed range (`edge1 <= edge0`) acts as a step
/// at `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return step(edge1, x);
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// `1 − clamp((end − x) / (end − start), 0, 1)`. A collapsed range acts as a
/// step at `end`.
pub fn linear_ramp(start: f32, end: f32, x: f32) -> f32 {
    if end <= start {
        return step(end, x);
    }
    1.0 - ((end - x) / (end - start)).clamp(0.0, 1.0)
}

fn step(edge: f32, x: f32) -> f32 {
    if x >= edge { 1.0 } else { 0.0 }
}

/// `1 − exp(−x)`, clamped to `[0, 1]`.
fn exp_falloff(x: f32) -> f32 {
    (1.0 - (-x).exp()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn close(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < EPSILON)
    }

    #[test]
    fn test_off_never_fogs() {
        let fog = FogSettings::default();
        let rgba = [0.2, 0.4, 0.6, 0.8];
        assert_eq!(fog.apply(rgba, 1.0e6, 1.0e6), rgba);
    }

    #[test]
    fn test_linear_bounds() {
        let fog = FogSettings::linear(GridColor::WHITE, 10.0, 50.0);
        assert_eq!(fog.factor(0.0), 0.0);
        assert_eq!(fog.factor(10.0), 0.0);
        assert!((fog.factor(30.0) - 0.5).abs() < EPSILON);
        assert_eq!(fog.factor(50.0), 1.0);
        assert_eq!(fog.factor(500.0), 1.0);
    }

    #[test]
    fn test_linear_collapsed_range_is_step() {
        for convention in [FogConvention::ViewDepth, FogConvention::CameraDistance] {
            let fog = FogSettings::linear(GridColor::WHITE, 20.0, 20.0).with_convention(convention);
            assert_eq!(fog.factor(19.9), 0.0);
            assert_eq!(fog.factor(20.0), 1.0);
        }
    }

    #[test]
    fn test_camera_distance_linear_is_a_straight_ramp() {
        let fog = FogSettings::linear(GridColor::WHITE, 20.0, 60.0)
            .with_convention(FogConvention::CameraDistance);
        assert_eq!(fog.factor(20.0), 0.0);
        assert!((fog.factor(30.0) - 0.25).abs() < EPSILON);
        assert!((fog.factor(50.0) - 0.75).abs() < EPSILON);
        assert_eq!(fog.factor(60.0), 1.0);
    }

    #[test]
    fn test_camera_distance_uses_off_axis_distance() {
        // Camera at (0, 5, 0) looking down −Z, fragment at (30, 0, −30).
        let depth = 30.0_f32;
        let distance = (30.0_f32 * 30.0 + 5.0 * 5.0 + 30.0 * 30.0).sqrt();
        let bevy = FogSettings::linear(GridColor::WHITE, 20.0, 60.0)
            .with_convention(FogConvention::CameraDistance);
        let d = bevy.distance(depth, distance);
        assert_eq!(d, distance);
        let expected = (distance - 20.0) / 40.0;
        assert!((bevy.factor(d) - expected).abs() < EPSILON);
        assert!((bevy.factor(d) - 0.568).abs() < 1e-3);

        let view_depth = bevy.with_convention(FogConvention::ViewDepth);
        assert_eq!(view_depth.distance(depth, distance), depth);
    }

    #[test]
    fn test_camera_distance_keeps_alpha_and_weights_by_fog_alpha() {
        let fog = FogSettings::linear(GridColor::linear(1.0, 1.0, 1.0, 0.5), 0.0, 1.0)
            .with_convention(FogConvention::CameraDistance);
        let out = fog.apply([0.0, 0.0, 0.0, 0.25], 0.0, 5.0);
        assert!(close(out, [0.5, 0.5, 0.5, 0.25]), "{out:?}");
    }

    #[test]
    fn test_exponential_matches_closed_form() {
        let fog = FogSettings::exponential(GridColor::WHITE, 0.1);
        assert_eq!(fog.factor(0.0), 0.0);
        assert!((fog.factor(10.0) - (1.0 - (-1.0_f32).exp())).abs() < EPSILON);
    }

    #[test]
    fn test_exponential_squared_grows_with_depth() {
        let fog = FogSettings::exponential_squared(GridColor::WHITE, 0.05);
        assert_eq!(fog.factor(0.0), 0.0);
        let mut last = 0.0;
        for depth in [1.0, 5.0, 10.0, 20.0, 40.0, 80.0] {
            let f = fog.factor(depth);
            assert!(f >= last, "fog must not decrease: {f} < {last} at {depth}");
            last = f;
        }
        assert!(last > 0.99);
    }

    #[test]
    fn test_atmospheric_is_per_channel() {
        let fog = FogSettings::atmospheric(
            GridColor::linear(1.0, 1.0, 1.0, 1.0),
            [0.0, 0.1, 1.0],
            [0.0, 0.0, 1.0],
        )
        .with_convention(FogConvention::CameraDistance);
        let amount = fog.amount(10.0);
        assert_eq!(amount.extinction[0], 0.0);
        assert!((amount.extinction[1] - (1.0 - (-1.0_f32).exp())).abs() < EPSILON);
        assert!(amount.extinction[2] > 0.9999);

        let out = fog.apply([0.5, 0.5, 0.5, 0.75], 0.0, 10.0);
        assert!((out[0] - 0.5).abs() < EPSILON);
        assert!(out[1] < 0.5);
        assert!((out[2] - 1.0).abs() < 1e-3);
        assert_eq!(out[3], 0.75);
    }

    #[test]
    fn test_full_fog_replaces_color_and_alpha() {
        let fog_color = GridColor::linear(0.1, 0.2, 0.3, 1.0);
        let fog = FogSettings::linear(fog_color, 0.0, 1.0);
        assert_eq!(fog.apply([1.0, 1.0, 1.0, 0.25], 5.0, 5.0), fog_color.0);
    }

    #[test]
    fn test_fog_mode_serde_tags() {
        let json = serde_json::to_string(&FogMode::Linear { near: 1.0, far: 2.0 }).unwrap();
        assert_eq!(json, r#"{"mode":"linear","near":1.0,"far":2.0}"#);
    }

    #[test]
    fn test_fog_settings_convention_defaults_to_view_depth() {
        let json = r##"{ "color": "#ffffff", "mode": { "mode": "off" } }"##;
        let fog: FogSettings = serde_json::from_str(json).unwrap();
        assert_eq!(fog.convention, FogConvention::ViewDepth);
    }
}
