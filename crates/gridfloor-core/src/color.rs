//! Grid line colors.
//!
//! Colors are authored as sRGB hex strings (`#2080ff`, `#2080ff80`) and stored
//! as linear RGBA, which is what the shaders blend in.

use std::fmt;
use std::str::FromStr;

use palette::{LinSrgb, Srgb};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Linear RGBA color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridColor(pub [f32; 4]);

impl GridColor {
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 1.0]);
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);

    /// Build from linear components.
    pub const fn linear(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    /// Parse `#rrggbb`, `#rgb` or `#rrggbbaa` (leading `#` optional).
    ///
    /// RGB digits are sRGB-encoded and converted to linear; alpha is taken
    /// as-is.
    pub fn from_hex(input: &str) -> Result<Self, GridError> {
        let digits = input.trim().trim_start_matches('#');
        let invalid = |reason: String| GridError::InvalidColor {
            input: input.to_string(),
            reason,
        };

        if !digits.is_ascii() {
            return Err(invalid("non-ASCII characters".to_string()));
        }

        let (rgb_digits, alpha) = match digits.len() {
            3 | 6 => (digits, 1.0),
            8 => {
                let a = u8::from_str_radix(&digits[6..], 16)
                    .map_err(|e| invalid(format!("alpha: {e}")))?;
                (&digits[..6], f32::from(a) / 255.0)
            }
            n => return Err(invalid(format!("expected 3, 6 or 8 hex digits, got {n}"))),
        };

        let srgb = Srgb::<u8>::from_str(rgb_digits).map_err(|e| invalid(e.to_string()))?;
        let lin: LinSrgb<f32> = srgb.into_format::<f32>().into_linear();
        Ok(Self([lin.red, lin.green, lin.blue, alpha]))
    }

    /// Encode back to `#rrggbb`, or `#rrggbbaa` when alpha is not opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.0;
        let lin = LinSrgb::new(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0));
        let srgb: Srgb<u8> = Srgb::<f32>::from_linear(lin).into_format::<u8>();
        let alpha = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
        if alpha == 255 {
            format!("#{:02x}{:02x}{:02x}", srgb.red, srgb.green, srgb.blue)
        } else {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                srgb.red, srgb.green, srgb.blue, alpha
            )
        }
    }

    pub const fn alpha(&self) -> f32 {
        self.0[3]
    }

    /// Component-wise linear interpolation, `t` unclamped.
    pub fn mix(&self, other: &Self, t: f32) -> Self {
        Self(std::array::from_fn(|i| {
            self.0[i] * (1.0 - t) + other.0[i] * t
        }))
    }
}

impl Default for GridColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for GridColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for GridColor {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for GridColor {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<GridColor> for String {
    fn from(color: GridColor) -> Self {
        color.to_hex()
    }
}
