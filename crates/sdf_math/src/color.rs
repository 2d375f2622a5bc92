use serde::{Deserialize, Serialize};

use crate::{Vec3, Vec4};

/// An RGBA color with floating point channels in the 0-1 range.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

    /// Opaque white.
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    /// Create a color from four channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Channels as a `Vec4` (r, g, b, a).
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    /// Compare channel by channel with [`crate::equal_f32`].
    pub fn approx_eq(&self, other: &Color) -> bool {
        crate::equal_f32(self.r, other.r)
            && crate::equal_f32(self.g, other.g)
            && crate::equal_f32(self.b, other.b)
            && crate::equal_f32(self.a, other.a)
    }
}

impl From<Vec4> for Color {
    fn from(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

/// RGB with an opaque alpha channel.
impl From<Vec3> for Color {
    fn from(v: Vec3) -> Self {
        Self::rgb(v.x, v.y, v.z)
    }
}
