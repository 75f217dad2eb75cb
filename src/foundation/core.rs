use crate::foundation::error::{PipelineError, PipelineResult};
use crate::foundation::math::SRGB_TO_LINEAR;

/// Straight-alpha linear RGBA color with float channels, nominally in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Build a color from linear channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Decode sRGB-encoded 8-bit channels; alpha is linear.
    pub fn from_srgb8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: SRGB_TO_LINEAR[usize::from(r)],
            g: SRGB_TO_LINEAR[usize::from(g)],
            b: SRGB_TO_LINEAR[usize::from(b)],
            a: f32::from(a) / 255.0,
        }
    }

    /// Multiply color channels by alpha.
    pub fn premultiply(self) -> PremulColor {
        PremulColor {
            r: self.r * self.a,
            g: self.g * self.a,
            b: self.b * self.a,
            a: self.a,
        }
    }

    /// Whether alpha is exactly one.
    pub fn is_opaque(self) -> bool {
        self.a == 1.0
    }

    /// Check that every channel is finite and inside [0, 1].
    pub fn validate(self) -> PipelineResult<()> {
        let channels = [self.r, self.g, self.b, self.a];
        if channels.iter().all(|c| (0.0..=1.0).contains(c)) {
            Ok(())
        } else {
            Err(PipelineError::validation(format!(
                "color channels must be within [0, 1], got {channels:?}"
            )))
        }
    }
}

/// Premultiplied linear RGBA color: `r`, `g`, `b` are already scaled by `a`.
#[derive(Clone, Copy, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct PremulColor {
    /// Red, scaled by alpha.
    pub r: f32,
    /// Green, scaled by alpha.
    pub g: f32,
    /// Blue, scaled by alpha.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl PremulColor {
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::from_array([0.0; 4]);

    /// Build from `[r, g, b, a]`.
    pub const fn from_array([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }

    /// `[r, g, b, a]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Whether alpha is exactly one.
    pub fn is_opaque(self) -> bool {
        self.a == 1.0
    }
}

/// Integer rectangle with half-open extents: `left <= x < right`, `top <= y < bottom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct IntRect {
    /// Inclusive left edge.
    pub left: i32,
    /// Inclusive top edge.
    pub top: i32,
    /// Exclusive right edge.
    pub right: i32,
    /// Exclusive bottom edge.
    pub bottom: i32,
}

impl IntRect {
    /// Build from origin and size. Rejects negative sizes and edges that overflow `i32`.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> PipelineResult<Self> {
        if width < 0 || height < 0 {
            return Err(PipelineError::validation(format!(
                "rect size must be non-negative, got {width}x{height}"
            )));
        }
        let right = x
            .checked_add(width)
            .ok_or_else(|| PipelineError::validation("rect right edge overflows"))?;
        let bottom = y
            .checked_add(height)
            .ok_or_else(|| PipelineError::validation("rect bottom edge overflows"))?;
        Ok(Self {
            left: x,
            top: y,
            right,
            bottom,
        })
    }

    /// Width in pixels (zero for inverted rects).
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left).max(0) as u32
    }

    /// Height in pixels (zero for inverted rects).
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top).max(0) as u32
    }

    /// Whether the rect covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Overlap of two rects, `None` when they do not share a pixel.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let out = Self {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        (!out.is_empty()).then_some(out)
    }

    /// Whether pixel `(x, y)` lies inside.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
