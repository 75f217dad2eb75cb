use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use kurbo::{Affine, Point};

use crate::foundation::core::Color;
use crate::pipeline::builder::Pipeline;
use crate::pipeline::stage::StageKind;
use crate::raster::blend::BlendMode;

/// Source of per-pixel color for a blit.
///
/// On entry the working registers hold the device-space pixel center in `r` and `g`, and the
/// scratch registers hold the premultiplied paint color. The appended stages must leave the
/// premultiplied shader color in the working registers.
pub trait Shader: fmt::Debug {
    /// Append the shading stages; `false` when this shader cannot be expressed.
    fn append_stages(&self, pipeline: &mut Pipeline, ctm: &Affine) -> bool;

    /// Whether every produced pixel is opaque.
    fn is_opaque(&self) -> bool;

    /// Whether every produced pixel is the same color.
    fn is_constant(&self) -> bool {
        false
    }
}

/// Per-pixel color transformation applied after the shader.
pub trait ColorFilter: fmt::Debug {
    /// Append the filter stages; `shader_is_opaque` tells whether the input alpha is one.
    fn append_stages(&self, pipeline: &mut Pipeline, shader_is_opaque: bool) -> bool;

    /// Whether the filter leaves alpha untouched.
    fn alpha_unchanged(&self) -> bool;
}

/// How a blit colors pixels.
#[derive(Clone, Debug)]
pub struct Paint {
    /// Straight-alpha linear color; modulates the shader output when a shader is set.
    pub color: Color,
    /// Compositing with the destination.
    pub blend_mode: BlendMode,
    /// Optional per-pixel color source.
    pub shader: Option<Rc<dyn Shader>>,
    /// Optional color transformation.
    pub color_filter: Option<Rc<dyn ColorFilter>>,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            blend_mode: BlendMode::SrcOver,
            shader: None,
            color_filter: None,
        }
    }
}

impl Paint {
    /// A solid paint.
    pub fn from_color(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Replace the blend mode.
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Attach a shader.
    pub fn with_shader(mut self, shader: Rc<dyn Shader>) -> Self {
        self.shader = Some(shader);
        self
    }

    /// Attach a color filter.
    pub fn with_color_filter(mut self, filter: Rc<dyn ColorFilter>) -> Self {
        self.color_filter = Some(filter);
        self
    }
}

/// Shades every pixel with one color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorShader {
    color: Color,
}

impl ColorShader {
    /// Shader producing `color`.
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Shader for ColorShader {
    fn append_stages(&self, pipeline: &mut Pipeline, _: &Affine) -> bool {
        pipeline.append(
            StageKind::ConstantColor,
            Rc::new(Cell::new(self.color.premultiply())),
        );
        true
    }

    fn is_opaque(&self) -> bool {
        self.color.is_opaque()
    }

    fn is_constant(&self) -> bool {
        true
    }
}

/// Two-stop linear gradient, clamped beyond its end points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearGradientShader {
    start: Point,
    end: Point,
    colors: [Color; 2],
}

impl LinearGradientShader {
    /// Gradient from `colors[0]` at `start` to `colors[1]` at `end`, in local coordinates.
    pub fn new(start: Point, end: Point, colors: [Color; 2]) -> Self {
        Self { start, end, colors }
    }
}

impl Shader for LinearGradientShader {
    fn append_stages(&self, pipeline: &mut Pipeline, ctm: &Affine) -> bool {
        let det = ctm.determinant();
        let delta = self.end - self.start;
        let len2 = delta.hypot2();
        if !det.is_finite() || det.abs() < f64::EPSILON || !(len2 > 0.0) {
            return false;
        }

        // Device pixel -> local point -> parameter t along the gradient.
        let [a, b, c, d, e, f] = ctm.inverse().as_coeffs();
        let mut to_t = [0.0f32; 20];
        to_t[0] = ((delta.x * a + delta.y * b) / len2) as f32;
        to_t[4] = ((delta.x * c + delta.y * d) / len2) as f32;
        to_t[16] = ((delta.x * (e - self.start.x) + delta.y * (f - self.start.y)) / len2) as f32;

        // t -> premultiplied color.
        let from = self.colors[0].premultiply().to_array();
        let to = self.colors[1].premultiply().to_array();
        let mut to_color = [0.0f32; 20];
        for channel in 0..4 {
            to_color[channel] = to[channel] - from[channel];
            to_color[16 + channel] = from[channel];
        }

        pipeline.append(StageKind::Matrix4x5, Rc::new(to_t));
        pipeline.push(StageKind::Clamp0);
        pipeline.push(StageKind::Clamp1);
        pipeline.append(StageKind::Matrix4x5, Rc::new(to_color));
        true
    }

    fn is_opaque(&self) -> bool {
        self.colors.iter().all(|c| c.is_opaque())
    }
}

/// Affine 4x5 transform of unpremultiplied color.
///
/// Rows are `[r, g, b, a, translate]` for the red, green, blue and alpha outputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatrixColorFilter {
    rows: [[f32; 5]; 4],
}

impl MatrixColorFilter {
    /// Filter from row-major coefficients.
    pub fn new(rows: [[f32; 5]; 4]) -> Self {
        Self { rows }
    }

    /// Build from 20 row-major coefficients.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        if values.len() != 20 {
            return None;
        }
        Some(Self::new(std::array::from_fn(|row| {
            std::array::from_fn(|col| values[row * 5 + col])
        })))
    }

    /// Stage layout: column-major, translation last.
    fn column_major(&self) -> [f32; 20] {
        std::array::from_fn(|i| self.rows[i % 4][i / 4])
    }
}

impl ColorFilter for MatrixColorFilter {
    fn append_stages(&self, pipeline: &mut Pipeline, shader_is_opaque: bool) -> bool {
        if !shader_is_opaque {
            pipeline.push(StageKind::Unpremul);
        }
        pipeline.append(StageKind::Matrix4x5, Rc::new(self.column_major()));
        pipeline.push(StageKind::Clamp0);
        pipeline.push(StageKind::Clamp1);
        pipeline.push(StageKind::Premul);
        true
    }

    fn alpha_unchanged(&self) -> bool {
        self.rows[3] == [0.0, 0.0, 0.0, 1.0, 0.0]
    }
}

/// Replaces the color with its luminance as alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LumaColorFilter;

impl ColorFilter for LumaColorFilter {
    fn append_stages(&self, pipeline: &mut Pipeline, _: bool) -> bool {
        pipeline.push(StageKind::LuminanceToAlpha);
        true
    }

    fn alpha_unchanged(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/paint.rs"]
mod tests;
