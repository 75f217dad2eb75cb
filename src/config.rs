//! JSON descriptions of color transforms and paints.
//!
//! ```json
//! {
//!   "src": { "xyz": { "gamma": { "named": "srgb" }, "to_xyz_d50": { "rows": [...] } } },
//!   "dst": { "gamma": { "named": "linear" }, "to_xyz_d50": { "rows": [...] } },
//!   "alpha": "premul"
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::rc::Rc;

use anyhow::Context as _;
use kurbo::Point;
use serde::de::DeserializeOwned;

use crate::color::space::{A2BColorSpace, XyzColorSpace};
use crate::color::xform::{AlphaType, ColorSpaceXform};
use crate::foundation::core::Color;
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::raster::blend::BlendMode;
use crate::raster::paint::{
    ColorShader, LinearGradientShader, LumaColorFilter, MatrixColorFilter, Paint,
};

fn from_reader<T: DeserializeOwned>(r: impl Read, what: &str) -> PipelineResult<T> {
    serde_json::from_reader(r).map_err(|e| PipelineError::serde(format!("parse {what} JSON: {e}")))
}

fn from_path<T: DeserializeOwned>(path: &Path, what: &str) -> PipelineResult<T> {
    let f = File::open(path).with_context(|| format!("open {what} JSON '{}'", path.display()))?;
    from_reader(BufReader::new(f), what)
}

/// Source side of a transform.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSpace {
    /// An explicit element list.
    A2b(A2BColorSpace),
    /// Curves plus primaries.
    Xyz(XyzColorSpace),
}

impl SourceSpace {
    /// The element-list form.
    pub fn to_a2b(&self) -> A2BColorSpace {
        match self {
            Self::A2b(space) => space.clone(),
            Self::Xyz(space) => A2BColorSpace::from(space),
        }
    }
}

/// A color transform between two spaces.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct XformConfig {
    /// Space the input pixels are in.
    pub src: SourceSpace,
    /// Space the output pixels are in.
    pub dst: XyzColorSpace,
    /// How input alpha is treated.
    #[serde(default)]
    pub alpha: AlphaType,
}

impl XformConfig {
    /// Parse from a JSON reader.
    pub fn from_reader<R: Read>(r: R) -> PipelineResult<Self> {
        from_reader(r, "color transform")
    }

    /// Parse from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        from_path(path.as_ref(), "color transform")
    }

    /// Build the transform.
    pub fn build(&self) -> PipelineResult<ColorSpaceXform> {
        ColorSpaceXform::new(&self.src.to_a2b(), &self.dst)
    }

    /// Check that the transform can be built.
    pub fn validate(&self) -> PipelineResult<()> {
        self.build().map(drop)
    }
}

/// Shader half of a [`PaintConfig`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShaderConfig {
    /// [`ColorShader`].
    Color {
        /// Shaded color.
        color: Color,
    },
    /// [`LinearGradientShader`].
    LinearGradient {
        /// Where `colors[0]` applies.
        start: Point,
        /// Where `colors[1]` applies.
        end: Point,
        /// End colors.
        colors: [Color; 2],
    },
}

/// Color filter half of a [`PaintConfig`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorFilterConfig {
    /// [`MatrixColorFilter`] from 20 row-major coefficients.
    Matrix {
        /// Coefficients.
        matrix: Vec<f32>,
    },
    /// [`LumaColorFilter`].
    Luma,
}

/// A paint for the blitter.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PaintConfig {
    /// Straight-alpha linear color.
    pub color: Color,
    /// Compositing mode.
    #[serde(default)]
    pub blend: BlendMode,
    /// Optional shader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shader: Option<ShaderConfig>,
    /// Optional color filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_filter: Option<ColorFilterConfig>,
}

impl PaintConfig {
    /// Parse from a JSON reader.
    pub fn from_reader<R: Read>(r: R) -> PipelineResult<Self> {
        from_reader(r, "paint")
    }

    /// Parse from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        from_path(path.as_ref(), "paint")
    }

    /// Reject colors outside [0, 1], unsupported blend modes and malformed filter matrices.
    pub fn validate(&self) -> PipelineResult<()> {
        self.color.validate()?;
        if !self.blend.is_supported() {
            return Err(PipelineError::unsupported(format!(
                "blend mode {:?}",
                self.blend
            )));
        }
        match &self.shader {
            Some(ShaderConfig::Color { color }) => color.validate()?,
            Some(ShaderConfig::LinearGradient { start, end, colors }) => {
                for c in colors {
                    c.validate()?;
                }
                if !(start.is_finite() && end.is_finite()) || start == end {
                    return Err(PipelineError::validation(
                        "gradient needs distinct finite end points",
                    ));
                }
            }
            None => {}
        }
        if let Some(ColorFilterConfig::Matrix { matrix }) = &self.color_filter {
            if matrix.len() != 20 {
                return Err(PipelineError::validation(format!(
                    "color matrix needs 20 coefficients, got {}",
                    matrix.len()
                )));
            }
            if !matrix.iter().all(|v| v.is_finite()) {
                return Err(PipelineError::validation(
                    "color matrix has non-finite coefficients",
                ));
            }
        }
        Ok(())
    }

    /// Validate and build the paint.
    pub fn to_paint(&self) -> PipelineResult<Paint> {
        self.validate()?;
        let mut paint = Paint::from_color(self.color).with_blend_mode(self.blend);
        match &self.shader {
            Some(ShaderConfig::Color { color }) => {
                paint = paint.with_shader(Rc::new(ColorShader::new(*color)));
            }
            Some(ShaderConfig::LinearGradient { start, end, colors }) => {
                paint = paint.with_shader(Rc::new(LinearGradientShader::new(*start, *end, *colors)));
            }
            None => {}
        }
        match &self.color_filter {
            Some(ColorFilterConfig::Matrix { matrix }) => {
                let filter = MatrixColorFilter::from_slice(matrix)
                    .ok_or_else(|| PipelineError::validation("color matrix shape"))?;
                paint = paint.with_color_filter(Rc::new(filter));
            }
            Some(ColorFilterConfig::Luma) => {
                paint = paint.with_color_filter(Rc::new(LumaColorFilter));
            }
            None => {}
        }
        Ok(paint)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
