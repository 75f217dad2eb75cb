//! A runtime-composable raster pixel pipeline.
//!
//! Consumers assemble a bounded sequence of fixed-function stages, compile it once and run it
//! over pixel spans:
//!
//! - Build a [`Pipeline`] from [`StageKind`]s and their [`StageCtx`]s
//! - [`Pipeline::compile`] it into a [`CompiledPipeline`]
//! - Call [`CompiledPipeline::run`] per span, rebinding context cells between calls
//!
//! Two consumers ship with the crate: [`RasterPipelineBlitter`] draws a [`Paint`] into a
//! [`Pixmap`], and [`ColorSpaceXform`] converts pixels between color spaces.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod color;
mod config;
mod foundation;
mod pipeline;
mod raster;

pub use crate::foundation::core::{Color, IntRect, PremulColor};
pub use crate::foundation::error::{PipelineError, PipelineResult};

pub use crate::pipeline::builder::{MAX_STAGES, Pipeline, Stage};
pub use crate::pipeline::engine::{CompiledPipeline, STAGE_WIDTH};
pub use crate::pipeline::stage::{ContextKind, MemoryCtx, StageCtx, StageKind};

pub use crate::color::lut::ColorLut;
pub use crate::color::matrix::Matrix3x4;
pub use crate::color::space::{
    A2BColorSpace, A2BElement, ColorGamma, Gamma, Gammas, Pcs, XyzColorSpace,
};
pub use crate::color::transfer::{
    GammaNamed, INVERSE_TABLE_SIZE, TransferFn, build_inverse_table,
};
pub use crate::color::xform::{AlphaType, ColorFormat, ColorSpaceXform};

pub use crate::raster::blend::BlendMode;
pub use crate::raster::blitter::RasterPipelineBlitter;
pub use crate::raster::paint::{
    ColorFilter, ColorShader, LinearGradientShader, LumaColorFilter, MatrixColorFilter, Paint,
    Shader,
};
pub use crate::raster::pixmap::{ColorType, Mask, MaskFormat, Pixmap};

pub use crate::config::{ColorFilterConfig, PaintConfig, ShaderConfig, SourceSpace, XformConfig};

pub use kurbo::{Affine, Point};
