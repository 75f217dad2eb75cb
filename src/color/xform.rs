use std::rc::Rc;

use crate::color::lut::ColorLut;
use crate::color::matrix::Matrix3x4;
use crate::color::space::{A2BColorSpace, A2BElement, ColorGamma, Gamma, Gammas, Pcs, XyzColorSpace};
use crate::color::transfer::{GammaNamed, TransferFn, build_inverse_table, validate_table};
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::pipeline::builder::{MAX_STAGES, Pipeline};
use crate::pipeline::stage::{MemoryCtx, StageCtx, StageKind};

/// Memory layout of the pixels handed to [`ColorSpaceXform::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorFormat {
    /// 8-bit channels in R, G, B, A order.
    Rgba8888,
    /// 8-bit channels in B, G, R, A order.
    Bgra8888,
    /// Little-endian half floats in R, G, B, A order.
    RgbaF16,
    /// Little-endian floats in R, G, B, A order.
    RgbaF32,
}

impl ColorFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8888 | Self::Bgra8888 => 4,
            Self::RgbaF16 => 8,
            Self::RgbaF32 => 16,
        }
    }
}

/// How alpha relates to the color channels of the source pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaType {
    /// Alpha is one everywhere.
    Opaque,
    /// Output color is multiplied by alpha after source decoding.
    Premul,
    /// Color and alpha are independent.
    #[default]
    Unpremul,
}

/// Widest load/store framing `apply` wraps around the element stages:
/// load, swap_rb, premul, swap_rb, store.
const FRAMING_STAGES: usize = 5;

/// Channels a transfer stage applies to.
#[derive(Clone, Copy, Debug)]
enum Channels {
    Rgb,
    One(usize),
}

impl Channels {
    fn parametric(self) -> &'static [StageKind] {
        static ALL: [StageKind; 3] = [
            StageKind::ParametricR,
            StageKind::ParametricG,
            StageKind::ParametricB,
        ];
        match self {
            Self::Rgb => &ALL,
            Self::One(i) => std::slice::from_ref(&ALL[i]),
        }
    }

    fn table(self) -> &'static [StageKind] {
        static ALL: [StageKind; 3] = [StageKind::TableR, StageKind::TableG, StageKind::TableB];
        match self {
            Self::Rgb => &ALL,
            Self::One(i) => std::slice::from_ref(&ALL[i]),
        }
    }
}

/// Accumulates element stages, refusing any that would leave no room for framing.
#[derive(Default)]
struct ElementStages {
    pipeline: Pipeline,
    committed: usize,
}

impl ElementStages {
    fn append(&mut self, kind: StageKind, ctx: impl Into<StageCtx>) -> PipelineResult<()> {
        if self.committed + self.pipeline.len() + FRAMING_STAGES >= MAX_STAGES {
            return Err(PipelineError::unsupported(format!(
                "color transform needs more than {MAX_STAGES} stages"
            )));
        }
        self.pipeline.append(kind, ctx);
        Ok(())
    }

    fn push(&mut self, kind: StageKind) -> PipelineResult<()> {
        self.append(kind, StageCtx::None)
    }

    fn clamps(&mut self) -> PipelineResult<()> {
        self.push(StageKind::Clamp0)?;
        self.push(StageKind::Clamp1)
    }

    fn transfer_fn(&mut self, f: TransferFn, channels: Channels) -> PipelineResult<()> {
        f.validate()?;
        let f = Rc::new(f);
        for &kind in channels.parametric() {
            self.append(kind, f.clone())?;
        }
        Ok(())
    }

    fn table(&mut self, table: &[f32], channels: Channels) -> PipelineResult<()> {
        validate_table(table)?;
        let table: Rc<[f32]> = table.into();
        for &kind in channels.table() {
            self.append(kind, table.clone())?;
        }
        Ok(())
    }

    fn matrix(&mut self, m: &Matrix3x4) -> PipelineResult<()> {
        m.validate()?;
        self.append(StageKind::Matrix3x4, Rc::new(m.to_column_major()))?;
        self.clamps()
    }

    fn clut(&mut self, lut: &ColorLut) -> PipelineResult<()> {
        lut.validate()?;
        self.append(StageKind::ColorLookupTable, Rc::new(lut.clone()))
    }

    /// Close the current phase; its stages keep counting against the budget.
    fn finish_phase(&mut self) -> Pipeline {
        let pipeline = std::mem::take(&mut self.pipeline);
        self.committed += pipeline.len();
        pipeline
    }
}

/// Converts pixels from an A2B source color space to an XYZ-based destination.
///
/// The element stages are assembled once in [`ColorSpaceXform::new`]; each
/// [`apply`](ColorSpaceXform::apply) frames them with the loads and stores for its formats.
#[derive(Clone, Debug)]
pub struct ColorSpaceXform {
    src_to_pcs: Pipeline,
    pcs_to_dst: Pipeline,
    linear_dst: bool,
}

impl ColorSpaceXform {
    /// Build the transform, or report the first element no stage can express.
    #[tracing::instrument(skip_all, fields(elements = src.elements.len(), pcs = ?src.pcs))]
    pub fn new(src: &A2BColorSpace, dst: &XyzColorSpace) -> PipelineResult<Self> {
        let mut stages = ElementStages::default();

        for element in &src.elements {
            add_source_element(&mut stages, element)?;
        }
        if src.pcs == Pcs::Lab {
            tracing::debug!("lab to xyz");
            stages.push(StageKind::LabToXyz)?;
        }
        let src_to_pcs = stages.finish_phase();

        let from_xyz = dst.from_xyz_d50()?;
        if !from_xyz.is_identity() {
            tracing::debug!("destination matrix");
            stages.matrix(&from_xyz)?;
        }
        add_destination_gamma(&mut stages, &dst.gamma)?;
        let pcs_to_dst = stages.finish_phase();

        tracing::debug!(
            source_stages = src_to_pcs.len(),
            destination_stages = pcs_to_dst.len(),
            "color transform built"
        );
        Ok(Self {
            src_to_pcs,
            pcs_to_dst,
            linear_dst: dst.is_linear(),
        })
    }

    /// Stages converting the source to the connection space.
    pub fn source_stages(&self) -> &Pipeline {
        &self.src_to_pcs
    }

    /// Stages converting the connection space to the destination.
    pub fn destination_stages(&self) -> &Pipeline {
        &self.pcs_to_dst
    }

    /// Convert `count` pixels from `src` into `dst`.
    ///
    /// Nothing is written unless the whole conversion is supported and both buffers hold
    /// `count` pixels.
    pub fn apply(
        &self,
        dst_format: ColorFormat,
        dst: &mut [u8],
        src_format: ColorFormat,
        src: &[u8],
        count: usize,
        alpha_type: AlphaType,
    ) -> PipelineResult<()> {
        let src_len = byte_len(count, src_format)?;
        let dst_len = byte_len(count, dst_format)?;
        if src.len() < src_len {
            return Err(PipelineError::validation(format!(
                "source holds {} bytes, {count} {src_format:?} pixels need {src_len}",
                src.len()
            )));
        }
        if dst.len() < dst_len {
            return Err(PipelineError::validation(format!(
                "destination holds {} bytes, {count} {dst_format:?} pixels need {dst_len}",
                dst.len()
            )));
        }

        let input = Rc::new(MemoryCtx::new(src[..src_len].to_vec()));
        let output = Rc::new(MemoryCtx::zeroed(dst_len));
        let mut pipeline = Pipeline::new();

        match src_format {
            ColorFormat::Rgba8888 => pipeline.append(StageKind::LoadS8888, input),
            ColorFormat::Bgra8888 => {
                pipeline.append(StageKind::LoadS8888, input);
                pipeline.push(StageKind::SwapRb);
            }
            ColorFormat::RgbaF16 | ColorFormat::RgbaF32 => {
                return Err(PipelineError::unsupported(format!(
                    "{src_format:?} is not a supported source format"
                )));
            }
        }

        pipeline.extend(&self.src_to_pcs);
        if alpha_type == AlphaType::Premul {
            pipeline.push(StageKind::Premul);
        }
        pipeline.extend(&self.pcs_to_dst);

        match dst_format {
            ColorFormat::Rgba8888 => pipeline.append(StageKind::Store8888, output.clone()),
            ColorFormat::Bgra8888 => {
                pipeline.push(StageKind::SwapRb);
                pipeline.append(StageKind::Store8888, output.clone());
            }
            ColorFormat::RgbaF16 | ColorFormat::RgbaF32 if !self.linear_dst => {
                return Err(PipelineError::unsupported(format!(
                    "{dst_format:?} output requires a linear destination"
                )));
            }
            ColorFormat::RgbaF16 => pipeline.append(StageKind::StoreF16, output.clone()),
            ColorFormat::RgbaF32 => pipeline.append(StageKind::StoreF32, output.clone()),
        }

        pipeline.compile().run(0, 0, count);
        dst[..dst_len].copy_from_slice(&output.bytes());
        Ok(())
    }
}

fn byte_len(count: usize, format: ColorFormat) -> PipelineResult<usize> {
    count
        .checked_mul(format.bytes_per_pixel())
        .ok_or_else(|| PipelineError::validation(format!("{count} pixels overflow a buffer")))
}

fn add_source_element(stages: &mut ElementStages, element: &A2BElement) -> PipelineResult<()> {
    match element {
        A2BElement::GammaNamed(named) => {
            if *named != GammaNamed::Linear {
                tracing::debug!(?named, "source curve");
                stages.transfer_fn(named.transfer_fn(), Channels::Rgb)?;
                stages.clamps()?;
            }
        }
        A2BElement::Gammas(gammas) => {
            tracing::debug!("per-channel source curves");
            add_gammas(stages, gammas, |g| g.transfer_fn(), |t| t.to_vec())?;
            stages.clamps()?;
        }
        A2BElement::Clut(lut) => {
            tracing::debug!(grid = ?lut.grid_points(), "color lookup table");
            stages.clut(lut)?;
        }
        A2BElement::Matrix(m) => {
            if !m.is_identity() {
                tracing::debug!("source matrix");
                stages.matrix(m)?;
            }
        }
    }
    Ok(())
}

fn add_destination_gamma(stages: &mut ElementStages, gamma: &ColorGamma) -> PipelineResult<()> {
    match gamma {
        ColorGamma::Named(GammaNamed::Linear) => {}
        ColorGamma::Named(named) => {
            tracing::debug!(?named, "destination curve");
            stages.transfer_fn(named.transfer_fn().invert(), Channels::Rgb)?;
            stages.clamps()?;
        }
        ColorGamma::PerChannel(gammas) => {
            tracing::debug!("per-channel destination curves");
            add_gammas(
                stages,
                gammas,
                |g| g.transfer_fn().map(|f| f.invert()),
                build_inverse_table,
            )?;
            stages.clamps()?;
        }
    }
    Ok(())
}

/// One parametric or table stage per channel.
fn add_gammas(
    stages: &mut ElementStages,
    gammas: &Gammas,
    parametric: impl Fn(&Gamma) -> Option<TransferFn>,
    table: impl Fn(&[f32]) -> Vec<f32>,
) -> PipelineResult<()> {
    for (channel, gamma) in gammas.channels().into_iter().enumerate() {
        gamma.validate()?;
        match gamma {
            Gamma::Table(samples) => {
                stages.table(&table(samples), Channels::One(channel))?;
            }
            other => {
                let f = parametric(other).ok_or_else(|| {
                    PipelineError::unsupported(format!("channel {channel} has no parametric form"))
                })?;
                stages.transfer_fn(f, Channels::One(channel))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/color/xform.rs"]
mod tests;
