use std::cell::{Cell, OnceCell};
use std::rc::Rc;

use kurbo::Affine;

use crate::foundation::core::{IntRect, PremulColor};
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::pipeline::builder::{MAX_STAGES, Pipeline};
use crate::pipeline::engine::CompiledPipeline;
use crate::pipeline::stage::{MemoryCtx, StageKind};
use crate::raster::blend::BlendMode;
use crate::raster::paint::Paint;
use crate::raster::pixmap::{ColorType, Mask, MaskFormat, Pixmap, decode_f32_pixel};

/// Most stages a blit adds after the shader: coverage, load, blend, clamp, store.
const BLIT_STAGES: usize = 5;

/// Draws spans, coverage runs and masks of one paint into a pixmap.
///
/// Each operation shape compiles its pipeline on first use; later calls only rebind the
/// destination row, the mask row and the constant coverage. Spans are clipped to the pixmap.
#[derive(Debug)]
pub struct RasterPipelineBlitter {
    /// The destination's shape; its pixels live in `dst` until `finish`.
    target: Pixmap,
    dst: Rc<MemoryCtx>,
    mask: Rc<MemoryCtx>,
    coverage: Rc<Cell<f32>>,
    blend: BlendMode,
    shader: Pipeline,
    blit_h: OnceCell<CompiledPipeline>,
    blit_anti_h: OnceCell<CompiledPipeline>,
    blit_a8: OnceCell<CompiledPipeline>,
    blit_lcd16: OnceCell<CompiledPipeline>,
}

impl RasterPipelineBlitter {
    /// Blitter drawing `paint` into `dst`, with `ctm` mapping shader space to device space.
    ///
    /// Fails with [`PipelineError::Unsupported`] for destinations other than sRGB `Rgba8888`,
    /// `RgbaF16` and `Rgb565`, for non-separable blend modes, and when the shader or color
    /// filter cannot be expressed as stages.
    #[tracing::instrument(skip_all, fields(
        width = dst.width(),
        height = dst.height(),
        color_type = ?dst.color_type(),
        blend = ?paint.blend_mode,
    ))]
    pub fn new(mut dst: Pixmap, paint: &Paint, ctm: Affine) -> PipelineResult<Self> {
        let supported = match dst.color_type() {
            ColorType::Rgba8888 => dst.is_srgb(),
            ColorType::RgbaF16 | ColorType::Rgb565 => true,
            _ => false,
        };
        if !supported {
            return Err(PipelineError::unsupported(format!(
                "blitting into {:?} (srgb: {})",
                dst.color_type(),
                dst.is_srgb()
            )));
        }
        let mut blend = paint.blend_mode;
        if !blend.is_supported() {
            return Err(PipelineError::unsupported(format!("blend mode {blend:?}")));
        }

        let paint_color = Rc::new(Cell::new(paint.color.premultiply()));
        let mut shader = Pipeline::new();
        let mut is_opaque = paint_color.get().is_opaque();
        let mut is_constant = true;
        shader.append(StageKind::ConstantColor, paint_color.clone());

        if let Some(s) = &paint.shader {
            shader.push(StageKind::SwapSrcDst);
            if !s.append_stages(&mut shader, &ctm) {
                return Err(PipelineError::unsupported(format!("shader {s:?}")));
            }
            shader.push(StageKind::SrcIn);
            is_opaque = is_opaque && s.is_opaque();
            is_constant = s.is_constant();
        }
        if let Some(filter) = &paint.color_filter {
            if !filter.append_stages(&mut shader, is_opaque) {
                return Err(PipelineError::unsupported(format!("color filter {filter:?}")));
            }
            is_opaque = is_opaque && filter.alpha_unchanged();
        }
        if shader.len() + BLIT_STAGES > MAX_STAGES {
            return Err(PipelineError::unsupported(format!(
                "paint needs {} stages, at most {} fit",
                shader.len(),
                MAX_STAGES - BLIT_STAGES
            )));
        }

        if is_constant {
            let color = evaluate_constant(&shader);
            tracing::debug!(?color, "constant paint");
            paint_color.set(color);
            shader = Pipeline::new();
            shader.append(StageKind::ConstantColor, paint_color);
            is_opaque = color.is_opaque();
        }
        if is_opaque && blend == BlendMode::SrcOver {
            blend = BlendMode::Src;
        }
        tracing::debug!(stages = shader.len(), ?blend, is_opaque, "blitter ready");

        let pixels = dst.replace_data(Vec::new());
        Ok(Self {
            target: dst,
            dst: Rc::new(MemoryCtx::new(pixels)),
            mask: Rc::new(MemoryCtx::default()),
            coverage: Rc::new(Cell::new(1.0)),
            blend,
            shader,
            blit_h: OnceCell::new(),
            blit_anti_h: OnceCell::new(),
            blit_a8: OnceCell::new(),
            blit_lcd16: OnceCell::new(),
        })
    }

    /// Blend mode the pipelines use; `SrcOver` with an opaque paint becomes `Src`.
    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    /// Stages producing the paint color, shared by every operation.
    pub fn shader_stages(&self) -> &Pipeline {
        &self.shader
    }

    /// Fully cover `w` pixels of row `y` starting at `x`.
    pub fn blit_h(&self, x: i32, y: i32, w: u32) {
        let Some((x, y, n)) = self.clip_span(x, y, w) else {
            return;
        };
        let pipeline = self.blit_h.get_or_init(|| {
            let mut p = Pipeline::new();
            p.extend(&self.shader);
            if self.blend != BlendMode::Src {
                self.append_load_dst(&mut p);
                self.append_blend(&mut p);
                self.append_clamp_if_overflow(&mut p);
            }
            self.append_store(&mut p);
            p.compile()
        });
        self.bind_dst_row(y);
        pipeline.run(x, y, n);
    }

    /// Fully cover a `w` x `h` rectangle.
    pub fn blit_rect(&self, x: i32, y: i32, w: u32, h: u32) {
        for row in 0..h {
            let Some(y) = i32::try_from(row).ok().and_then(|r| y.checked_add(r)) else {
                return;
            };
            self.blit_h(x, y, w);
        }
    }

    /// Cover row `y` from `x` onward with run-length coverage: `aa[i]` applies to the next
    /// `runs[i]` pixels. A zero run or the end of either slice terminates.
    pub fn blit_anti_h(&self, x: i32, y: i32, aa: &[u8], runs: &[u16]) {
        let pipeline = self.blit_anti_h.get_or_init(|| {
            let mut p = Pipeline::new();
            p.extend(&self.shader);
            if self.blend == BlendMode::SrcOver {
                p.append(StageKind::ScaleConstantFloat, self.coverage.clone());
                self.append_load_dst(&mut p);
                self.append_blend(&mut p);
            } else {
                self.append_load_dst(&mut p);
                self.append_blend(&mut p);
                p.append(StageKind::LerpConstantFloat, self.coverage.clone());
            }
            self.append_clamp_if_overflow(&mut p);
            self.append_store(&mut p);
            p.compile()
        });

        let mut x = i64::from(x);
        for (&coverage, &run) in aa.iter().zip(runs) {
            if run == 0 {
                break;
            }
            let start = x;
            x += i64::from(run);
            let Ok(start) = i32::try_from(start) else {
                return;
            };
            match coverage {
                0 => {}
                0xff => self.blit_h(start, y, u32::from(run)),
                _ => {
                    let Some((sx, sy, n)) = self.clip_span(start, y, u32::from(run)) else {
                        continue;
                    };
                    self.coverage.set(f32::from(coverage) * (1.0 / 255.0));
                    self.bind_dst_row(sy);
                    pipeline.run(sx, sy, n);
                }
            }
        }
    }

    /// Draw the part of `mask` inside `clip`.
    pub fn blit_mask(&self, mask: &Mask, clip: IntRect) {
        let Some(rect) = clip
            .intersect(&mask.bounds())
            .and_then(|r| r.intersect(&self.target.bounds()))
        else {
            return;
        };

        if mask.format() == MaskFormat::Bw {
            self.blit_bw_mask(mask, rect);
            return;
        }

        let pipeline = match mask.format() {
            MaskFormat::A8 => self.a8_pipeline(),
            MaskFormat::Lcd16 => self.lcd16_pipeline(),
            MaskFormat::Bw => return,
        };
        let bpp: isize = match mask.format() {
            MaskFormat::Lcd16 => 2,
            _ => 1,
        };

        self.mask.replace(mask.image().to_vec());
        let bounds = mask.bounds();
        let mask_row_bytes = mask.row_bytes() as isize;
        let columns = (rect.left - bounds.left) as usize * bpp as usize
            ..(rect.right - bounds.left) as usize * bpp as usize;
        for y in rect.top..rect.bottom {
            let row = (y - bounds.top) as isize * mask_row_bytes;
            // An uncovered row would only store back what it loads.
            let coverage = &mask.image()[row as usize..][columns.clone()];
            if coverage.iter().all(|&c| c == 0) {
                continue;
            }
            self.mask.set_origin(row - bounds.left as isize * bpp);
            self.bind_dst_row(y as usize);
            pipeline.run(rect.left as usize, y as usize, rect.width() as usize);
        }
        self.mask.take();
    }

    /// Release the destination.
    pub fn finish(mut self) -> Pixmap {
        self.target.replace_data(self.dst.take());
        self.target
    }

    fn blit_bw_mask(&self, mask: &Mask, rect: IntRect) {
        let bounds = mask.bounds();
        let image = mask.image();
        let bit = |x: i32, y: i32| {
            let col = (x - bounds.left) as usize;
            let row = (y - bounds.top) as usize * mask.row_bytes();
            image[row + col / 8] & (0x80 >> (col % 8)) != 0
        };
        for y in rect.top..rect.bottom {
            let mut x = rect.left;
            while x < rect.right {
                if !bit(x, y) {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < rect.right && bit(x, y) {
                    x += 1;
                }
                self.blit_h(start, y, (x - start) as u32);
            }
        }
    }

    fn a8_pipeline(&self) -> &CompiledPipeline {
        self.blit_a8.get_or_init(|| {
            let mut p = Pipeline::new();
            p.extend(&self.shader);
            if self.blend == BlendMode::SrcOver {
                p.append(StageKind::ScaleU8, self.mask.clone());
                self.append_load_dst(&mut p);
                self.append_blend(&mut p);
            } else {
                self.append_load_dst(&mut p);
                self.append_blend(&mut p);
                p.append(StageKind::LerpU8, self.mask.clone());
            }
            self.append_clamp_if_overflow(&mut p);
            self.append_store(&mut p);
            p.compile()
        })
    }

    fn lcd16_pipeline(&self) -> &CompiledPipeline {
        self.blit_lcd16.get_or_init(|| {
            let mut p = Pipeline::new();
            p.extend(&self.shader);
            self.append_load_dst(&mut p);
            self.append_blend(&mut p);
            p.append(StageKind::Lerp565, self.mask.clone());
            self.append_clamp_if_overflow(&mut p);
            self.append_store(&mut p);
            p.compile()
        })
    }

    /// Clip a span to the pixmap, returning pixel coordinates and length.
    fn clip_span(&self, x: i32, y: i32, w: u32) -> Option<(usize, usize, usize)> {
        if y < 0 || y as u32 >= self.target.height() {
            return None;
        }
        let end = (i64::from(x) + i64::from(w)).min(i64::from(self.target.width()));
        let start = i64::from(x).max(0);
        (start < end).then(|| (start as usize, y as usize, (end - start) as usize))
    }

    fn bind_dst_row(&self, y: usize) {
        self.dst.set_origin((y * self.target.row_bytes()) as isize);
    }

    fn dst_stages(&self) -> (StageKind, StageKind) {
        match self.target.color_type() {
            ColorType::RgbaF16 => (StageKind::LoadDF16, StageKind::StoreF16),
            ColorType::Rgb565 => (StageKind::LoadD565, StageKind::Store565),
            _ => (StageKind::LoadDSrgb, StageKind::StoreSrgb),
        }
    }

    fn append_load_dst(&self, p: &mut Pipeline) {
        p.append(self.dst_stages().0, self.dst.clone());
    }

    fn append_store(&self, p: &mut Pipeline) {
        p.append(self.dst_stages().1, self.dst.clone());
    }

    fn append_blend(&self, p: &mut Pipeline) {
        let appended = self.blend.append_stages(p);
        debug_assert!(appended, "blend mode checked at construction");
    }

    fn append_clamp_if_overflow(&self, p: &mut Pipeline) {
        if self.blend.can_overflow() {
            p.push(StageKind::ClampA);
        }
    }
}

/// Run a constant shader pipeline once and read back its color.
fn evaluate_constant(shader: &Pipeline) -> PremulColor {
    let out = Rc::new(MemoryCtx::zeroed(16));
    let mut p = Pipeline::new();
    p.extend(shader);
    p.append(StageKind::StoreF32, out.clone());
    p.compile().run(0, 0, 1);
    decode_f32_pixel(&out.bytes())
}

#[cfg(test)]
#[path = "../../tests/unit/raster/blitter.rs"]
mod tests;
