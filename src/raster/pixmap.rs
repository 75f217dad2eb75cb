use std::cell::Cell;
use std::rc::Rc;

use crate::foundation::core::{Color, IntRect, PremulColor};
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::pipeline::builder::Pipeline;
use crate::pipeline::stage::{MemoryCtx, StageKind};

/// Pixel layout of a [`Pixmap`]. Color is stored premultiplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorType {
    /// 8-bit R, G, B, A.
    Rgba8888,
    /// 8-bit B, G, R, A.
    Bgra8888,
    /// Little-endian 16-bit 5-6-5, opaque.
    Rgb565,
    /// Little-endian half-float R, G, B, A.
    RgbaF16,
    /// Little-endian float R, G, B, A.
    RgbaF32,
}

impl ColorType {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb565 => 2,
            Self::Rgba8888 | Self::Bgra8888 => 4,
            Self::RgbaF16 => 8,
            Self::RgbaF32 => 16,
        }
    }

    /// Load into the working registers, store from them, and whether red and blue swap.
    fn source_stages(self, srgb: bool) -> (StageKind, StageKind, bool) {
        match (self, srgb) {
            (Self::Rgba8888, true) => (StageKind::LoadSSrgb, StageKind::StoreSrgb, false),
            (Self::Rgba8888, false) => (StageKind::LoadS8888, StageKind::Store8888, false),
            (Self::Bgra8888, true) => (StageKind::LoadSSrgb, StageKind::StoreSrgb, true),
            (Self::Bgra8888, false) => (StageKind::LoadS8888, StageKind::Store8888, true),
            (Self::Rgb565, _) => (StageKind::LoadS565, StageKind::Store565, false),
            (Self::RgbaF16, _) => (StageKind::LoadSF16, StageKind::StoreF16, false),
            (Self::RgbaF32, _) => (StageKind::LoadSF32, StageKind::StoreF32, false),
        }
    }
}

fn checked_dims(width: u32, height: u32, color_type: ColorType) -> PipelineResult<(usize, usize)> {
    if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
        return Err(PipelineError::validation(format!(
            "pixmap {width}x{height} exceeds the addressable size"
        )));
    }
    let row_bytes = (width as usize)
        .checked_mul(color_type.bytes_per_pixel())
        .ok_or_else(|| PipelineError::validation("pixmap row size overflows"))?;
    let len = row_bytes
        .checked_mul(height as usize)
        .ok_or_else(|| PipelineError::validation("pixmap size overflows"))?;
    Ok((row_bytes, len))
}

/// Owned, tightly packed pixel buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    color_type: ColorType,
    srgb: bool,
    data: Vec<u8>,
}

impl Pixmap {
    /// Zero-filled (transparent) pixmap. `srgb` tags 8-bit data as sRGB-encoded.
    pub fn new(width: u32, height: u32, color_type: ColorType, srgb: bool) -> PipelineResult<Self> {
        let (_, len) = checked_dims(width, height, color_type)?;
        Ok(Self {
            width,
            height,
            color_type,
            srgb,
            data: vec![0; len],
        })
    }

    /// Wrap existing pixels; `data` must be exactly `width * height` pixels long.
    pub fn from_vec(
        width: u32,
        height: u32,
        color_type: ColorType,
        srgb: bool,
        data: Vec<u8>,
    ) -> PipelineResult<Self> {
        let (_, len) = checked_dims(width, height, color_type)?;
        if data.len() != len {
            return Err(PipelineError::validation(format!(
                "pixmap {width}x{height} {color_type:?} needs {len} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            color_type,
            srgb,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout.
    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    /// Whether 8-bit color is sRGB-encoded.
    pub fn is_srgb(&self) -> bool {
        self.srgb
    }

    /// Bytes per row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.color_type.bytes_per_pixel()
    }

    /// `(0, 0, width, height)`.
    pub fn bounds(&self) -> IntRect {
        IntRect {
            left: 0,
            top: 0,
            right: self.width as i32,
            bottom: self.height as i32,
        }
    }

    /// Raw pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Give up the pixel bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Swap the pixel bytes; the caller keeps the length consistent with the dimensions.
    pub(crate) fn replace_data(&mut self, data: Vec<u8>) -> Vec<u8> {
        std::mem::replace(&mut self.data, data)
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        let (_, store, swap_rb) = self.color_type.source_stages(self.srgb);
        let memory = Rc::new(MemoryCtx::new(std::mem::take(&mut self.data)));

        let mut p = Pipeline::new();
        p.append(
            StageKind::ConstantColor,
            Rc::new(Cell::new(color.premultiply())),
        );
        if swap_rb {
            p.push(StageKind::SwapRb);
        }
        p.append(store, memory.clone());

        let fill = p.compile();
        let row_bytes = self.row_bytes();
        for y in 0..self.height as usize {
            memory.set_origin((y * row_bytes) as isize);
            fill.run(0, y, self.width as usize);
        }
        self.data = memory.take();
    }

    /// Decode one pixel, `None` outside the bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.color_type.bytes_per_pixel();
        let start = y as usize * self.row_bytes() + x as usize * bpp;
        let (load, _, swap_rb) = self.color_type.source_stages(self.srgb);

        let input = Rc::new(MemoryCtx::new(self.data[start..start + bpp].to_vec()));
        let output = Rc::new(MemoryCtx::zeroed(16));
        let mut p = Pipeline::new();
        p.append(load, input);
        if swap_rb {
            p.push(StageKind::SwapRb);
        }
        p.append(StageKind::StoreF32, output.clone());
        p.compile().run(0, 0, 1);

        Some(decode_f32_pixel(&output.bytes()))
    }
}

/// Read one little-endian `f32` RGBA pixel.
pub(crate) fn decode_f32_pixel(bytes: &[u8]) -> PremulColor {
    PremulColor::from_array(std::array::from_fn(|i| {
        f32::from_le_bytes([
            bytes[4 * i],
            bytes[4 * i + 1],
            bytes[4 * i + 2],
            bytes[4 * i + 3],
        ])
    }))
}

/// Coverage mask encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskFormat {
    /// One bit per pixel, most significant bit first.
    Bw,
    /// One byte of coverage per pixel.
    A8,
    /// Little-endian 5-6-5 per-channel coverage.
    Lcd16,
}

impl MaskFormat {
    /// Minimum bytes per row for `width` pixels.
    pub fn min_row_bytes(self, width: u32) -> usize {
        let width = width as usize;
        match self {
            Self::Bw => width.div_ceil(8),
            Self::A8 => width,
            Self::Lcd16 => width.saturating_mul(2),
        }
    }
}

fn mask_len(row_bytes: usize, bounds: IntRect) -> PipelineResult<usize> {
    row_bytes
        .checked_mul(bounds.height() as usize)
        .ok_or_else(|| PipelineError::validation("mask size overflows"))
}

/// Coverage image positioned in device space.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    format: MaskFormat,
    bounds: IntRect,
    row_bytes: usize,
    image: Vec<u8>,
}

impl Mask {
    /// Zero-coverage mask with tightly packed rows.
    pub fn new(format: MaskFormat, bounds: IntRect) -> PipelineResult<Self> {
        let row_bytes = format.min_row_bytes(bounds.width());
        let len = mask_len(row_bytes, bounds)?;
        Ok(Self {
            format,
            bounds,
            row_bytes,
            image: vec![0; len],
        })
    }

    /// Wrap an existing image.
    pub fn from_vec(
        format: MaskFormat,
        bounds: IntRect,
        row_bytes: usize,
        image: Vec<u8>,
    ) -> PipelineResult<Self> {
        let min = format.min_row_bytes(bounds.width());
        if row_bytes < min {
            return Err(PipelineError::validation(format!(
                "mask rows need at least {min} bytes, got {row_bytes}"
            )));
        }
        let len = mask_len(row_bytes, bounds)?;
        if image.len() < len {
            return Err(PipelineError::validation(format!(
                "mask image needs {len} bytes, got {}",
                image.len()
            )));
        }
        Ok(Self {
            format,
            bounds,
            row_bytes,
            image,
        })
    }

    /// Encoding.
    pub fn format(&self) -> MaskFormat {
        self.format
    }

    /// Device-space placement.
    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    /// Bytes per row.
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Raw coverage bytes.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Set the coverage of device pixel `(x, y)`; ignored outside the bounds. BW masks treat
    /// coverage of at least half as set, LCD16 masks store it on all three channels.
    pub fn set_coverage(&mut self, x: i32, y: i32, coverage: u8) {
        if !self.bounds.contains(x, y) {
            return;
        }
        let col = (x - self.bounds.left) as usize;
        let row = (y - self.bounds.top) as usize * self.row_bytes;
        match self.format {
            MaskFormat::Bw => {
                let bit = 0x80 >> (col % 8);
                let byte = &mut self.image[row + col / 8];
                if coverage >= 0x80 {
                    *byte |= bit;
                } else {
                    *byte &= !bit;
                }
            }
            MaskFormat::A8 => self.image[row + col] = coverage,
            MaskFormat::Lcd16 => {
                let c = u16::from(coverage);
                let v = (c >> 3) << 11 | (c >> 2) << 5 | (c >> 3);
                self.image[row + col * 2..][..2].copy_from_slice(&v.to_le_bytes());
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/pixmap.rs"]
mod tests;
