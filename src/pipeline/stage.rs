use std::cell::{Cell, Ref, RefCell};
use std::ops::Range;
use std::rc::Rc;

use crate::color::lut::ColorLut;
use crate::color::transfer::TransferFn;
use crate::foundation::core::PremulColor;

/// The kind of context a [`StageKind`] reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    /// The stage reads nothing but the registers.
    None,
    /// Pixel or mask memory, see [`MemoryCtx`].
    Memory,
    /// A premultiplied color cell.
    Color,
    /// A scalar coverage cell.
    Coverage,
    /// A parametric transfer function.
    TransferFn,
    /// A sampled transfer table.
    Table,
    /// A column-major 3x4 matrix.
    Matrix3x4,
    /// A column-major 4x5 matrix.
    Matrix4x5,
    /// A multi-dimensional color lookup table.
    ColorLut,
}

macro_rules! stage_catalog {
    ($($(#[$doc:meta])* $variant:ident => $name:literal, $ctx:ident;)*) => {
        /// Closed catalog of pixel-processing stages.
        ///
        /// Serialized (and displayed) by its snake_case catalog name.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum StageKind {
            $(
                $(#[$doc])*
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl StageKind {
            /// Every stage kind, in catalog order.
            pub const ALL: &'static [StageKind] = &[$(StageKind::$variant,)*];

            /// Catalog name.
            pub fn name(self) -> &'static str {
                match self {
                    $(StageKind::$variant => $name,)*
                }
            }

            /// The context this stage must be appended with.
            pub fn context_kind(self) -> ContextKind {
                match self {
                    $(StageKind::$variant => ContextKind::$ctx,)*
                }
            }
        }
    };
}

stage_catalog! {
    /// Log the block position.
    Trace => "trace", None;
    /// Log every register.
    Registers => "registers", None;
    /// Copy the working registers over the scratch registers.
    MoveSrcDst => "move_src_dst", None;
    /// Exchange working and scratch registers.
    SwapSrcDst => "swap_src_dst", None;
    /// Exchange red and blue.
    SwapRb => "swap_rb", None;
    /// Raise all working channels to at least zero.
    Clamp0 => "clamp_0", None;
    /// Lower all working channels to at most one.
    Clamp1 => "clamp_1", None;
    /// Lower alpha to one and color channels to alpha.
    ClampA => "clamp_a", None;
    /// Multiply color by alpha.
    Premul => "premul", None;
    /// Divide color by alpha (zero alpha yields zero color).
    Unpremul => "unpremul", None;
    /// Move Rec. 709 luminance into alpha and zero the color.
    LuminanceToAlpha => "luminance_to_alpha", None;
    /// Replace the working registers with a constant color.
    ConstantColor => "constant_color", Color;
    /// Load linear 8-bit RGBA into the working registers.
    LoadS8888 => "load_s_8888", Memory;
    /// Load linear 8-bit RGBA into the scratch registers.
    LoadD8888 => "load_d_8888", Memory;
    /// Store the working registers as linear 8-bit RGBA.
    Store8888 => "store_8888", Memory;
    /// Load sRGB-encoded 8-bit RGBA into the working registers.
    LoadSSrgb => "load_s_srgb", Memory;
    /// Load sRGB-encoded 8-bit RGBA into the scratch registers.
    LoadDSrgb => "load_d_srgb", Memory;
    /// Store the working registers sRGB-encoded.
    StoreSrgb => "store_srgb", Memory;
    /// Load 5-6-5 into the working registers.
    LoadS565 => "load_s_565", Memory;
    /// Load 5-6-5 into the scratch registers.
    LoadD565 => "load_d_565", Memory;
    /// Store the working registers as 5-6-5.
    Store565 => "store_565", Memory;
    /// Load half-float RGBA into the working registers.
    LoadSF16 => "load_s_f16", Memory;
    /// Load half-float RGBA into the scratch registers.
    LoadDF16 => "load_d_f16", Memory;
    /// Store the working registers as half-float RGBA.
    StoreF16 => "store_f16", Memory;
    /// Load float RGBA into the working registers.
    LoadSF32 => "load_s_f32", Memory;
    /// Load float RGBA into the scratch registers.
    LoadDF32 => "load_d_f32", Memory;
    /// Store the working registers as float RGBA.
    StoreF32 => "store_f32", Memory;
    /// Scale by an 8-bit coverage mask.
    ScaleU8 => "scale_u8", Memory;
    /// Interpolate toward the source by an 8-bit coverage mask.
    LerpU8 => "lerp_u8", Memory;
    /// Interpolate per channel by a 5-6-5 coverage mask.
    Lerp565 => "lerp_565", Memory;
    /// Scale by a constant coverage.
    ScaleConstantFloat => "scale_constant_float", Coverage;
    /// Interpolate toward the source by a constant coverage.
    LerpConstantFloat => "lerp_constant_float", Coverage;
    /// Porter-Duff clear.
    Clear => "clear", None;
    /// Porter-Duff dst.
    Dst => "dst", None;
    /// Porter-Duff source-atop.
    SrcAtop => "srcatop", None;
    /// Porter-Duff destination-atop.
    DstAtop => "dstatop", None;
    /// Porter-Duff source-in.
    SrcIn => "srcin", None;
    /// Porter-Duff destination-in.
    DstIn => "dstin", None;
    /// Porter-Duff source-out.
    SrcOut => "srcout", None;
    /// Porter-Duff destination-out.
    DstOut => "dstout", None;
    /// Porter-Duff source-over.
    SrcOver => "srcover", None;
    /// Porter-Duff destination-over.
    DstOver => "dstover", None;
    /// Component-wise product.
    Modulate => "modulate", None;
    /// W3C multiply.
    Multiply => "multiply", None;
    /// Unclamped sum.
    Plus => "plus", None;
    /// W3C screen.
    Screen => "screen", None;
    /// Porter-Duff xor.
    Xor => "xor", None;
    /// W3C color-burn.
    ColorBurn => "colorburn", None;
    /// W3C color-dodge.
    ColorDodge => "colordodge", None;
    /// W3C darken.
    Darken => "darken", None;
    /// W3C difference.
    Difference => "difference", None;
    /// W3C exclusion.
    Exclusion => "exclusion", None;
    /// W3C hard-light.
    HardLight => "hardlight", None;
    /// W3C lighten.
    Lighten => "lighten", None;
    /// W3C overlay.
    Overlay => "overlay", None;
    /// W3C soft-light.
    SoftLight => "softlight", None;
    /// Affine 3x4 transform of red, green and blue.
    Matrix3x4 => "matrix_3x4", Matrix3x4;
    /// Affine 4x5 transform of all four channels.
    Matrix4x5 => "matrix_4x5", Matrix4x5;
    /// Parametric transfer function on red.
    ParametricR => "parametric_r", TransferFn;
    /// Parametric transfer function on green.
    ParametricG => "parametric_g", TransferFn;
    /// Parametric transfer function on blue.
    ParametricB => "parametric_b", TransferFn;
    /// Sampled transfer table on red.
    TableR => "table_r", Table;
    /// Sampled transfer table on green.
    TableG => "table_g", Table;
    /// Sampled transfer table on blue.
    TableB => "table_b", Table;
    /// Multilinear color lookup table.
    ColorLookupTable => "color_lookup_table", ColorLut;
    /// CIE Lab (normalized) to XYZ D50.
    LabToXyz => "lab_to_xyz", None;
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pixel or mask memory shared between a consumer and the stages that read or write it.
///
/// Pixel `x` of the bound row starts at byte `origin + x * bytes_per_pixel`. Consumers move
/// the origin between runs instead of rebuilding pipelines.
#[derive(Debug, Default)]
pub struct MemoryCtx {
    bytes: RefCell<Vec<u8>>,
    origin: Cell<isize>,
}

impl MemoryCtx {
    /// Wrap an existing buffer with origin zero.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: RefCell::new(bytes),
            origin: Cell::new(0),
        }
    }

    /// A zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// Rebind the byte offset of pixel zero.
    pub fn set_origin(&self, origin: isize) {
        self.origin.set(origin);
    }

    /// Current byte offset of pixel zero.
    pub fn origin(&self) -> isize {
        self.origin.get()
    }

    /// Swap in a new buffer, returning the old one.
    pub fn replace(&self, bytes: Vec<u8>) -> Vec<u8> {
        self.bytes.replace(bytes)
    }

    /// Move the buffer out, leaving it empty.
    pub fn take(&self) -> Vec<u8> {
        self.bytes.take()
    }

    /// Borrow the buffer.
    pub fn bytes(&self) -> Ref<'_, Vec<u8>> {
        self.bytes.borrow()
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.borrow().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn range(&self, x: usize, bpp: usize, count: usize) -> Range<usize> {
        let origin = self.origin.get();
        let start = usize::try_from(origin + (x * bpp) as isize).unwrap_or_else(|_| {
            panic!("memory origin {origin} puts pixel {x} before the start of the buffer")
        });
        start..start + count * bpp
    }

    pub(crate) fn with_pixels<R>(
        &self,
        x: usize,
        bpp: usize,
        count: usize,
        f: impl FnOnce(&[u8]) -> R,
    ) -> R {
        let range = self.range(x, bpp, count);
        f(&self.bytes.borrow()[range])
    }

    pub(crate) fn with_pixels_mut<R>(
        &self,
        x: usize,
        bpp: usize,
        count: usize,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        let range = self.range(x, bpp, count);
        f(&mut self.bytes.borrow_mut()[range])
    }
}

/// The context half of a stage.
///
/// Contexts are reference counted: the consumer keeps its own handle and mutates cells (origin,
/// coverage, color) between runs; compiled pipelines observe the change without recompiling.
#[derive(Clone, Debug, Default)]
pub enum StageCtx {
    /// No context.
    #[default]
    None,
    /// Pixel or mask memory.
    Memory(Rc<MemoryCtx>),
    /// Premultiplied color.
    Color(Rc<Cell<PremulColor>>),
    /// Scalar coverage.
    Coverage(Rc<Cell<f32>>),
    /// Parametric transfer function.
    TransferFn(Rc<TransferFn>),
    /// Sampled transfer table, entries at `i / (len - 1)`.
    Table(Rc<[f32]>),
    /// Column-major 3x4 matrix.
    Matrix3x4(Rc<[f32; 12]>),
    /// Column-major 4x5 matrix.
    Matrix4x5(Rc<[f32; 20]>),
    /// Color lookup table.
    ColorLut(Rc<ColorLut>),
}

impl StageCtx {
    /// Which kind of context this is.
    pub fn kind(&self) -> ContextKind {
        match self {
            Self::None => ContextKind::None,
            Self::Memory(_) => ContextKind::Memory,
            Self::Color(_) => ContextKind::Color,
            Self::Coverage(_) => ContextKind::Coverage,
            Self::TransferFn(_) => ContextKind::TransferFn,
            Self::Table(_) => ContextKind::Table,
            Self::Matrix3x4(_) => ContextKind::Matrix3x4,
            Self::Matrix4x5(_) => ContextKind::Matrix4x5,
            Self::ColorLut(_) => ContextKind::ColorLut,
        }
    }

    pub(crate) fn memory(&self) -> &MemoryCtx {
        match self {
            Self::Memory(m) => m,
            other => mismatch(ContextKind::Memory, other),
        }
    }

    pub(crate) fn color(&self) -> PremulColor {
        match self {
            Self::Color(c) => c.get(),
            other => mismatch(ContextKind::Color, other),
        }
    }

    pub(crate) fn coverage(&self) -> f32 {
        match self {
            Self::Coverage(c) => c.get(),
            other => mismatch(ContextKind::Coverage, other),
        }
    }

    pub(crate) fn transfer_fn(&self) -> &TransferFn {
        match self {
            Self::TransferFn(f) => f,
            other => mismatch(ContextKind::TransferFn, other),
        }
    }

    pub(crate) fn table(&self) -> &[f32] {
        match self {
            Self::Table(t) => t,
            other => mismatch(ContextKind::Table, other),
        }
    }

    pub(crate) fn matrix_3x4(&self) -> &[f32; 12] {
        match self {
            Self::Matrix3x4(m) => m,
            other => mismatch(ContextKind::Matrix3x4, other),
        }
    }

    pub(crate) fn matrix_4x5(&self) -> &[f32; 20] {
        match self {
            Self::Matrix4x5(m) => m,
            other => mismatch(ContextKind::Matrix4x5, other),
        }
    }

    pub(crate) fn color_lut(&self) -> &ColorLut {
        match self {
            Self::ColorLut(lut) => lut,
            other => mismatch(ContextKind::ColorLut, other),
        }
    }
}

#[cold]
fn mismatch(expected: ContextKind, got: &StageCtx) -> ! {
    panic!("stage expects a {expected:?} context, got {:?}", got.kind())
}

macro_rules! ctx_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for StageCtx {
                fn from(ctx: $ty) -> Self {
                    Self::$variant(ctx)
                }
            }
        )*
    };
}

ctx_from! {
    Rc<MemoryCtx> => Memory,
    Rc<Cell<PremulColor>> => Color,
    Rc<Cell<f32>> => Coverage,
    Rc<TransferFn> => TransferFn,
    Rc<[f32]> => Table,
    Rc<[f32; 12]> => Matrix3x4,
    Rc<[f32; 20]> => Matrix4x5,
    Rc<ColorLut> => ColorLut,
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/stage.rs"]
mod tests;
