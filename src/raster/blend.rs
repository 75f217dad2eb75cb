use crate::pipeline::builder::Pipeline;
use crate::pipeline::stage::StageKind;

/// Paint blend modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum BlendMode {
    Clear,
    Src,
    Dst,
    #[default]
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcAtop,
    DstAtop,
    Xor,
    Plus,
    Modulate,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Multiply,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// The compositing stage, `None` for `Src` (the source passes through) and for the
    /// non-separable modes, which have no stage.
    pub fn stage(self) -> Option<StageKind> {
        use StageKind as K;

        Some(match self {
            Self::Src | Self::Hue | Self::Saturation | Self::Color | Self::Luminosity => {
                return None;
            }
            Self::Clear => K::Clear,
            Self::Dst => K::Dst,
            Self::SrcOver => K::SrcOver,
            Self::DstOver => K::DstOver,
            Self::SrcIn => K::SrcIn,
            Self::DstIn => K::DstIn,
            Self::SrcOut => K::SrcOut,
            Self::DstOut => K::DstOut,
            Self::SrcAtop => K::SrcAtop,
            Self::DstAtop => K::DstAtop,
            Self::Xor => K::Xor,
            Self::Plus => K::Plus,
            Self::Modulate => K::Modulate,
            Self::Screen => K::Screen,
            Self::Overlay => K::Overlay,
            Self::Darken => K::Darken,
            Self::Lighten => K::Lighten,
            Self::ColorDodge => K::ColorDodge,
            Self::ColorBurn => K::ColorBurn,
            Self::HardLight => K::HardLight,
            Self::SoftLight => K::SoftLight,
            Self::Difference => K::Difference,
            Self::Exclusion => K::Exclusion,
            Self::Multiply => K::Multiply,
        })
    }

    /// Whether a pipeline can express this mode.
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            Self::Hue | Self::Saturation | Self::Color | Self::Luminosity
        )
    }

    /// Whether the result can leave the premultiplied range and needs `clamp_a`.
    pub fn can_overflow(self) -> bool {
        self == Self::Plus
    }

    /// Append this mode's stage; `false` when the mode is unsupported.
    pub(crate) fn append_stages(self, p: &mut Pipeline) -> bool {
        if !self.is_supported() {
            return false;
        }
        if let Some(kind) = self.stage() {
            p.push(kind);
        }
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/blend.rs"]
mod tests;
