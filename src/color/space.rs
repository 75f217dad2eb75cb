use crate::color::lut::ColorLut;
use crate::color::matrix::Matrix3x4;
use crate::color::transfer::{GammaNamed, TransferFn, validate_table};
use crate::foundation::error::{PipelineError, PipelineResult};

/// One channel's transfer curve.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// A named curve.
    Named(GammaNamed),
    /// A pure power curve with this exponent.
    Value(f32),
    /// Samples evenly spaced over [0, 1].
    Table(Vec<f32>),
    /// A seven-parameter function.
    Param(TransferFn),
}

impl Gamma {
    /// Parametric form; `None` for sampled tables.
    pub fn transfer_fn(&self) -> Option<TransferFn> {
        match self {
            Self::Named(named) => Some(named.transfer_fn()),
            Self::Value(exponent) => Some(TransferFn::from_exponent(*exponent)),
            Self::Table(_) => None,
            Self::Param(f) => Some(*f),
        }
    }

    /// Whether the curve is exactly the identity.
    pub fn is_linear(&self) -> bool {
        match self {
            Self::Named(named) => *named == GammaNamed::Linear,
            Self::Value(exponent) => *exponent == 1.0,
            Self::Table(_) => false,
            Self::Param(f) => *f == TransferFn::LINEAR,
        }
    }

    /// Reject curves no stage can evaluate.
    pub fn validate(&self) -> PipelineResult<()> {
        match self {
            Self::Table(table) => validate_table(table),
            other => other.transfer_fn().map_or(Ok(()), |f| f.validate()),
        }
    }
}

/// Per-channel transfer curves.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Gammas {
    /// Red curve.
    pub red: Gamma,
    /// Green curve.
    pub green: Gamma,
    /// Blue curve.
    pub blue: Gamma,
}

impl Gammas {
    /// The same curve on every channel.
    pub fn uniform(gamma: Gamma) -> Self {
        Self {
            red: gamma.clone(),
            green: gamma.clone(),
            blue: gamma,
        }
    }

    /// Curves in red, green, blue order.
    pub fn channels(&self) -> [&Gamma; 3] {
        [&self.red, &self.green, &self.blue]
    }
}

/// One step of a source color space's conversion to the profile connection space.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum A2BElement {
    /// A named curve on all three channels.
    GammaNamed(GammaNamed),
    /// Independent curves per channel.
    Gammas(Gammas),
    /// A color lookup table.
    Clut(ColorLut),
    /// An affine matrix.
    Matrix(Matrix3x4),
}

/// Profile connection space the element list ends in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pcs {
    /// CIE XYZ relative to D50.
    #[default]
    Xyz,
    /// Normalized CIE Lab.
    Lab,
}

/// Source color space described as an ordered conversion to a connection space.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct A2BColorSpace {
    /// Conversion steps, applied in order.
    pub elements: Vec<A2BElement>,
    /// Space the last element produces.
    #[serde(default)]
    pub pcs: Pcs,
}

impl A2BColorSpace {
    /// Build from elements and connection space.
    pub fn new(elements: Vec<A2BElement>, pcs: Pcs) -> Self {
        Self { elements, pcs }
    }

    /// The sRGB color space.
    pub fn srgb() -> Self {
        Self::from(&XyzColorSpace::srgb())
    }
}

/// Transfer curves of a destination color space.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorGamma {
    /// A named curve on all three channels.
    Named(GammaNamed),
    /// Independent curves per channel.
    PerChannel(Gammas),
}

impl ColorGamma {
    /// Whether every channel's curve is the identity.
    pub fn is_linear(&self) -> bool {
        match self {
            Self::Named(named) => *named == GammaNamed::Linear,
            Self::PerChannel(gammas) => gammas.channels().iter().all(|g| g.is_linear()),
        }
    }
}

/// Destination color space: transfer curves plus primaries relative to XYZ D50.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct XyzColorSpace {
    /// Curves that decode the stored values to linear light.
    pub gamma: ColorGamma,
    /// Linear RGB to XYZ D50.
    pub to_xyz_d50: Matrix3x4,
}

impl XyzColorSpace {
    /// Build from curves and primaries.
    pub fn new(gamma: ColorGamma, to_xyz_d50: Matrix3x4) -> Self {
        Self { gamma, to_xyz_d50 }
    }

    /// The sRGB color space.
    pub fn srgb() -> Self {
        Self::new(
            ColorGamma::Named(GammaNamed::Srgb),
            Matrix3x4::SRGB_TO_XYZ_D50,
        )
    }

    /// sRGB primaries with linear curves.
    pub fn linear_srgb() -> Self {
        Self::new(
            ColorGamma::Named(GammaNamed::Linear),
            Matrix3x4::SRGB_TO_XYZ_D50,
        )
    }

    /// Whether the curves are the identity.
    pub fn is_linear(&self) -> bool {
        self.gamma.is_linear()
    }

    /// XYZ D50 to linear RGB.
    pub fn from_xyz_d50(&self) -> PipelineResult<Matrix3x4> {
        self.to_xyz_d50.validate()?;
        self.to_xyz_d50.invert().ok_or_else(|| {
            PipelineError::unsupported("destination primaries matrix is not invertible")
        })
    }
}

impl From<&XyzColorSpace> for A2BColorSpace {
    fn from(space: &XyzColorSpace) -> Self {
        let curves = match &space.gamma {
            ColorGamma::Named(named) => A2BElement::GammaNamed(*named),
            ColorGamma::PerChannel(gammas) => A2BElement::Gammas(gammas.clone()),
        };
        Self::new(vec![curves, A2BElement::Matrix(space.to_xyz_d50)], Pcs::Xyz)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/color/space.rs"]
mod tests;
