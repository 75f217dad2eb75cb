use crate::foundation::error::{PipelineError, PipelineResult};

/// Number of samples in a numerically inverted transfer table.
pub const INVERSE_TABLE_SIZE: usize = 256;

/// Seven-parameter transfer function.
///
/// `y = c·x + f` when `x < d`, otherwise `y = (a·x + b)^g + e` with the power base clamped at
/// zero.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransferFn {
    /// Exponent of the power segment.
    pub g: f32,
    /// Input scale of the power segment.
    pub a: f32,
    /// Input offset of the power segment.
    pub b: f32,
    /// Slope of the linear segment.
    pub c: f32,
    /// Breakpoint between the segments.
    pub d: f32,
    /// Output offset of the power segment.
    pub e: f32,
    /// Output offset of the linear segment.
    pub f: f32,
}

impl TransferFn {
    /// Identity.
    pub const LINEAR: Self = Self::from_exponent(1.0);

    /// The sRGB decoding curve.
    pub const SRGB: Self = Self {
        g: 2.4,
        a: 1.0 / 1.055,
        b: 0.055 / 1.055,
        c: 1.0 / 12.92,
        d: 0.040_45,
        e: 0.0,
        f: 0.0,
    };

    /// A pure power curve `y = x^g`.
    pub const fn from_exponent(g: f32) -> Self {
        Self {
            g,
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Evaluate at `x`.
    pub fn eval(&self, x: f32) -> f32 {
        if x < self.d {
            self.c * x + self.f
        } else {
            (self.a * x + self.b).max(0.0).powf(self.g) + self.e
        }
    }

    /// Closed-form inverse.
    ///
    /// Degenerate segments invert to passthrough defaults instead of NaN: a zero linear slope
    /// yields a zero linear segment; a zero `a` or `g` yields `g = 1, a = b = 0, e = 1`.
    pub fn invert(&self) -> Self {
        let (c, f) = if self.c == 0.0 {
            (0.0, 0.0)
        } else {
            (1.0 / self.c, -self.f / self.c)
        };

        let (g, a, b, e) = if self.a == 0.0 || self.g == 0.0 {
            (1.0, 0.0, 0.0, 1.0)
        } else {
            let a = (1.0 / self.a).powf(self.g);
            (1.0 / self.g, a, -a * self.e, -self.b / self.a)
        };

        Self {
            g,
            a,
            b,
            c,
            d: self.c * self.d + self.f,
            e,
            f,
        }
    }

    /// Reject non-finite coefficients.
    pub fn validate(&self) -> PipelineResult<()> {
        let coefficients = [self.g, self.a, self.b, self.c, self.d, self.e, self.f];
        if coefficients.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(PipelineError::unsupported(format!(
                "transfer function has non-finite coefficients: {self:?}"
            )))
        }
    }
}

/// Transfer curves known by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GammaNamed {
    /// Identity.
    Linear,
    /// The sRGB curve.
    Srgb,
    /// A pure 2.2 power curve.
    #[serde(rename = "2.2")]
    TwoDotTwo,
}

impl GammaNamed {
    /// Parametric form of the curve.
    pub fn transfer_fn(self) -> TransferFn {
        match self {
            Self::Linear => TransferFn::LINEAR,
            Self::Srgb => TransferFn::SRGB,
            Self::TwoDotTwo => TransferFn::from_exponent(2.2),
        }
    }
}

/// Sample `table` at `x`, clamped to [0, 1], with entries spaced `1 / (len - 1)` apart.
pub(crate) fn interp_table(table: &[f32], x: f32) -> f32 {
    let Some(max_index) = table.len().checked_sub(1) else {
        return x;
    };
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
    let pos = x * max_index as f32;
    let lo = (pos.floor() as usize).min(max_index);
    let hi = (lo + 1).min(max_index);
    let t = pos - lo as f32;
    table[lo] + (table[hi] - table[lo]) * t
}

/// Fractional position in [0, 1] at which `table` first reaches `y`.
pub(crate) fn inverse_interp_table(table: &[f32], y: f32) -> f32 {
    let (Some(&first), Some(&last)) = (table.first(), table.last()) else {
        return y;
    };
    if y <= first {
        return 0.0;
    }
    if y >= last {
        return 1.0;
    }
    let max_index = (table.len() - 1) as f32;
    for i in 1..table.len() {
        if table[i] >= y {
            let lo = table[i - 1];
            let span = table[i] - lo;
            let frac = if span > 0.0 { (y - lo) / span } else { 0.0 };
            return ((i - 1) as f32 + frac) / max_index;
        }
    }
    1.0
}

/// Numeric inverse of a sampled transfer table, [`INVERSE_TABLE_SIZE`] entries long.
pub fn build_inverse_table(table: &[f32]) -> Vec<f32> {
    let max = (INVERSE_TABLE_SIZE - 1) as f32;
    (0..INVERSE_TABLE_SIZE)
        .map(|i| inverse_interp_table(table, i as f32 / max))
        .collect()
}

/// Tables must hold at least two finite samples.
pub(crate) fn validate_table(table: &[f32]) -> PipelineResult<()> {
    if table.len() < 2 {
        return Err(PipelineError::unsupported(format!(
            "transfer table needs at least two entries, got {}",
            table.len()
        )));
    }
    if !table.iter().all(|v| v.is_finite()) {
        return Err(PipelineError::unsupported(
            "transfer table has non-finite entries",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/color/transfer.rs"]
mod tests;
