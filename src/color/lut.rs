use crate::foundation::error::{PipelineError, PipelineResult};

/// Output channels of every color lookup table.
pub const LUT_OUTPUT_CHANNELS: usize = 3;

/// Multi-dimensional color lookup table with 1 to 4 inputs and 3 outputs.
///
/// Samples are stored with the last input varying fastest; each grid point holds three
/// outputs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorLut {
    grid_points: Vec<usize>,
    table: Vec<f32>,
}

impl ColorLut {
    /// Build and validate a table.
    pub fn new(grid_points: Vec<usize>, table: Vec<f32>) -> PipelineResult<Self> {
        let lut = Self { grid_points, table };
        lut.validate()?;
        Ok(lut)
    }

    /// Grid points per input dimension.
    pub fn grid_points(&self) -> &[usize] {
        &self.grid_points
    }

    /// Number of input channels.
    pub fn input_channels(&self) -> usize {
        self.grid_points.len()
    }

    /// Check dimensions, grid sizes and sample count.
    pub fn validate(&self) -> PipelineResult<()> {
        let inputs = self.grid_points.len();
        if !(1..=4).contains(&inputs) {
            return Err(PipelineError::unsupported(format!(
                "color lookup table must have 1 to 4 inputs, got {inputs}"
            )));
        }
        if self.grid_points.iter().any(|&g| g < 2) {
            return Err(PipelineError::unsupported(format!(
                "color lookup table needs at least 2 grid points per input, got {:?}",
                self.grid_points
            )));
        }
        let expected = self
            .grid_points
            .iter()
            .try_fold(LUT_OUTPUT_CHANNELS, |n, &g| n.checked_mul(g))
            .ok_or_else(|| PipelineError::unsupported("color lookup table is too large"))?;
        if self.table.len() != expected {
            return Err(PipelineError::unsupported(format!(
                "color lookup table holds {} samples, grid {:?} needs {expected}",
                self.table.len(),
                self.grid_points
            )));
        }
        if !self.table.iter().all(|v| v.is_finite()) {
            return Err(PipelineError::unsupported(
                "color lookup table has non-finite samples",
            ));
        }
        Ok(())
    }

    /// Multilinear interpolation. Only the first `input_channels` inputs are read; each is
    /// clamped to [0, 1].
    pub fn interpolate(&self, input: [f32; 4]) -> [f32; LUT_OUTPUT_CHANNELS] {
        let dims = self.grid_points.len().min(4);
        let mut base = [0usize; 4];
        let mut frac = [0f32; 4];
        let mut stride = [0usize; 4];

        let mut step = 1;
        for i in (0..dims).rev() {
            stride[i] = step;
            step *= self.grid_points[i];
        }
        for i in 0..dims {
            let max = self.grid_points[i] - 1;
            let v = if input[i].is_nan() { 0.0 } else { input[i].clamp(0.0, 1.0) };
            let pos = v * max as f32;
            let lo = (pos.floor() as usize).min(max.saturating_sub(1));
            base[i] = lo;
            frac[i] = pos - lo as f32;
        }

        let mut out = [0.0; LUT_OUTPUT_CHANNELS];
        for corner in 0..(1usize << dims) {
            let mut weight = 1.0;
            let mut index = 0;
            for i in 0..dims {
                let upper = (corner >> i) & 1 == 1;
                index += (base[i] + usize::from(upper)) * stride[i];
                weight *= if upper { frac[i] } else { 1.0 - frac[i] };
            }
            if weight == 0.0 {
                continue;
            }
            let sample = &self.table[index * LUT_OUTPUT_CHANNELS..][..LUT_OUTPUT_CHANNELS];
            for (o, s) in out.iter_mut().zip(sample) {
                *o += weight * s;
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/color/lut.rs"]
mod tests;
