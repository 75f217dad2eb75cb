use crate::foundation::error::{PipelineError, PipelineResult};

/// Row-major 3x4 affine color matrix: `out[i] = Σ rows[i][j]·in[j] + rows[i][3]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Matrix3x4 {
    /// Three rows of three coefficients plus a translation.
    pub rows: [[f32; 4]; 3],
}

impl Default for Matrix3x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix3x4 {
    /// Identity.
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    /// Linear sRGB primaries to XYZ, adapted to D50.
    pub const SRGB_TO_XYZ_D50: Self = Self::from_3x3([
        [0.436_074_7, 0.385_064_9, 0.143_080_4],
        [0.222_504_5, 0.716_878_6, 0.060_616_9],
        [0.013_932_2, 0.097_104_5, 0.714_173_3],
    ]);

    /// Linear part only, zero translation.
    pub const fn from_3x3(m: [[f32; 3]; 3]) -> Self {
        Self {
            rows: [
                [m[0][0], m[0][1], m[0][2], 0.0],
                [m[1][0], m[1][1], m[1][2], 0.0],
                [m[2][0], m[2][1], m[2][2], 0.0],
            ],
        }
    }

    /// Whether this is exactly the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Reject non-finite coefficients.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.rows.iter().flatten().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(PipelineError::unsupported(
                "color matrix has non-finite coefficients",
            ))
        }
    }

    /// Stage layout: the three columns, then the translation.
    pub fn to_column_major(&self) -> [f32; 12] {
        std::array::from_fn(|i| self.rows[i % 3][i / 3])
    }

    /// Apply to a color triple.
    pub fn map(&self, v: [f32; 3]) -> [f32; 3] {
        self.rows
            .map(|row| row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3])
    }

    /// Affine inverse, `None` when the linear part is singular.
    pub fn invert(&self) -> Option<Self> {
        let m = |r: usize, c: usize| f64::from(self.rows[r][c]);
        let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m(r0, c0) * m(r1, c1) - m(r0, c1) * m(r1, c0)
        };

        let c00 = cofactor(1, 2, 1, 2);
        let c01 = -cofactor(1, 2, 0, 2);
        let c02 = cofactor(1, 2, 0, 1);
        let det = m(0, 0) * c00 + m(0, 1) * c01 + m(0, 2) * c02;
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;

        // Adjugate (transposed cofactors) scaled by 1/det.
        let linear = [
            [c00, -cofactor(0, 2, 1, 2), cofactor(0, 1, 1, 2)],
            [c01, cofactor(0, 2, 0, 2), -cofactor(0, 1, 0, 2)],
            [c02, -cofactor(0, 2, 0, 1), cofactor(0, 1, 0, 1)],
        ]
        .map(|row| row.map(|v| v * inv_det));

        let t = [m(0, 3), m(1, 3), m(2, 3)];
        let rows = linear.map(|row| {
            let translation = -(row[0] * t[0] + row[1] * t[1] + row[2] * t[2]);
            [
                row[0] as f32,
                row[1] as f32,
                row[2] as f32,
                translation as f32,
            ]
        });
        Some(Self { rows })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/color/matrix.rs"]
mod tests;
