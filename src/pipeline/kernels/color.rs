use wide::{CmpGt, f32x4};

use super::{map_lanes, splat};
use crate::color::transfer::interp_table;
use crate::pipeline::engine::{Flow, Registers};
use crate::pipeline::stage::StageCtx;

pub(super) fn matrix_3x4(p: &mut Registers, ctx: &StageCtx) -> Flow {
    let m = ctx.matrix_3x4().map(splat);
    let (r, g, b) = (p.r, p.g, p.b);
    p.r = r * m[0] + g * m[3] + b * m[6] + m[9];
    p.g = r * m[1] + g * m[4] + b * m[7] + m[10];
    p.b = r * m[2] + g * m[5] + b * m[8] + m[11];
    Flow::Continue
}

pub(super) fn matrix_4x5(p: &mut Registers, ctx: &StageCtx) -> Flow {
    let m = ctx.matrix_4x5().map(splat);
    let (r, g, b, a) = (p.r, p.g, p.b, p.a);
    p.r = r * m[0] + g * m[4] + b * m[8] + a * m[12] + m[16];
    p.g = r * m[1] + g * m[5] + b * m[9] + a * m[13] + m[17];
    p.b = r * m[2] + g * m[6] + b * m[10] + a * m[14] + m[18];
    p.a = r * m[3] + g * m[7] + b * m[11] + a * m[15] + m[19];
    Flow::Continue
}

macro_rules! per_channel {
    ($parametric:ident, $table:ident, $c:ident) => {
        pub(super) fn $parametric(p: &mut Registers, ctx: &StageCtx) -> Flow {
            let f = ctx.transfer_fn();
            p.$c = map_lanes(p.$c, |v| f.eval(v));
            Flow::Continue
        }

        pub(super) fn $table(p: &mut Registers, ctx: &StageCtx) -> Flow {
            let table = ctx.table();
            p.$c = map_lanes(p.$c, |v| interp_table(table, v));
            Flow::Continue
        }
    };
}

per_channel!(parametric_r, table_r, r);
per_channel!(parametric_g, table_g, g);
per_channel!(parametric_b, table_b, b);

pub(super) fn color_lookup_table(p: &mut Registers, ctx: &StageCtx) -> Flow {
    let lut = ctx.color_lut();
    let [r, g, b, a] = [p.r, p.g, p.b, p.a].map(|c| c.to_array());
    let mut out = [[0.0f32; 4]; 3];
    for lane in 0..4 {
        let rgb = lut.interpolate([r[lane], g[lane], b[lane], a[lane]]);
        for (channel, v) in out.iter_mut().zip(rgb) {
            channel[lane] = v;
        }
    }
    [p.r, p.g, p.b] = out.map(f32x4::from);
    Flow::Continue
}

/// Normalized CIE Lab to XYZ relative to the D50 white point.
pub(super) fn lab_to_xyz(p: &mut Registers, _: &StageCtx) -> Flow {
    let l = p.r * splat(100.0);
    let a = p.g * splat(255.0) - splat(128.0);
    let b = p.b * splat(255.0) - splat(128.0);

    let y = (l + splat(16.0)) / splat(116.0);
    let x = a / splat(500.0) + y;
    let z = y - b / splat(200.0);

    let toe = |v: f32x4| {
        let cube = v * v * v;
        cube.cmp_gt(splat(0.008_856))
            .blend(cube, (v - splat(16.0 / 116.0)) / splat(7.787))
    };

    p.r = toe(x) * splat(0.9642);
    p.g = toe(y);
    p.b = toe(z) * splat(0.8249);
    Flow::Continue
}
