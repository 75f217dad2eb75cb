use wide::f32x4;

use super::lerp;
use super::memory::unpack_565;
use crate::pipeline::engine::{Flow, Registers, STAGE_WIDTH};
use crate::pipeline::stage::StageCtx;

fn mask_u8(p: &Registers, ctx: &StageCtx) -> f32x4 {
    let mut c = [0.0f32; STAGE_WIDTH];
    ctx.memory().with_pixels(p.x, 1, p.lanes(), |bytes| {
        for (lane, &v) in bytes.iter().enumerate() {
            c[lane] = f32::from(v) * (1.0 / 255.0);
        }
    });
    f32x4::from(c)
}

fn scale(p: &mut Registers, c: f32x4) {
    p.r = p.r * c;
    p.g = p.g * c;
    p.b = p.b * c;
    p.a = p.a * c;
}

fn lerp_all(p: &mut Registers, c: f32x4) {
    p.r = lerp(p.dr, p.r, c);
    p.g = lerp(p.dg, p.g, c);
    p.b = lerp(p.db, p.b, c);
    p.a = lerp(p.da, p.a, c);
}

pub(super) fn scale_u8(p: &mut Registers, ctx: &StageCtx) -> Flow {
    let c = mask_u8(p, ctx);
    scale(p, c);
    Flow::Continue
}

pub(super) fn lerp_u8(p: &mut Registers, ctx: &StageCtx) -> Flow {
    let c = mask_u8(p, ctx);
    lerp_all(p, c);
    Flow::Continue
}

/// Per-channel coverage from a 5-6-5 mask; alpha takes the largest of the three.
pub(super) fn lerp_565(p: &mut Registers, ctx: &StageCtx) -> Flow {
    let mut cr = [0.0f32; STAGE_WIDTH];
    let mut cg = [0.0f32; STAGE_WIDTH];
    let mut cb = [0.0f32; STAGE_WIDTH];
    ctx.memory().with_pixels(p.x, 2, p.lanes(), |bytes| {
        for (lane, px) in bytes.chunks_exact(2).enumerate() {
            [cr[lane], cg[lane], cb[lane]] = unpack_565(u16::from_le_bytes([px[0], px[1]]));
        }
    });
    let (cr, cg, cb) = (f32x4::from(cr), f32x4::from(cg), f32x4::from(cb));
    p.r = lerp(p.dr, p.r, cr);
    p.g = lerp(p.dg, p.g, cg);
    p.b = lerp(p.db, p.b, cb);
    p.a = lerp(p.da, p.a, cr.max(cg).max(cb));
    Flow::Continue
}

pub(super) fn scale_constant_float(p: &mut Registers, ctx: &StageCtx) -> Flow {
    scale(p, f32x4::splat(ctx.coverage()));
    Flow::Continue
}

pub(super) fn lerp_constant_float(p: &mut Registers, ctx: &StageCtx) -> Flow {
    lerp_all(p, f32x4::splat(ctx.coverage()));
    Flow::Continue
}
