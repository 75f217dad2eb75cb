use wide::{CmpEq, f32x4};

use super::splat;
use crate::pipeline::engine::{Flow, Registers};
use crate::pipeline::stage::StageCtx;

pub(super) fn trace(p: &mut Registers, _: &StageCtx) -> Flow {
    tracing::trace!(x = p.x, y = p.y, tail = p.tail, "pipeline block");
    Flow::Continue
}

pub(super) fn registers(p: &mut Registers, _: &StageCtx) -> Flow {
    tracing::trace!(
        r = ?p.r.to_array(),
        g = ?p.g.to_array(),
        b = ?p.b.to_array(),
        a = ?p.a.to_array(),
        dr = ?p.dr.to_array(),
        dg = ?p.dg.to_array(),
        db = ?p.db.to_array(),
        da = ?p.da.to_array(),
        "pipeline registers"
    );
    Flow::Continue
}

pub(super) fn move_src_dst(p: &mut Registers, _: &StageCtx) -> Flow {
    p.dr = p.r;
    p.dg = p.g;
    p.db = p.b;
    p.da = p.a;
    Flow::Continue
}

pub(super) fn swap_src_dst(p: &mut Registers, _: &StageCtx) -> Flow {
    std::mem::swap(&mut p.r, &mut p.dr);
    std::mem::swap(&mut p.g, &mut p.dg);
    std::mem::swap(&mut p.b, &mut p.db);
    std::mem::swap(&mut p.a, &mut p.da);
    Flow::Continue
}

pub(super) fn swap_rb(p: &mut Registers, _: &StageCtx) -> Flow {
    std::mem::swap(&mut p.r, &mut p.b);
    Flow::Continue
}

pub(super) fn clamp_0(p: &mut Registers, _: &StageCtx) -> Flow {
    let zero = splat(0.0);
    p.r = p.r.max(zero);
    p.g = p.g.max(zero);
    p.b = p.b.max(zero);
    p.a = p.a.max(zero);
    Flow::Continue
}

pub(super) fn clamp_1(p: &mut Registers, _: &StageCtx) -> Flow {
    let one = splat(1.0);
    p.r = p.r.min(one);
    p.g = p.g.min(one);
    p.b = p.b.min(one);
    p.a = p.a.min(one);
    Flow::Continue
}

pub(super) fn clamp_a(p: &mut Registers, _: &StageCtx) -> Flow {
    p.a = p.a.min(splat(1.0));
    p.r = p.r.min(p.a);
    p.g = p.g.min(p.a);
    p.b = p.b.min(p.a);
    Flow::Continue
}

pub(super) fn premul(p: &mut Registers, _: &StageCtx) -> Flow {
    p.r = p.r * p.a;
    p.g = p.g * p.a;
    p.b = p.b * p.a;
    Flow::Continue
}

pub(super) fn unpremul(p: &mut Registers, _: &StageCtx) -> Flow {
    let zero = splat(0.0);
    let scale = p.a.cmp_eq(zero).blend(zero, splat(1.0) / p.a);
    p.r = p.r * scale;
    p.g = p.g * scale;
    p.b = p.b * scale;
    Flow::Continue
}

pub(super) fn luminance_to_alpha(p: &mut Registers, _: &StageCtx) -> Flow {
    p.a = p.r * splat(0.2126) + p.g * splat(0.7152) + p.b * splat(0.0722);
    let zero = f32x4::splat(0.0);
    p.r = zero;
    p.g = zero;
    p.b = zero;
    Flow::Continue
}

pub(super) fn constant_color(p: &mut Registers, ctx: &StageCtx) -> Flow {
    let c = ctx.color();
    p.r = splat(c.r);
    p.g = splat(c.g);
    p.b = splat(c.b);
    p.a = splat(c.a);
    Flow::Continue
}
