use wide::{CmpEq, CmpGt, CmpLe, f32x4};

use super::{inv, splat};
use crate::pipeline::engine::{Flow, Registers};
use crate::pipeline::stage::StageCtx;

/// Same formula for all four channels.
macro_rules! blend_fn {
    ($name:ident, |$s:ident, $d:ident, $sa:ident, $da:ident| $body:expr) => {
        pub(super) fn $name(p: &mut Registers, _: &StageCtx) -> Flow {
            #[allow(unused_variables)]
            fn channel($s: f32x4, $d: f32x4, $sa: f32x4, $da: f32x4) -> f32x4 {
                $body
            }
            let (sa, da) = (p.a, p.da);
            p.r = channel(p.r, p.dr, sa, da);
            p.g = channel(p.g, p.dg, sa, da);
            p.b = channel(p.b, p.db, sa, da);
            p.a = channel(sa, da, sa, da);
            Flow::Continue
        }
    };
}

/// Separable mode: the formula for color, source-over for alpha.
macro_rules! separable_fn {
    ($name:ident, |$s:ident, $d:ident, $sa:ident, $da:ident| $body:expr) => {
        pub(super) fn $name(p: &mut Registers, _: &StageCtx) -> Flow {
            #[allow(unused_variables)]
            fn channel($s: f32x4, $d: f32x4, $sa: f32x4, $da: f32x4) -> f32x4 {
                $body
            }
            let (sa, da) = (p.a, p.da);
            p.r = channel(p.r, p.dr, sa, da);
            p.g = channel(p.g, p.dg, sa, da);
            p.b = channel(p.b, p.db, sa, da);
            p.a = sa + da * inv(sa);
            Flow::Continue
        }
    };
}

blend_fn!(clear, |s, d, sa, da| splat(0.0));
blend_fn!(dst, |s, d, sa, da| d);
blend_fn!(srcatop, |s, d, sa, da| s * da + d * inv(sa));
blend_fn!(dstatop, |s, d, sa, da| d * sa + s * inv(da));
blend_fn!(srcin, |s, d, sa, da| s * da);
blend_fn!(dstin, |s, d, sa, da| d * sa);
blend_fn!(srcout, |s, d, sa, da| s * inv(da));
blend_fn!(dstout, |s, d, sa, da| d * inv(sa));
blend_fn!(srcover, |s, d, sa, da| s + d * inv(sa));
blend_fn!(dstover, |s, d, sa, da| d + s * inv(da));
blend_fn!(modulate, |s, d, sa, da| s * d);
blend_fn!(multiply, |s, d, sa, da| s * inv(da) + d * inv(sa) + s * d);
blend_fn!(plus, |s, d, sa, da| s + d);
blend_fn!(screen, |s, d, sa, da| s + d - s * d);
blend_fn!(xor, |s, d, sa, da| s * inv(da) + d * inv(sa));

separable_fn!(darken, |s, d, sa, da| s + d - (s * da).max(d * sa));
separable_fn!(lighten, |s, d, sa, da| s + d - (s * da).min(d * sa));
separable_fn!(difference, |s, d, sa, da| s + d - splat(2.0) * (s * da).min(d * sa));
separable_fn!(exclusion, |s, d, sa, da| s + d - splat(2.0) * s * d);

separable_fn!(colorburn, |s, d, sa, da| {
    let zero = splat(0.0);
    let burned = sa * (da - da.min((da - d) * sa / s)) + s * inv(da) + d * inv(sa);
    d.cmp_eq(da).blend(
        d + s * inv(da),
        s.cmp_eq(zero).blend(d * inv(sa), burned),
    )
});

separable_fn!(colordodge, |s, d, sa, da| {
    let zero = splat(0.0);
    let dodged = sa * da.min((d * sa) / (sa - s)) + s * inv(da) + d * inv(sa);
    d.cmp_eq(zero).blend(
        s * inv(da),
        s.cmp_eq(sa).blend(s + d * inv(sa), dodged),
    )
});

separable_fn!(hardlight, |s, d, sa, da| {
    let two = splat(2.0);
    s * inv(da)
        + d * inv(sa)
        + (two * s)
            .cmp_le(sa)
            .blend(two * s * d, sa * da - two * (da - d) * (sa - s))
});

separable_fn!(overlay, |s, d, sa, da| {
    let two = splat(2.0);
    s * inv(da)
        + d * inv(sa)
        + (two * d)
            .cmp_le(da)
            .blend(two * s * d, sa * da - two * (da - d) * (sa - s))
});

separable_fn!(softlight, |s, d, sa, da| {
    let zero = splat(0.0);
    let one = splat(1.0);
    let two = splat(2.0);
    let four = splat(4.0);

    // Unpremultiplied destination, guarded against empty destinations.
    let m = da.cmp_gt(zero).blend(d / da, zero);
    let s2 = two * s;
    let m4 = four * m;

    let dark_src = d * (sa + (s2 - sa) * (one - m));
    let dark_dst = (m4 * m4 + m4) * (m - one) + splat(7.0) * m;
    let lite_dst = m.sqrt() - m;
    let lite_src =
        d * sa + da * (s2 - sa) * (four * d).cmp_le(da).blend(dark_dst, lite_dst);
    s * inv(da) + d * inv(sa) + s2.cmp_le(sa).blend(dark_src, lite_src)
});
