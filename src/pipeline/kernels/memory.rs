use wide::f32x4;

use crate::foundation::math::{
    SRGB_TO_LINEAR, f16_bits_to_f32, f32_to_f16_bits, linear_to_srgb_u8, unit_to_levels,
    unit_to_u8,
};
use crate::pipeline::engine::{Flow, Registers, STAGE_WIDTH};
use crate::pipeline::stage::{MemoryCtx, StageCtx};

type Decode = fn(&[u8]) -> [f32; 4];
type Encode = fn([f32; 4], &mut [u8]);

/// Decode the valid lanes of the block; invalid lanes load as zero.
fn load(ctx: &MemoryCtx, p: &Registers, bpp: usize, decode: Decode) -> [f32x4; 4] {
    let mut channels = [[0.0f32; STAGE_WIDTH]; 4];
    ctx.with_pixels(p.x, bpp, p.lanes(), |bytes| {
        for (lane, px) in bytes.chunks_exact(bpp).enumerate() {
            for (channel, v) in channels.iter_mut().zip(decode(px)) {
                channel[lane] = v;
            }
        }
    });
    channels.map(f32x4::from)
}

/// Encode the valid lanes of the block; memory past them is untouched.
fn store(ctx: &MemoryCtx, p: &Registers, bpp: usize, encode: Encode) {
    let [r, g, b, a] = [p.r, p.g, p.b, p.a].map(|c| c.to_array());
    ctx.with_pixels_mut(p.x, bpp, p.lanes(), |bytes| {
        for (lane, px) in bytes.chunks_exact_mut(bpp).enumerate() {
            encode([r[lane], g[lane], b[lane], a[lane]], px);
        }
    });
}

macro_rules! memory_format {
    ($load_s:ident, $load_d:ident, $store:ident, $bpp:expr, $decode:path, $encode:path) => {
        pub(super) fn $load_s(p: &mut Registers, ctx: &StageCtx) -> Flow {
            [p.r, p.g, p.b, p.a] = load(ctx.memory(), p, $bpp, $decode);
            Flow::Continue
        }

        pub(super) fn $load_d(p: &mut Registers, ctx: &StageCtx) -> Flow {
            [p.dr, p.dg, p.db, p.da] = load(ctx.memory(), p, $bpp, $decode);
            Flow::Continue
        }

        pub(super) fn $store(p: &mut Registers, ctx: &StageCtx) -> Flow {
            store(ctx.memory(), p, $bpp, $encode);
            Flow::Continue
        }
    };
}

memory_format!(load_s_8888, load_d_8888, store_8888, 4, decode_8888, encode_8888);
memory_format!(load_s_srgb, load_d_srgb, store_srgb, 4, decode_srgb, encode_srgb);
memory_format!(load_s_565, load_d_565, store_565, 2, decode_565, encode_565);
memory_format!(load_s_f16, load_d_f16, store_f16, 8, decode_f16, encode_f16);
memory_format!(load_s_f32, load_d_f32, store_f32, 16, decode_f32, encode_f32);

fn decode_8888(px: &[u8]) -> [f32; 4] {
    [px[0], px[1], px[2], px[3]].map(|v| f32::from(v) * (1.0 / 255.0))
}

fn encode_8888(c: [f32; 4], px: &mut [u8]) {
    px.copy_from_slice(&c.map(unit_to_u8));
}

fn decode_srgb(px: &[u8]) -> [f32; 4] {
    [
        SRGB_TO_LINEAR[usize::from(px[0])],
        SRGB_TO_LINEAR[usize::from(px[1])],
        SRGB_TO_LINEAR[usize::from(px[2])],
        f32::from(px[3]) * (1.0 / 255.0),
    ]
}

fn encode_srgb([r, g, b, a]: [f32; 4], px: &mut [u8]) {
    px.copy_from_slice(&[
        linear_to_srgb_u8(r),
        linear_to_srgb_u8(g),
        linear_to_srgb_u8(b),
        unit_to_u8(a),
    ]);
}

pub(super) fn unpack_565(v: u16) -> [f32; 3] {
    [
        f32::from((v >> 11) & 0x1f) * (1.0 / 31.0),
        f32::from((v >> 5) & 0x3f) * (1.0 / 63.0),
        f32::from(v & 0x1f) * (1.0 / 31.0),
    ]
}

fn decode_565(px: &[u8]) -> [f32; 4] {
    let [r, g, b] = unpack_565(u16::from_le_bytes([px[0], px[1]]));
    [r, g, b, 1.0]
}

fn encode_565([r, g, b, _]: [f32; 4], px: &mut [u8]) {
    let v = unit_to_levels(r, 31) << 11 | unit_to_levels(g, 63) << 5 | unit_to_levels(b, 31);
    px.copy_from_slice(&v.to_le_bytes());
}

fn decode_f16(px: &[u8]) -> [f32; 4] {
    std::array::from_fn(|i| f16_bits_to_f32(u16::from_le_bytes([px[2 * i], px[2 * i + 1]])))
}

fn encode_f16(c: [f32; 4], px: &mut [u8]) {
    for (dst, v) in px.chunks_exact_mut(2).zip(c) {
        dst.copy_from_slice(&f32_to_f16_bits(v).to_le_bytes());
    }
}

fn decode_f32(px: &[u8]) -> [f32; 4] {
    std::array::from_fn(|i| {
        f32::from_le_bytes([px[4 * i], px[4 * i + 1], px[4 * i + 2], px[4 * i + 3]])
    })
}

fn encode_f32(c: [f32; 4], px: &mut [u8]) {
    for (dst, v) in px.chunks_exact_mut(4).zip(c) {
        dst.copy_from_slice(&v.to_le_bytes());
    }
}
