use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::color::transfer::TransferFn;
use crate::foundation::core::PremulColor;
use crate::pipeline::engine::{Flow, Registers};
use crate::pipeline::stage::{MemoryCtx, StageCtx};

fn regs(src: [f32; 4], dst: [f32; 4]) -> Registers {
    let mut p = Registers::seeded(0, 0, 0);
    [p.r, p.g, p.b, p.a] = src.map(splat);
    [p.dr, p.dg, p.db, p.da] = dst.map(splat);
    p
}

fn src(p: &Registers) -> [f32; 4] {
    [p.r, p.g, p.b, p.a].map(|c| c.to_array()[0])
}

fn blend(kind: StageKind, s: [f32; 4], d: [f32; 4]) -> [f32; 4] {
    let mut p = regs(s, d);
    assert_eq!(kernel(kind)(&mut p, &StageCtx::None), Flow::Continue);
    src(&p)
}

fn close(a: [f32; 4], b: [f32; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
}

fn memory(bytes: Vec<u8>) -> StageCtx {
    Rc::new(MemoryCtx::new(bytes)).into()
}

#[test]
fn porter_duff_modes() {
    let s = [0.5, 0.0, 0.0, 0.5];
    let d = [0.0, 0.0, 1.0, 1.0];
    assert!(close(blend(StageKind::SrcOver, s, d), [0.5, 0.0, 0.5, 1.0]));
    assert!(close(blend(StageKind::DstOver, s, d), d));
    assert!(close(blend(StageKind::Clear, s, d), [0.0; 4]));
    assert!(close(blend(StageKind::Dst, s, d), d));
    assert!(close(blend(StageKind::SrcIn, s, d), s));
    assert!(close(blend(StageKind::DstIn, s, d), [0.0, 0.0, 0.5, 0.5]));
    assert!(close(blend(StageKind::SrcOut, s, d), [0.0; 4]));
    assert!(close(blend(StageKind::DstOut, s, d), [0.0, 0.0, 0.5, 0.5]));
    assert!(close(blend(StageKind::SrcAtop, s, d), [0.5, 0.0, 0.5, 1.0]));
    assert!(close(blend(StageKind::DstAtop, s, d), [0.0, 0.0, 0.5, 0.5]));
    assert!(close(blend(StageKind::Xor, s, d), [0.0, 0.0, 0.5, 0.5]));
    assert!(close(blend(StageKind::Modulate, s, d), [0.0, 0.0, 0.0, 0.5]));
}

#[test]
fn plus_is_unclamped_until_clamp_a() {
    let out = blend(StageKind::Plus, [0.8; 4], [0.8; 4]);
    assert!(close(out, [1.6; 4]));
    let mut p = regs(out, [0.0; 4]);
    kernel(StageKind::ClampA)(&mut p, &StageCtx::None);
    assert!(close(src(&p), [1.0; 4]));
}

#[test]
fn multiply_and_screen_on_opaque_colors() {
    let s = [0.5, 0.25, 1.0, 1.0];
    let d = [0.5, 1.0, 0.0, 1.0];
    assert!(close(blend(StageKind::Multiply, s, d), [0.25, 0.25, 0.0, 1.0]));
    assert!(close(blend(StageKind::Screen, s, d), [0.75, 1.0, 1.0, 1.0]));
}

#[test]
fn separable_modes_on_opaque_colors() {
    let s = [0.2, 0.5, 0.75, 1.0];
    let d = [0.6, 0.25, 0.5, 1.0];
    assert!(close(blend(StageKind::Darken, s, d), [0.2, 0.25, 0.5, 1.0]));
    assert!(close(blend(StageKind::Lighten, s, d), [0.6, 0.5, 0.75, 1.0]));
    assert!(close(blend(StageKind::Difference, s, d), [0.4, 0.25, 0.25, 1.0]));
    assert!(close(
        blend(StageKind::Exclusion, s, d),
        [0.56, 0.5, 0.5, 1.0]
    ));
    // Overlay keys off the destination, hard-light off the source.
    assert!(close(blend(StageKind::Overlay, s, d), [0.36, 0.25, 0.75, 1.0]));
    assert!(close(blend(StageKind::HardLight, s, d), [0.24, 0.25, 0.75, 1.0]));
    // Soft-light with a mid-grey source leaves the destination alone.
    assert!(close(
        blend(StageKind::SoftLight, [0.5, 0.5, 0.5, 1.0], d),
        [0.6, 0.25, 0.5, 1.0]
    ));
}

#[test]
fn separable_alpha_is_source_over() {
    let out = blend(StageKind::Darken, [0.1, 0.1, 0.1, 0.5], [0.2, 0.2, 0.2, 0.5]);
    assert!((out[3] - 0.75).abs() < 1e-6);
}

#[test]
fn dodge_and_burn_avoid_nan_at_edges() {
    let burn = blend(StageKind::ColorBurn, [0.0, 0.5, 0.5, 1.0], [0.5, 1.0, 0.0, 1.0]);
    assert!(burn.iter().all(|v| v.is_finite()));
    assert!(close(burn, [0.0, 1.0, 0.0, 1.0]));
    let dodge = blend(StageKind::ColorDodge, [1.0, 0.5, 0.5, 1.0], [0.5, 0.0, 0.25, 1.0]);
    assert!(dodge.iter().all(|v| v.is_finite()));
    assert!(close(dodge, [1.0, 0.0, 0.5, 1.0]));
}

#[test]
fn alpha_conversions() {
    let mut p = regs([0.5, 0.25, 1.0, 0.5], [0.0; 4]);
    kernel(StageKind::Premul)(&mut p, &StageCtx::None);
    assert!(close(src(&p), [0.25, 0.125, 0.5, 0.5]));
    kernel(StageKind::Unpremul)(&mut p, &StageCtx::None);
    assert!(close(src(&p), [0.5, 0.25, 1.0, 0.5]));

    let mut p = regs([0.5, 0.5, 0.5, 0.0], [0.0; 4]);
    kernel(StageKind::Unpremul)(&mut p, &StageCtx::None);
    assert_eq!(src(&p), [0.0; 4]);
}

#[test]
fn clamps_and_swaps() {
    let mut p = regs([-1.0, 2.0, 0.5, 1.5], [0.0; 4]);
    kernel(StageKind::Clamp0)(&mut p, &StageCtx::None);
    kernel(StageKind::Clamp1)(&mut p, &StageCtx::None);
    assert_eq!(src(&p), [0.0, 1.0, 0.5, 1.0]);
    kernel(StageKind::SwapRb)(&mut p, &StageCtx::None);
    assert_eq!(src(&p), [0.5, 1.0, 0.0, 1.0]);
    kernel(StageKind::MoveSrcDst)(&mut p, &StageCtx::None);
    assert_eq!(p.dr.to_array()[0], 0.5);
}

#[test]
fn luminance_to_alpha_weights() {
    let mut p = regs([1.0, 1.0, 1.0, 0.3], [0.0; 4]);
    kernel(StageKind::LuminanceToAlpha)(&mut p, &StageCtx::None);
    assert!(close(src(&p), [0.0, 0.0, 0.0, 1.0]));
    let mut p = regs([0.0, 1.0, 0.0, 0.0], [0.0; 4]);
    kernel(StageKind::LuminanceToAlpha)(&mut p, &StageCtx::None);
    assert!((src(&p)[3] - 0.7152).abs() < 1e-6);
}

#[test]
fn matrices_are_column_major() {
    let mut m = [0.0f32; 12];
    // r' = g, g' = r, b' = b + 0.25
    m[3] = 1.0;
    m[1] = 1.0;
    m[8] = 1.0;
    m[11] = 0.25;
    let mut p = regs([0.1, 0.2, 0.3, 0.4], [0.0; 4]);
    kernel(StageKind::Matrix3x4)(&mut p, &Rc::new(m).into());
    assert!(close(src(&p), [0.2, 0.1, 0.55, 0.4]));

    let mut m = [0.0f32; 20];
    // a' = r, r' = 0.5
    m[3] = 1.0;
    m[16] = 0.5;
    let mut p = regs([0.1, 0.2, 0.3, 0.4], [0.0; 4]);
    kernel(StageKind::Matrix4x5)(&mut p, &Rc::new(m).into());
    assert!(close(src(&p), [0.5, 0.0, 0.0, 0.1]));
}

#[test]
fn parametric_and_table_touch_one_channel() {
    let f: StageCtx = Rc::new(TransferFn::from_exponent(2.0)).into();
    let mut p = regs([0.5, 0.5, 0.5, 1.0], [0.0; 4]);
    kernel(StageKind::ParametricG)(&mut p, &f);
    assert!(close(src(&p), [0.5, 0.25, 0.5, 1.0]));

    let table: StageCtx = Rc::<[f32]>::from(vec![0.0, 0.5, 1.0]).into();
    let mut p = regs([0.25, 2.0, -1.0, 1.0], [0.0; 4]);
    kernel(StageKind::TableR)(&mut p, &table);
    kernel(StageKind::TableG)(&mut p, &table);
    kernel(StageKind::TableB)(&mut p, &table);
    assert!(close(src(&p), [0.25, 1.0, 0.0, 1.0]));
}

#[test]
fn lab_white_maps_to_d50() {
    let mid = 128.0 / 255.0;
    let mut p = regs([1.0, mid, mid, 1.0], [0.0; 4]);
    kernel(StageKind::LabToXyz)(&mut p, &StageCtx::None);
    assert!(close(src(&p), [0.9642, 1.0, 0.8249, 1.0]));

    let mut p = regs([0.0, mid, mid, 1.0], [0.0; 4]);
    kernel(StageKind::LabToXyz)(&mut p, &StageCtx::None);
    assert!(close(src(&p), [0.0, 0.0, 0.0, 1.0]));
}

#[test]
fn constant_color_reads_the_cell() {
    let cell = Rc::new(Cell::new(PremulColor::from_array([0.1, 0.2, 0.3, 0.4])));
    let ctx: StageCtx = cell.clone().into();
    let mut p = regs([0.0; 4], [0.0; 4]);
    kernel(StageKind::ConstantColor)(&mut p, &ctx);
    assert_eq!(src(&p), [0.1, 0.2, 0.3, 0.4]);
    cell.set(PremulColor::TRANSPARENT);
    kernel(StageKind::ConstantColor)(&mut p, &ctx);
    assert_eq!(src(&p), [0.0; 4]);
}

#[test]
fn load_8888_fills_the_right_registers() {
    let ctx = memory(vec![255, 0, 51, 255, 0, 255, 0, 0]);
    let mut p = Registers::seeded(0, 0, 2);
    kernel(StageKind::LoadD8888)(&mut p, &ctx);
    assert_eq!(p.dr.to_array(), [1.0, 0.0, 0.0, 0.0]);
    assert_eq!(p.dg.to_array(), [0.0, 1.0, 0.0, 0.0]);
    assert!((p.db.to_array()[0] - 0.2).abs() < 1e-6);
    assert_eq!(p.r.to_array(), [0.0; 4]);
}

#[test]
fn load_565_expands_channels() {
    let ctx = memory(0xf800u16.to_le_bytes().into_iter().chain(0x07e0u16.to_le_bytes()).collect());
    let mut p = Registers::seeded(0, 0, 2);
    kernel(StageKind::LoadS565)(&mut p, &ctx);
    assert_eq!(&p.r.to_array()[..2], &[1.0, 0.0]);
    assert_eq!(&p.g.to_array()[..2], &[0.0, 1.0]);
    assert_eq!(&p.a.to_array()[..2], &[1.0, 1.0]);
}

#[test]
fn stores_round_and_clamp() {
    let out = Rc::new(MemoryCtx::zeroed(4));
    let mut p = regs([0.5, -0.2, 1.7, 1.0], [0.0; 4]);
    p.tail = 1;
    kernel(StageKind::Store8888)(&mut p, &StageCtx::Memory(out.clone()));
    assert_eq!(&out.bytes()[..], &[128, 0, 255, 255]);

    let out = Rc::new(MemoryCtx::zeroed(2));
    let mut p = regs([1.0, 0.5, 0.0, 1.0], [0.0; 4]);
    p.tail = 1;
    kernel(StageKind::Store565)(&mut p, &StageCtx::Memory(out.clone()));
    let v = u16::from_le_bytes([out.bytes()[0], out.bytes()[1]]);
    assert_eq!(v, 31 << 11 | 32 << 5);
}

#[test]
fn f16_store_then_load_keeps_values() {
    let out = Rc::new(MemoryCtx::zeroed(8 * 4));
    let ctx = StageCtx::Memory(out.clone());
    let mut p = regs([0.25, 0.5, 2.0, 1.0], [0.0; 4]);
    kernel(StageKind::StoreF16)(&mut p, &ctx);
    let mut q = Registers::seeded(0, 0, 0);
    kernel(StageKind::LoadSF16)(&mut q, &ctx);
    assert_eq!(src(&q), [0.25, 0.5, 2.0, 1.0]);
}

#[test]
fn zero_coverage_continues_with_the_covered_result() {
    let ctx = memory(vec![0, 0, 255, 255]);
    let mut p = regs([1.0; 4], [0.25; 4]);
    p.tail = 2;
    assert_eq!(kernel(StageKind::ScaleU8)(&mut p, &ctx), Flow::Continue);
    assert_eq!(p.r.to_array()[..2], [0.0, 0.0]);

    let mut p = regs([1.0; 4], [0.25; 4]);
    p.tail = 2;
    assert_eq!(kernel(StageKind::LerpU8)(&mut p, &ctx), Flow::Continue);
    assert_eq!(p.r.to_array()[..2], [0.25, 0.25]);

    let mut p = regs([1.0; 4], [0.0; 4]);
    assert_eq!(kernel(StageKind::ScaleU8)(&mut p, &ctx), Flow::Continue);
    assert_eq!(p.r.to_array(), [0.0, 0.0, 1.0, 1.0]);

    let none: StageCtx = Rc::new(Cell::new(0.0f32)).into();
    let mut p = regs([1.0; 4], [0.5; 4]);
    assert_eq!(kernel(StageKind::LerpConstantFloat)(&mut p, &none), Flow::Continue);
    assert!(close(src(&p), [0.5; 4]));
    assert_eq!(kernel(StageKind::ScaleConstantFloat)(&mut p, &none), Flow::Continue);
    assert!(close(src(&p), [0.0; 4]));
}

#[test]
fn lerp_moves_from_destination_toward_source() {
    let ctx = memory(vec![0, 51, 255, 0]);
    let mut p = regs([1.0; 4], [0.0, 0.0, 0.0, 0.5]);
    assert_eq!(kernel(StageKind::LerpU8)(&mut p, &ctx), Flow::Continue);
    let a = p.a.to_array();
    assert!((a[1] - 0.6).abs() < 1e-6);
    assert_eq!(a[0], 0.5);
    assert_eq!(a[2], 1.0);

    let coverage: StageCtx = Rc::new(Cell::new(0.25f32)).into();
    let mut p = regs([1.0; 4], [0.0; 4]);
    kernel(StageKind::LerpConstantFloat)(&mut p, &coverage);
    assert!(close(src(&p), [0.25; 4]));
    kernel(StageKind::ScaleConstantFloat)(&mut p, &coverage);
    assert!(close(src(&p), [0.0625; 4]));
}

#[test]
fn lerp_565_uses_per_channel_coverage() {
    // Red fully covered, green and blue not.
    let ctx = memory([0xf800u16; 4].iter().flat_map(|v| v.to_le_bytes()).collect());
    let mut p = regs([1.0; 4], [0.0, 0.0, 0.0, 0.0]);
    assert_eq!(kernel(StageKind::Lerp565)(&mut p, &ctx), Flow::Continue);
    assert!(close(src(&p), [1.0, 0.0, 0.0, 1.0]));

    let zeros = memory(vec![0; 8]);
    let mut p = regs([1.0; 4], [0.5, 0.25, 0.0, 0.75]);
    assert_eq!(kernel(StageKind::Lerp565)(&mut p, &zeros), Flow::Continue);
    assert!(close(src(&p), [0.5, 0.25, 0.0, 0.75]));
}
