//! Stage kernels. Each one transforms the block registers and reports whether the chain goes
//! on; lane arithmetic uses `wide::f32x4`.

mod blend;
mod color;
mod control;
mod coverage;
mod memory;

use wide::f32x4;

use crate::pipeline::engine::StageFn;
use crate::pipeline::stage::StageKind;

/// Resolve a stage kind to its kernel.
pub(crate) fn kernel(kind: StageKind) -> StageFn {
    use StageKind as K;

    match kind {
        K::Trace => control::trace,
        K::Registers => control::registers,
        K::MoveSrcDst => control::move_src_dst,
        K::SwapSrcDst => control::swap_src_dst,
        K::SwapRb => control::swap_rb,
        K::Clamp0 => control::clamp_0,
        K::Clamp1 => control::clamp_1,
        K::ClampA => control::clamp_a,
        K::Premul => control::premul,
        K::Unpremul => control::unpremul,
        K::LuminanceToAlpha => control::luminance_to_alpha,
        K::ConstantColor => control::constant_color,

        K::LoadS8888 => memory::load_s_8888,
        K::LoadD8888 => memory::load_d_8888,
        K::Store8888 => memory::store_8888,
        K::LoadSSrgb => memory::load_s_srgb,
        K::LoadDSrgb => memory::load_d_srgb,
        K::StoreSrgb => memory::store_srgb,
        K::LoadS565 => memory::load_s_565,
        K::LoadD565 => memory::load_d_565,
        K::Store565 => memory::store_565,
        K::LoadSF16 => memory::load_s_f16,
        K::LoadDF16 => memory::load_d_f16,
        K::StoreF16 => memory::store_f16,
        K::LoadSF32 => memory::load_s_f32,
        K::LoadDF32 => memory::load_d_f32,
        K::StoreF32 => memory::store_f32,

        K::ScaleU8 => coverage::scale_u8,
        K::LerpU8 => coverage::lerp_u8,
        K::Lerp565 => coverage::lerp_565,
        K::ScaleConstantFloat => coverage::scale_constant_float,
        K::LerpConstantFloat => coverage::lerp_constant_float,

        K::Clear => blend::clear,
        K::Dst => blend::dst,
        K::SrcAtop => blend::srcatop,
        K::DstAtop => blend::dstatop,
        K::SrcIn => blend::srcin,
        K::DstIn => blend::dstin,
        K::SrcOut => blend::srcout,
        K::DstOut => blend::dstout,
        K::SrcOver => blend::srcover,
        K::DstOver => blend::dstover,
        K::Modulate => blend::modulate,
        K::Multiply => blend::multiply,
        K::Plus => blend::plus,
        K::Screen => blend::screen,
        K::Xor => blend::xor,
        K::ColorBurn => blend::colorburn,
        K::ColorDodge => blend::colordodge,
        K::Darken => blend::darken,
        K::Difference => blend::difference,
        K::Exclusion => blend::exclusion,
        K::HardLight => blend::hardlight,
        K::Lighten => blend::lighten,
        K::Overlay => blend::overlay,
        K::SoftLight => blend::softlight,

        K::Matrix3x4 => color::matrix_3x4,
        K::Matrix4x5 => color::matrix_4x5,
        K::ParametricR => color::parametric_r,
        K::ParametricG => color::parametric_g,
        K::ParametricB => color::parametric_b,
        K::TableR => color::table_r,
        K::TableG => color::table_g,
        K::TableB => color::table_b,
        K::ColorLookupTable => color::color_lookup_table,
        K::LabToXyz => color::lab_to_xyz,
    }
}

fn splat(v: f32) -> f32x4 {
    f32x4::splat(v)
}

fn inv(v: f32x4) -> f32x4 {
    splat(1.0) - v
}

fn lerp(from: f32x4, to: f32x4, t: f32x4) -> f32x4 {
    from + (to - from) * t
}

/// Apply a scalar function lane by lane.
fn map_lanes(v: f32x4, f: impl Fn(f32) -> f32) -> f32x4 {
    f32x4::from(v.to_array().map(f))
}

#[cfg(test)]
#[path = "../../../tests/unit/pipeline/kernels/mod.rs"]
mod tests;
