use super::*;
use crate::foundation::core::PremulColor;
use crate::pipeline::stage::MemoryCtx;

/// Runs `constant_color(white) -> swap_src_dst -> shader -> srcin` over `n` pixels of row 0.
fn shade(shader: &dyn Shader, ctm: Affine, n: usize) -> Vec<[f32; 4]> {
    let out = Rc::new(MemoryCtx::zeroed(n * 16));
    let mut p = Pipeline::new();
    p.append(
        StageKind::ConstantColor,
        Rc::new(Cell::new(PremulColor::from_array([1.0; 4]))),
    );
    p.push(StageKind::SwapSrcDst);
    assert!(shader.append_stages(&mut p, &ctm));
    p.push(StageKind::SrcIn);
    p.append(StageKind::StoreF32, out.clone());
    p.compile().run(0, 0, n);
    let bytes = out.bytes();
    bytes
        .chunks_exact(16)
        .map(|px| {
            std::array::from_fn(|i| {
                f32::from_le_bytes([px[4 * i], px[4 * i + 1], px[4 * i + 2], px[4 * i + 3]])
            })
        })
        .collect()
}

#[test]
fn color_shader_is_constant() {
    let shader = ColorShader::new(Color::new(0.0, 1.0, 0.0, 0.5));
    assert!(shader.is_constant());
    assert!(!shader.is_opaque());
    let px = shade(&shader, Affine::IDENTITY, 2);
    assert_eq!(px[1], [0.0, 0.5, 0.0, 0.5]);
}

#[test]
fn linear_gradient_follows_pixel_centers() {
    let shader = LinearGradientShader::new(
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        [Color::BLACK, Color::WHITE],
    );
    assert!(shader.is_opaque());
    assert!(!shader.is_constant());
    let px = shade(&shader, Affine::IDENTITY, 5);
    for (i, expected) in [0.125, 0.375, 0.625, 0.875, 1.0].into_iter().enumerate() {
        assert!((px[i][0] - expected).abs() < 1e-6, "{i}: {:?}", px[i]);
        assert_eq!(px[i][3], 1.0);
    }
}

#[test]
fn linear_gradient_honors_the_ctm() {
    let shader = LinearGradientShader::new(
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        [Color::BLACK, Color::WHITE],
    );
    let px = shade(&shader, Affine::scale(2.0), 4);
    assert!((px[3][0] - 3.5 / 8.0).abs() < 1e-6);
}

#[test]
fn degenerate_gradients_decline() {
    let same = LinearGradientShader::new(Point::ORIGIN, Point::ORIGIN, [Color::BLACK; 2]);
    let mut p = Pipeline::new();
    assert!(!same.append_stages(&mut p, &Affine::IDENTITY));
    let shader = LinearGradientShader::new(Point::ORIGIN, Point::new(1.0, 0.0), [Color::BLACK; 2]);
    assert!(!shader.append_stages(&mut p, &Affine::scale(0.0)));
    assert!(p.is_empty());
}

#[test]
fn matrix_filter_layout_and_alpha_flag() {
    let mut rows = [[0.0f32; 5]; 4];
    rows[0][1] = 1.0;
    rows[1][0] = 1.0;
    rows[2][2] = 1.0;
    rows[3][3] = 1.0;
    let filter = MatrixColorFilter::new(rows);
    assert!(filter.alpha_unchanged());
    let m = filter.column_major();
    assert_eq!(m[4], 1.0); // green input feeds red output
    assert_eq!(m[1], 1.0); // red input feeds green output
    assert_eq!(m[15], 1.0);

    let mut p = Pipeline::new();
    assert!(filter.append_stages(&mut p, true));
    assert_eq!(p.stages()[0].kind, StageKind::Matrix4x5);
    let mut p = Pipeline::new();
    assert!(filter.append_stages(&mut p, false));
    assert_eq!(p.stages()[0].kind, StageKind::Unpremul);
    assert_eq!(p.stages().last().map(|s| s.kind), Some(StageKind::Premul));

    assert!(MatrixColorFilter::from_slice(&[0.0; 19]).is_none());
    let from_slice = MatrixColorFilter::from_slice(&rows.concat()).unwrap();
    assert_eq!(from_slice, filter);
}

#[test]
fn luma_filter_changes_alpha() {
    assert!(!LumaColorFilter.alpha_unchanged());
    let mut p = Pipeline::new();
    assert!(LumaColorFilter.append_stages(&mut p, true));
    assert_eq!(p.stages()[0].kind, StageKind::LuminanceToAlpha);
}

#[test]
fn paint_builders() {
    let paint = Paint::from_color(Color::WHITE)
        .with_blend_mode(BlendMode::Plus)
        .with_shader(Rc::new(ColorShader::new(Color::BLACK)))
        .with_color_filter(Rc::new(LumaColorFilter));
    assert_eq!(paint.blend_mode, BlendMode::Plus);
    assert!(paint.shader.is_some());
    assert!(paint.color_filter.is_some());
    assert_eq!(Paint::default().color, Color::BLACK);
}
