use super::*;
use crate::color::space::ColorGamma;
use crate::color::transfer::GammaNamed;

#[test]
fn xform_config_round_trips() {
    let config = XformConfig {
        src: SourceSpace::Xyz(XyzColorSpace::srgb()),
        dst: XyzColorSpace::linear_srgb(),
        alpha: AlphaType::Premul,
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"xyz\""));
    let back = XformConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(back, config);
    back.validate().unwrap();
}

#[test]
fn xform_alpha_defaults_to_unpremul() {
    let config = XformConfig {
        src: SourceSpace::A2b(A2BColorSpace::srgb()),
        dst: XyzColorSpace::srgb(),
        alpha: AlphaType::Premul,
    };
    let mut value = serde_json::to_value(&config).unwrap();
    value.as_object_mut().unwrap().remove("alpha");
    let back: XformConfig = serde_json::from_value(value).unwrap();
    assert_eq!(back.alpha, AlphaType::Unpremul);
    assert_eq!(back.src.to_a2b(), A2BColorSpace::srgb());
}

#[test]
fn singular_destination_fails_validation() {
    let mut dst = XyzColorSpace::srgb();
    dst.to_xyz_d50.rows[0] = [0.0; 4];
    let config = XformConfig {
        src: SourceSpace::Xyz(XyzColorSpace::srgb()),
        dst,
        alpha: AlphaType::Opaque,
    };
    assert!(config.validate().unwrap_err().is_unsupported());
}

#[test]
fn parse_errors_are_serde_errors() {
    let err = XformConfig::from_reader("{ not json".as_bytes()).unwrap_err();
    assert!(matches!(err, PipelineError::Serde(_)));
    assert!(err.to_string().contains("color transform"));
}

#[test]
fn missing_file_is_reported_with_its_path() {
    let err = PaintConfig::from_path("/nonexistent/paint.json").unwrap_err();
    assert!(matches!(err, PipelineError::Other(_)));
    assert!(format!("{err:#}").contains("/nonexistent/paint.json"));
}

#[test]
fn paint_config_parses_tagged_shaders_and_filters() {
    let json = r#"{
        "color": { "r": 1.0, "g": 1.0, "b": 1.0, "a": 0.5 },
        "blend": "multiply",
        "shader": {
            "kind": "linear_gradient",
            "start": { "x": 0.0, "y": 0.0 },
            "end": { "x": 10.0, "y": 0.0 },
            "colors": [
                { "r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0 },
                { "r": 0.0, "g": 0.0, "b": 1.0, "a": 1.0 }
            ]
        },
        "color_filter": { "kind": "luma" }
    }"#;
    let config = PaintConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(config.blend, BlendMode::Multiply);
    assert!(matches!(config.shader, Some(ShaderConfig::LinearGradient { .. })));
    assert_eq!(config.color_filter, Some(ColorFilterConfig::Luma));

    let paint = config.to_paint().unwrap();
    assert_eq!(paint.blend_mode, BlendMode::Multiply);
    assert!(paint.shader.is_some());
    assert!(paint.color_filter.is_some());
}

#[test]
fn paint_blend_defaults_to_srcover() {
    let config: PaintConfig =
        serde_json::from_str(r#"{ "color": { "r": 0.0, "g": 0.0, "b": 0.0, "a": 1.0 } }"#)
            .unwrap();
    assert_eq!(config.blend, BlendMode::SrcOver);
    assert!(config.shader.is_none());
    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("shader"));
}

#[test]
fn paint_validation() {
    let base = PaintConfig {
        color: Color::WHITE,
        blend: BlendMode::SrcOver,
        shader: None,
        color_filter: None,
    };
    base.validate().unwrap();

    let bad_color = PaintConfig {
        color: Color::new(1.5, 0.0, 0.0, 1.0),
        ..base.clone()
    };
    assert!(bad_color.to_paint().is_err());

    let non_separable = PaintConfig {
        blend: BlendMode::Luminosity,
        ..base.clone()
    };
    assert!(non_separable.validate().unwrap_err().is_unsupported());

    let short_matrix = PaintConfig {
        color_filter: Some(ColorFilterConfig::Matrix {
            matrix: vec![0.0; 19],
        }),
        ..base.clone()
    };
    assert!(short_matrix.validate().is_err());

    let flat_gradient = PaintConfig {
        shader: Some(ShaderConfig::LinearGradient {
            start: Point::new(1.0, 1.0),
            end: Point::new(1.0, 1.0),
            colors: [Color::BLACK, Color::WHITE],
        }),
        ..base.clone()
    };
    assert!(flat_gradient.validate().is_err());

    let mut identity = vec![0.0; 20];
    for i in 0..4 {
        identity[i * 6] = 1.0;
    }
    let with_matrix = PaintConfig {
        color_filter: Some(ColorFilterConfig::Matrix { matrix: identity }),
        shader: Some(ShaderConfig::Color {
            color: Color::new(0.0, 0.0, 1.0, 1.0),
        }),
        ..base
    };
    let paint = with_matrix.to_paint().unwrap();
    assert!(paint.color_filter.is_some());
}

#[test]
fn destination_gamma_from_json() {
    let dst: XyzColorSpace = serde_json::from_value(serde_json::json!({
        "gamma": { "named": "2.2" },
        "to_xyz_d50": { "rows": [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]] }
    }))
    .unwrap();
    assert_eq!(dst.gamma, ColorGamma::Named(GammaNamed::TwoDotTwo));
}
