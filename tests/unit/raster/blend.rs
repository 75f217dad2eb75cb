use super::*;

#[test]
fn src_appends_nothing() {
    let mut p = Pipeline::new();
    assert!(BlendMode::Src.append_stages(&mut p));
    assert!(p.is_empty());
}

#[test]
fn supported_modes_map_to_one_stage() {
    let mut p = Pipeline::new();
    assert!(BlendMode::SrcOver.append_stages(&mut p));
    assert!(BlendMode::Exclusion.append_stages(&mut p));
    let kinds: Vec<_> = p.stages().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StageKind::SrcOver, StageKind::Exclusion]);
}

#[test]
fn non_separable_modes_are_unsupported() {
    for mode in [
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ] {
        let mut p = Pipeline::new();
        assert!(!mode.is_supported());
        assert!(!mode.append_stages(&mut p));
        assert!(p.is_empty());
    }
}

#[test]
fn only_plus_overflows() {
    assert!(BlendMode::Plus.can_overflow());
    assert!(!BlendMode::Screen.can_overflow());
    assert_eq!(BlendMode::default(), BlendMode::SrcOver);
}

#[test]
fn serde_names_are_snake_case() {
    let mode: BlendMode = serde_json::from_str("\"color_dodge\"").unwrap();
    assert_eq!(mode, BlendMode::ColorDodge);
    assert_eq!(
        serde_json::to_string(&BlendMode::SrcAtop).unwrap(),
        "\"src_atop\""
    );
}
