use super::*;

#[test]
fn premultiply_scales_color_channels() {
    let c = Color::new(1.0, 0.5, 0.25, 0.5).premultiply();
    assert_eq!(c, PremulColor::from_array([0.5, 0.25, 0.125, 0.5]));
    assert!(!c.is_opaque());
    assert!(Color::WHITE.premultiply().is_opaque());
}

#[test]
fn srgb8_decoding_is_linear() {
    let c = Color::from_srgb8(255, 0, 188, 51);
    assert!((c.r - 1.0).abs() < 1e-6);
    assert_eq!(c.g, 0.0);
    assert!((c.b - 0.5).abs() < 0.01);
    assert!((c.a - 0.2).abs() < 1e-6);
}

#[test]
fn color_validation_rejects_out_of_range_and_nan() {
    assert!(Color::new(0.0, 0.5, 1.0, 1.0).validate().is_ok());
    assert!(Color::new(1.5, 0.0, 0.0, 1.0).validate().is_err());
    assert!(Color::new(f32::NAN, 0.0, 0.0, 1.0).validate().is_err());
}

#[test]
fn rect_validation_and_extents() {
    let r = IntRect::from_xywh(2, 3, 4, 5).unwrap();
    assert_eq!((r.right, r.bottom), (6, 8));
    assert_eq!((r.width(), r.height()), (4, 5));
    assert!(IntRect::from_xywh(0, 0, -1, 1).is_err());
    assert!(IntRect::from_xywh(i32::MAX, 0, 1, 1).is_err());
    assert!(IntRect::from_xywh(0, 0, 0, 3).unwrap().is_empty());
}

#[test]
fn rect_intersection_and_containment() {
    let a = IntRect::from_xywh(0, 0, 10, 10).unwrap();
    let b = IntRect::from_xywh(5, -5, 10, 10).unwrap();
    let i = a.intersect(&b).unwrap();
    assert_eq!(i, IntRect::from_xywh(5, 0, 5, 5).unwrap());
    assert!(i.contains(5, 0));
    assert!(!i.contains(10, 0));
    let far = IntRect::from_xywh(20, 20, 1, 1).unwrap();
    assert!(a.intersect(&far).is_none());
}
