use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(Rgba::parse("#fff").unwrap(), Rgba::new(255.0, 255.0, 255.0, 1.0));
    assert_eq!(Rgba::parse("#102030").unwrap(), Rgba::new(16.0, 32.0, 48.0, 1.0));
    let c = Rgba::parse("#00000080").unwrap();
    assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
    assert!(Rgba::parse("#12345").is_err());
    assert!(Rgba::parse("#gg0000").is_err());
}

#[test]
fn parses_functional_and_named_forms() {
    assert_eq!(
        Rgba::parse("rgb(1, 2, 3)").unwrap(),
        Rgba::new(1.0, 2.0, 3.0, 1.0)
    );
    assert_eq!(
        Rgba::parse("RGBA(1, 2, 3, 0.25)").unwrap(),
        Rgba::new(1.0, 2.0, 3.0, 0.25)
    );
    assert_eq!(Rgba::parse("white").unwrap(), Rgba::new(255.0, 255.0, 255.0, 1.0));
    assert!(Rgba::parse("rgb(1, 2)").is_err());
    assert!(Rgba::parse("mauve-ish").is_err());
}

#[test]
fn display_uses_rgb_when_opaque_and_rgba_otherwise() {
    assert_eq!(Rgba::new(127.5, 0.0, 255.0, 1.0).to_string(), "rgb(128, 0, 255)");
    assert_eq!(Rgba::new(10.0, 20.0, 30.0, 0.5).to_string(), "rgba(10, 20, 30, 0.5)");
}

#[test]
fn lerp_carries_alpha_separately() {
    let a = Rgba::new(0.0, 0.0, 0.0, 1.0);
    let b = Rgba::new(255.0, 255.0, 255.0, 0.0);
    let mid = a.lerp(b, 0.5);
    assert_eq!(mid.r, 127.5);
    assert_eq!(mid.a, 0.5);
}
