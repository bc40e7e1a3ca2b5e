use super::*;

#[test]
fn resolution_rejects_zero_sides() {
    assert!(Resolution::new(0, 10).is_err());
    assert!(Resolution::new(10, 0).is_err());
    assert!(Resolution::new(1, 1).is_ok());
}

#[test]
fn resolution_parses_and_displays_wxh() {
    let r: Resolution = "1920x1080".parse().unwrap();
    assert_eq!(r, Resolution::new(1920, 1080).unwrap());
    assert_eq!(r.to_string(), "1920x1080");
    assert_eq!(" 640 X 480 ".parse::<Resolution>().unwrap().height(), 480);
    assert!("1920".parse::<Resolution>().is_err());
    assert!("axb".parse::<Resolution>().is_err());
}

#[test]
fn resolution_ratio_and_area() {
    let r = Resolution::new(1280, 720).unwrap();
    assert!((r.ratio() - 16.0 / 9.0).abs() < 1e-12);
    assert_eq!(r.area(), 921_600);
    assert!(r.is_even());
    assert!(!Resolution::new(799, 800).unwrap().is_even());
}

#[test]
fn resolution_serde_uses_string_form() {
    let r: Resolution = serde_json::from_value(serde_json::json!("800x600")).unwrap();
    assert_eq!(r, Resolution::new(800, 600).unwrap());
    assert_eq!(serde_json::to_value(r).unwrap(), serde_json::json!("800x600"));
    assert!(serde_json::from_value::<Resolution>(serde_json::json!("0x600")).is_err());
}

#[test]
fn rgb_parses_hex_with_and_without_hash() {
    assert_eq!("#ff8000".parse::<Rgb8>().unwrap(), Rgb8::new(255, 128, 0));
    assert_eq!("00FF00".parse::<Rgb8>().unwrap(), Rgb8::new(0, 255, 0));
    assert!("#fff".parse::<Rgb8>().is_err());
    assert!("#gg0000".parse::<Rgb8>().is_err());
    assert_eq!(Rgb8::new(1, 2, 255).to_hex(), "#0102ff");
}

#[test]
fn rgb_luma_matches_extremes() {
    assert_eq!(Rgb8::WHITE.luma(), 255);
    assert_eq!(Rgb8::BLACK.luma(), 0);
    assert!(Rgb8::new(0, 0, 255).luma() < 127);
    assert!(Rgb8::new(0, 255, 0).luma() >= 127);
}
