use std::path::Path;

use image::{Rgb, RgbImage};
use stillreel::{
    EmptyFolderPolicy, Resolution, ScanOptions, VideoConfig, consensus, prepare, scan_folders,
};

fn write_png(dir: &Path, name: &str, w: u32, h: u32) {
    RgbImage::from_pixel(w, h, Rgb([10, 20, 30]))
        .save_with_format(dir.join(name), image::ImageFormat::Png)
        .unwrap();
}

#[test]
fn scanned_sizes_drive_the_canvas_and_banners_do_not_vote() {
    let root = tempfile::tempdir().unwrap();
    let a = root.path().join("a");
    let empty = root.path().join("empty");
    std::fs::create_dir_all(&a).unwrap();
    std::fs::create_dir_all(&empty).unwrap();
    for i in 0..3 {
        write_png(&a, &format!("wide_{i}.png"), 41, 30);
    }
    write_png(&a, "square_1.png", 30, 30);
    write_png(&a, "square_2.png", 30, 30);

    let frames = scan_folders(&[a, empty], &ScanOptions::default()).unwrap();
    assert_eq!(frames.len(), 6);
    assert!(frames[5].is_banner());

    let tally = consensus::tally(&frames);
    assert_eq!(tally.values().sum::<u64>(), 5);
    assert_eq!(consensus::choose(&tally), Resolution::new(40, 30).unwrap());
}

#[test]
fn prepare_honors_a_fixed_resolution() {
    let root = tempfile::tempdir().unwrap();
    write_png(root.path(), "one.png", 41, 30);

    let cfg = VideoConfig {
        folders: vec![root.path().to_path_buf()],
        ..VideoConfig::default()
    };
    let prepared = prepare(&cfg).unwrap();
    assert_eq!(prepared.resolution(), Resolution::new(40, 30).unwrap());

    let fixed = VideoConfig {
        resolution: Some(Resolution::new(320, 240).unwrap()),
        ..cfg
    };
    assert_eq!(prepare(&fixed).unwrap().resolution(), Resolution::new(320, 240).unwrap());
}

#[test]
fn only_banners_fall_back_to_720p() {
    let root = tempfile::tempdir().unwrap();
    let cfg = VideoConfig {
        folders: vec![root.path().join("missing")],
        empty_folders: EmptyFolderPolicy::Banner,
        ..VideoConfig::default()
    };
    let prepared = prepare(&cfg).unwrap();
    assert_eq!(prepared.frames.len(), 1);
    assert_eq!(prepared.resolution(), Resolution::new(1280, 720).unwrap());
}
