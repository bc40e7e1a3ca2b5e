use super::*;
use crate::scan::descriptor::FrameKind;

fn touch_png(dir: &Path, name: &str) {
    image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]))
        .save_with_format(dir.join(name), image::ImageFormat::Png)
        .unwrap();
}

fn names(frames: &[FrameDescriptor]) -> Vec<String> {
    frames
        .iter()
        .map(|f| match f.kind() {
            FrameKind::File(file) => file
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned(),
            FrameKind::Banner(msg) => format!("banner:{msg}"),
        })
        .collect()
}

#[test]
fn folders_keep_their_order_and_files_sort_naturally() {
    let root = tempfile::tempdir().unwrap();
    let a = root.path().join("a");
    let b = root.path().join("b");
    std::fs::create_dir_all(&a).unwrap();
    std::fs::create_dir_all(&b).unwrap();
    touch_png(&a, "img10.png");
    touch_png(&a, "img9.PNG");
    touch_png(&b, "x1.png");
    std::fs::write(a.join("readme.txt"), "skip me").unwrap();
    std::fs::create_dir_all(a.join("nested.png")).unwrap();

    let frames = scan_folders(&[b.clone(), a.clone()], &ScanOptions::default()).unwrap();
    assert_eq!(names(&frames), vec!["x1.png", "img9.PNG", "img10.png"]);
    let counters: Vec<(u32, u32)> = frames
        .iter()
        .map(|f| (f.index_in_folder(), f.index_in_video()))
        .collect();
    assert_eq!(counters, vec![(1, 1), (1, 2), (2, 3)]);
}

#[test]
fn empty_folder_policies() {
    let root = tempfile::tempdir().unwrap();
    let empty = root.path().join("empty");
    std::fs::create_dir_all(&empty).unwrap();
    let folders = vec![empty.clone()];

    let frames = scan_folders(&folders, &ScanOptions::default()).unwrap();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].is_banner());

    let skip = ScanOptions {
        empty_folders: EmptyFolderPolicy::Skip,
        ..ScanOptions::default()
    };
    assert!(scan_folders(&folders, &skip).unwrap().is_empty());

    let fail = ScanOptions {
        empty_folders: EmptyFolderPolicy::Fail,
        ..ScanOptions::default()
    };
    let err = scan_folders(&folders, &fail).unwrap_err();
    assert!(matches!(err, ReelError::Config(_)));
}

#[test]
fn missing_folder_becomes_banner_with_reason() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("nope");
    let frames = scan_folders(&[missing], &ScanOptions::default()).unwrap();
    let FrameKind::Banner(msg) = frames[0].kind() else {
        panic!("expected banner");
    };
    assert!(msg.contains("nope"));
    assert!(msg.contains("read folder"));
}
