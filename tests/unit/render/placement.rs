use super::*;

fn hd() -> Resolution {
    Resolution::new(1280, 720).unwrap()
}

#[test]
fn equal_size_is_not_resampled() {
    assert_eq!(plan((1280, 720), hd()), Placement::Unchanged);
}

#[test]
fn one_pixel_over_is_cropped_not_scaled() {
    assert_eq!(
        plan((1281, 721), hd()),
        Placement::Crop {
            width: 1280,
            height: 720
        }
    );
    assert_eq!(
        plan((1281, 700), hd()),
        Placement::Crop {
            width: 1280,
            height: 700
        }
    );
}

#[test]
fn oversized_sources_fit_inside_and_touch_an_edge() {
    assert_eq!(
        plan((4000, 3000), hd()),
        Placement::Scale {
            width: 960,
            height: 720
        }
    );
    assert_eq!(
        plan((1000, 2000), hd()),
        Placement::Scale {
            width: 360,
            height: 720
        }
    );
    assert_eq!(
        plan((1282, 720), hd()),
        Placement::Scale {
            width: 1280,
            height: 719
        }
    );
}

#[test]
fn smaller_on_both_axes_is_scaled_up() {
    assert_eq!(
        plan((640, 360), hd()),
        Placement::Scale {
            width: 1280,
            height: 720
        }
    );
    assert_eq!(
        plan((100, 100), hd()),
        Placement::Scale {
            width: 720,
            height: 720
        }
    );
}

#[test]
fn smaller_on_one_axis_only_is_pasted_without_resampling() {
    assert_eq!(
        plan((1000, 720), hd()),
        Placement::Crop {
            width: 1000,
            height: 720
        }
    );
}

#[test]
fn scaled_results_never_exceed_the_canvas() {
    let canvas = Resolution::new(798, 1280).unwrap();
    for source in [(1, 5000), (5000, 1), (799, 1281), (3, 7), (12000, 9000)] {
        match plan(source, canvas) {
            Placement::Scale { width, height } => {
                assert!(width <= canvas.width() && height <= canvas.height());
                assert!(width == canvas.width() || height == canvas.height());
                assert!(width >= 1 && height >= 1);
            }
            Placement::Crop { width, height } => {
                assert!(width <= canvas.width() && height <= canvas.height());
            }
            Placement::Unchanged => assert_eq!(source, (798, 1280)),
        }
    }
}

#[test]
fn origin_centers_the_placed_image() {
    assert_eq!(centered_origin((960, 720), hd()), (160, 0));
    assert_eq!(centered_origin((1000, 720), hd()), (140, 0));
    assert_eq!(centered_origin((1280, 720), hd()), (0, 0));
}
