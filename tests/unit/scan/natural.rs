use super::*;

fn sorted(names: &[&str]) -> Vec<String> {
    let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    v.sort_by(|a, b| compare_names(a, b));
    v
}

const EXPECTED: [&str; 11] = [
    "IMG_.JPG",
    "IMG_00001.JPG",
    "IMG_075.JPG",
    "IMG_0670.JPG",
    "IMG_0671.JPG",
    "IMG_0672.JPEG",
    "IMG_0672.JPG",
    "IMG_0672 edited.png",
    "IMG_0672-edited.png",
    "IMG_0672e.png",
    "IMG_0673.JPG",
];

#[test]
fn camera_names_sort_in_expected_order_for_any_rotation_and_reversal() {
    for shift in 0..EXPECTED.len() {
        let mut input: Vec<&str> = EXPECTED.to_vec();
        input.rotate_left(shift);
        assert_eq!(sorted(&input), EXPECTED, "rotation {shift}");
        input.reverse();
        assert_eq!(sorted(&input), EXPECTED, "reversed rotation {shift}");
    }
}

#[test]
fn interleaved_shuffle_sorts_to_expected_order() {
    let mut input = Vec::new();
    for i in (0..EXPECTED.len()).step_by(2) {
        input.push(EXPECTED[i]);
    }
    for i in (1..EXPECTED.len()).step_by(2).rev() {
        input.push(EXPECTED[i]);
    }
    assert_eq!(sorted(&input), EXPECTED);
}

#[test]
fn names_without_digits_sort_lexicographically() {
    let names = [
        "delta", "alpha", "Bravo", "alphabet", "charlie", "a", "zulu", "Zulu", "echo", "ab",
    ];
    let mut expected: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(sorted(&names), expected);

    let with_ext: Vec<String> = names.iter().map(|s| format!("{s}.jpg")).collect();
    let refs: Vec<&str> = with_ext.iter().map(String::as_str).collect();
    let mut expected = with_ext.clone();
    expected.sort();
    assert_eq!(sorted(&refs), expected);
}

#[test]
fn digit_runs_compare_by_value_even_when_huge() {
    assert_eq!(compare_names("f2.png", "f10.png"), Ordering::Less);
    assert_eq!(
        compare_names("f99999999999999999999999.png", "f100000000000000000000000.png"),
        Ordering::Less
    );
    assert_eq!(compare_names("f007.png", "f7.png"), Ordering::Less);
    assert_eq!(compare_names("f7.png", "f7.png"), Ordering::Equal);
}

#[test]
fn character_tiebreak_applies_only_to_otherwise_equal_names() {
    assert_eq!(compare_names("f7a", "f007x"), Ordering::Less);
    assert_eq!(compare_names("f007a", "f7a"), Ordering::Less);
    assert_eq!(compare_names("f007.png", "f7.jpg"), Ordering::Greater);
}

#[test]
fn digits_rank_below_literals() {
    assert_eq!(compare_names("a1", "ab"), Ordering::Less);
    assert_eq!(compare_names("x_9", "x_a"), Ordering::Less);
}

#[test]
fn extension_is_collapsed_and_version_numbers_stay_in_base() {
    assert_eq!(split_extension("archive.tar.gz"), ("archive", ".tar.gz"));
    assert_eq!(split_extension("v1.2.10"), ("v1.2.10", ""));
    assert_eq!(split_extension(".hidden"), (".hidden", ""));
    assert_eq!(split_extension(""), ("", ""));
    assert_eq!(compare_names("v1.2.9", "v1.2.10"), Ordering::Less);
}

#[test]
fn directories_do_not_affect_order() {
    let mut paths = vec![
        PathBuf::from("/z/dir/img10.jpg"),
        PathBuf::from("/a/img9.jpg"),
        PathBuf::from("relative/img1.jpg"),
    ];
    sort_paths(&mut paths);
    assert_eq!(
        paths,
        vec![
            PathBuf::from("relative/img1.jpg"),
            PathBuf::from("/a/img9.jpg"),
            PathBuf::from("/z/dir/img10.jpg"),
        ]
    );
    assert_eq!(
        compare_paths(Path::new("/x/same.jpg"), Path::new("/y/same.jpg")),
        Ordering::Equal
    );
}

#[test]
fn empty_inputs_do_not_fail() {
    assert_eq!(compare_names("", ""), Ordering::Equal);
    assert_eq!(compare_names("", "a"), Ordering::Less);
    let mut none: Vec<PathBuf> = Vec::new();
    sort_paths(&mut none);
    assert!(none.is_empty());
}
