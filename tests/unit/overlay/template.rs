use chrono::TimeZone as _;

use super::*;
use crate::foundation::core::Resolution;
use crate::overlay::model::HostInfo;

fn model() -> OverlayModel {
    OverlayModel {
        file_name: "IMG_0042.JPG".to_owned(),
        folder_name: "holiday".to_owned(),
        is_symlink: false,
        modified: Some(Local.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()),
        size: Some(123_456),
        resolution: Resolution::new(4000, 3000).ok(),
        index_in_folder: 7,
        index_in_video: 42,
        created: Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 58).unwrap(),
        host: HostInfo {
            machine_id: "abc123".to_owned(),
            hostname: "studio".to_owned(),
        },
        warning: String::new(),
    }
}

fn render(t: &str) -> String {
    compile(t).unwrap().render(&model())
}

fn err(t: &str) -> TemplateError {
    compile(t).unwrap_err()
}

#[test]
fn warn_form_is_case_insensitive_and_prints_warning_verbatim() {
    for t in ["WARN", "warn", " Warn "] {
        let o = compile(t).unwrap();
        assert!(o.is_warning());
        let mut m = model();
        assert_eq!(o.render(&m), "");
        m.warning = "hash changed {file}".to_owned();
        assert_eq!(o.render(&m), "hash changed {file}");
    }
    assert!(!compile("WARNING").unwrap().is_warning());
}

#[test]
fn plain_fields_render_model_values() {
    assert_eq!(render("{file}"), "IMG_0042.JPG");
    assert_eq!(render("{folder}/{file}"), "holiday/IMG_0042.JPG");
    assert_eq!(render("#{index:dir} of video #{index:video}"), "#7 of video #42");
    assert_eq!(render("{index:dirs}"), "42");
    assert_eq!(render("{size} B"), "123456 B");
    assert_eq!(render("{resolution}"), "4000x3000");
    assert_eq!(render("{machine}@{host}"), "abc123@studio");
    assert_eq!(
        render("{program}"),
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn timestamps_use_default_or_custom_format() {
    assert_eq!(render("{created}"), "2024-12-31T23:59:58.000");
    assert_eq!(render("{created:%d.%m.%Y}"), "31.12.2024");
    assert_eq!(render("{mtime:%H:%M:%S}"), "05:06:07");
    let mut m = model();
    m.modified = None;
    assert_eq!(compile("[{mtime}]").unwrap().render(&m), "[]");
}

#[test]
fn symlink_marker_uses_label_only_for_symlinks() {
    assert_eq!(render("{symlink}"), "");
    let mut m = model();
    m.is_symlink = true;
    assert_eq!(compile("{symlink}").unwrap().render(&m), "symlink");
    assert_eq!(compile("{symlink:-> link}").unwrap().render(&m), "-> link");
}

#[test]
fn escapes_are_unescaped_before_parsing() {
    assert_eq!(render(r"{file}\n{folder}"), "IMG_0042.JPG\nholiday");
    assert_eq!(render(r"a\\nb"), r"a\nb");
    assert_eq!(render(r"tab\tstays"), r"tab\tstays");
    assert_eq!(render("ünïcödé ✓ {{literal}}"), "ünïcödé ✓ {literal}");
}

#[test]
fn padding_follows_alignment() {
    assert_eq!(render("[{6:index:video}]"), "[42    ]");
    assert_eq!(render("[{<6:index:video}]"), "[42    ]");
    assert_eq!(render("[{>6:index:video}]"), "[    42]");
    assert_eq!(render("[{^6:index:video}]"), "[  42  ]");
    assert_eq!(render("[{^5:index:video}]"), "[ 42  ]");
    assert_eq!(render("[{>06:index:video}]"), "[    42]");
}

#[test]
fn width_below_length_keeps_value_without_bang() {
    let value = "IMG_0042.JPG";
    for w in 1..=value.len() {
        for align in ["", "<", ">", "^"] {
            let out = render(&format!("{{{align}{w}:file}}"));
            assert_eq!(out, value, "align {align:?} width {w}");
        }
    }
}

#[test]
fn hard_truncation_cuts_to_exact_width() {
    let value = "IMG_0042.JPG";
    let len = value.chars().count();
    for w in 1..=len {
        let left = render(&format!("{{<{w}!:file}}"));
        let right = render(&format!("{{>{w}!:file}}"));
        let center = render(&format!("{{^{w}!:file}}"));
        for out in [&left, &right, &center] {
            assert_eq!(out.chars().count(), w);
            assert!(value.contains(out.as_str()));
        }
        assert!(value.starts_with(&left));
        assert!(value.ends_with(&right));
    }
    // 12 chars cut to 7: 5 removed, 3 from the front and 2 from the back.
    assert_eq!(render("{^7!:file}"), "_0042.J");
    assert_eq!(render("{^11!:file}"), "MG_0042.JPG");
    assert_eq!(render("{>3!:file}"), "JPG");
    assert_eq!(render("{3!:file}"), "IMG");
}

#[test]
fn bang_with_room_to_spare_pads_to_width() {
    assert_eq!(render("[{>5!:index:video}]"), "[   42]");
}

#[test]
fn compiling_twice_is_deterministic() {
    let t = r"{^20!:file} {created} {>8:size}\n{index:dir}/{index:video} {resolution}";
    let a = compile(t).unwrap();
    let b = compile(t).unwrap();
    let m = model();
    assert_eq!(a.render(&m).into_bytes(), b.render(&m).into_bytes());
    assert_eq!(a.render(&m), a.render(&m));
}

#[test]
fn syntax_errors_are_reported_at_compile_time() {
    assert!(err("{file").message.contains("unclosed"));
    assert_eq!(err("ab}").offset, 2);
    assert!(err("{fi{le}").message.contains("nested"));
    assert!(err("{nope}").message.contains("unknown function 'nope'"));
    assert!(err("{}").message.contains("unknown function"));
    assert!(err("{>:file}").message.contains("expected a width"));
    assert!(err("{12file}").message.contains("expected ':'"));
    assert!(err("{0:file}").message.contains("positive"));
    assert!(err("{index}").message.contains("requires"));
    assert!(err("{index:folder}").message.contains("unknown index context"));
    assert!(err("{created:%Q}").message.contains("invalid timestamp format"));
    assert!(err("{mtime:}").message.contains("empty timestamp format"));
    assert!(err("{file:x}").message.contains("takes no argument"));
}

#[test]
fn error_offsets_point_into_the_template() {
    let e = err("abc {nope}");
    assert_eq!(e.offset, 5);
    assert!(e.to_string().starts_with("template error at byte 5"));
}
