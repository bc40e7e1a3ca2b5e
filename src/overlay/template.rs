//! Overlay text templates.
//!
//! A template is either the bare word `WARN`, which prints the frame's integrity warning,
//! or literal text with `{[[align]width[!]:]function[:argument]}` fields:
//!
//! | function            | value                                                   |
//! |---------------------|---------------------------------------------------------|
//! | `program`           | crate name and version                                  |
//! | `machine`           | host machine id                                         |
//! | `host`              | host network name                                       |
//! | `created[:fmt]`     | video creation time (strftime, default ISO-8601 + ms)   |
//! | `file` / `folder`   | file name / name of the containing folder               |
//! | `index:dir`         | 1-based index inside the folder                         |
//! | `index:video`       | 1-based index inside the video (`dirs` is an alias)     |
//! | `mtime[:fmt]`       | file modification time, empty when unknown              |
//! | `size`              | file size in bytes                                      |
//! | `resolution`        | original `WxH`                                          |
//! | `symlink[:label]`   | `label` (default `symlink`) when the file is a symlink  |
//!
//! `align` is `<` (default), `>` or `^`; `width` pads to a minimum width and a trailing
//! `!` also cuts the value down to exactly `width` characters. `\n` and `\\` are
//! unescaped before parsing; `{{` and `}}` are literal braces.

use std::fmt::{self, Write as _};

use chrono::{
    DateTime, Local,
    format::{Item, StrftimeItems},
};

use crate::overlay::model::OverlayModel;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
pub const DEFAULT_SYMLINK_LABEL: &str = "symlink";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("template error at byte {offset}: {message}")]
pub struct TemplateError {
    pub offset: usize,
    pub message: String,
}

impl TemplateError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Align {
    #[default]
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct FieldFormat {
    align: Align,
    width: Option<usize>,
    truncate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexScope {
    Folder,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Program,
    Machine,
    Host,
    Created(String),
    File,
    Folder,
    Index(IndexScope),
    Modified(String),
    Size,
    Resolution,
    Symlink(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { source: Source, format: FieldFormat },
}

type RenderFn = Box<dyn Fn(&OverlayModel) -> String + Send + Sync>;

/// A compiled template, ready to render against any number of frames.
pub struct Overlay {
    source: String,
    warning: bool,
    render: RenderFn,
}

impl Overlay {
    pub fn render(&self, model: &OverlayModel) -> String {
        (self.render)(model)
    }

    /// True for the `WARN` form.
    pub fn is_warning(&self) -> bool {
        self.warning
    }
}

impl fmt::Debug for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay")
            .field("source", &self.source)
            .field("warning", &self.warning)
            .finish_non_exhaustive()
    }
}

/// Compile `template`. All syntax problems surface here, never at render time.
pub fn compile(template: &str) -> Result<Overlay, TemplateError> {
    if template.trim().eq_ignore_ascii_case("WARN") {
        return Ok(Overlay {
            source: template.to_owned(),
            warning: true,
            render: Box::new(|m: &OverlayModel| m.warning.clone()),
        });
    }

    let segments = parse(&unescape(template))?;
    Ok(Overlay {
        source: template.to_owned(),
        warning: false,
        render: Box::new(move |m: &OverlayModel| render_segments(&segments, m)),
    })
}

/// Replace `\n` and `\\`; any other backslash is kept as is.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            _ => out.push('\\'),
        }
    }
    out
}

fn parse(src: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut out = Vec::new();
    let mut literal = String::new();
    let mut chars = src.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(TemplateError::new(i, "unmatched '}'")),
            '{' => {
                let mut end = None;
                for (j, d) in chars.by_ref() {
                    match d {
                        '}' => {
                            end = Some(j);
                            break;
                        }
                        '{' => return Err(TemplateError::new(j, "nested '{' inside a field")),
                        _ => {}
                    }
                }
                let end = end.ok_or_else(|| TemplateError::new(i, "unclosed '{'"))?;
                if !literal.is_empty() {
                    out.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                out.push(parse_field(&src[i + 1..end], i + 1)?);
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        out.push(Segment::Literal(literal));
    }
    Ok(out)
}

fn parse_field(body: &str, offset: usize) -> Result<Segment, TemplateError> {
    let (format, rest, rest_offset) = parse_format(body, offset)?;
    let (name, arg) = match rest.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (rest, None),
    };
    let arg_offset = rest_offset + name.len() + 1;

    let no_arg = |source: Source| match arg {
        Some(_) => Err(TemplateError::new(
            arg_offset,
            format!("function '{name}' takes no argument"),
        )),
        None => Ok(source),
    };

    let source = match name {
        "program" => no_arg(Source::Program)?,
        "machine" => no_arg(Source::Machine)?,
        "host" => no_arg(Source::Host)?,
        "file" => no_arg(Source::File)?,
        "folder" => no_arg(Source::Folder)?,
        "size" => no_arg(Source::Size)?,
        "resolution" => no_arg(Source::Resolution)?,
        "created" => Source::Created(time_format(arg, arg_offset)?),
        "mtime" => Source::Modified(time_format(arg, arg_offset)?),
        "symlink" => Source::Symlink(arg.unwrap_or(DEFAULT_SYMLINK_LABEL).to_owned()),
        "index" => match arg {
            Some("dir") => Source::Index(IndexScope::Folder),
            Some("video" | "dirs") => Source::Index(IndexScope::Video),
            Some(other) => {
                return Err(TemplateError::new(
                    arg_offset,
                    format!("unknown index context '{other}' (expected dir, video or dirs)"),
                ));
            }
            None => {
                return Err(TemplateError::new(
                    rest_offset,
                    "function 'index' requires a context argument (dir, video or dirs)",
                ));
            }
        },
        _ => {
            return Err(TemplateError::new(
                rest_offset,
                format!("unknown function '{name}'"),
            ));
        }
    };

    Ok(Segment::Field { source, format })
}

/// Split an optional `[align]width[!]:` prefix off a field body.
fn parse_format(body: &str, offset: usize) -> Result<(FieldFormat, &str, usize), TemplateError> {
    let mut format = FieldFormat::default();
    let mut rest = body;

    let align = match rest.chars().next() {
        Some('<') => Some(Align::Left),
        Some('>') => Some(Align::Right),
        Some('^') => Some(Align::Center),
        Some(c) if c.is_ascii_digit() => None,
        _ => return Ok((format, body, offset)),
    };
    if let Some(a) = align {
        format.align = a;
        rest = &rest[1..];
    }

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let at = |rest: &str| offset + (body.len() - rest.len());
    if digits == 0 {
        return Err(TemplateError::new(
            at(rest),
            "malformed field prefix: expected a width after the alignment",
        ));
    }
    let width: usize = rest[..digits]
        .parse()
        .map_err(|_| TemplateError::new(at(rest), "field width is too large"))?;
    if width == 0 {
        return Err(TemplateError::new(at(rest), "field width must be positive"));
    }
    format.width = Some(width);
    rest = &rest[digits..];

    if let Some(r) = rest.strip_prefix('!') {
        format.truncate = true;
        rest = r;
    }
    let Some(r) = rest.strip_prefix(':') else {
        return Err(TemplateError::new(
            at(rest),
            "malformed field prefix: expected ':' after the width",
        ));
    };
    Ok((format, r, at(r)))
}

fn time_format(arg: Option<&str>, offset: usize) -> Result<String, TemplateError> {
    let Some(fmt) = arg else {
        return Ok(DEFAULT_TIME_FORMAT.to_owned());
    };
    if fmt.is_empty() {
        return Err(TemplateError::new(offset, "empty timestamp format"));
    }
    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return Err(TemplateError::new(
            offset,
            format!("invalid timestamp format '{fmt}'"),
        ));
    }
    Ok(fmt.to_owned())
}

fn format_time(t: &DateTime<Local>, fmt: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", t.format(fmt)).is_err() {
        out.clear();
    }
    out
}

fn render_segments(segments: &[Segment], m: &OverlayModel) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Literal(s) => out.push_str(s),
            Segment::Field { source, format } => {
                out.push_str(&apply_format(field_value(source, m), *format));
            }
        }
    }
    out
}

fn field_value(source: &Source, m: &OverlayModel) -> String {
    match source {
        Source::Program => concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).to_owned(),
        Source::Machine => m.host.machine_id.clone(),
        Source::Host => m.host.hostname.clone(),
        Source::Created(fmt) => format_time(&m.created, fmt),
        Source::File => m.file_name.clone(),
        Source::Folder => m.folder_name.clone(),
        Source::Index(IndexScope::Folder) => m.index_in_folder.to_string(),
        Source::Index(IndexScope::Video) => m.index_in_video.to_string(),
        Source::Modified(fmt) => m
            .modified
            .as_ref()
            .map(|t| format_time(t, fmt))
            .unwrap_or_default(),
        Source::Size => m.size.map(|s| s.to_string()).unwrap_or_default(),
        Source::Resolution => m.resolution.map(|r| r.to_string()).unwrap_or_default(),
        Source::Symlink(label) => {
            if m.is_symlink {
                label.clone()
            } else {
                String::new()
            }
        }
    }
}

fn apply_format(value: String, format: FieldFormat) -> String {
    let Some(width) = format.width else {
        return value;
    };
    let len = value.chars().count();

    if len < width {
        let fill = width - len;
        let (left, right) = match format.align {
            Align::Left => (0, fill),
            Align::Right => (fill, 0),
            Align::Center => (fill / 2, fill - fill / 2),
        };
        let mut out = String::with_capacity(value.len() + fill);
        out.extend(std::iter::repeat_n(' ', left));
        out.push_str(&value);
        out.extend(std::iter::repeat_n(' ', right));
        return out;
    }

    if len == width || !format.truncate {
        return value;
    }

    let excess = len - width;
    let skip = match format.align {
        Align::Left => 0,
        Align::Right => excess,
        Align::Center => excess.div_ceil(2),
    };
    value.chars().skip(skip).take(width).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/template.rs"]
mod tests;
