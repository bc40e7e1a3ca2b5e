//! Overlay and placeholder text, laid out as a canvas-sized SVG and rasterized with
//! usvg/resvg onto the RGBA canvas.

use std::{fmt::Write as _, path::PathBuf, sync::Arc};

use anyhow::Context;
use image::RgbaImage;
use resvg::tiny_skia;

use crate::foundation::core::Rgb8;

/// Baseline offset from the top of a line box, as a fraction of the font size.
const ASCENT: f32 = 0.8;
/// Line box height as a multiple of the font size.
const LINE_SPACING: f32 = 1.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_svg(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// One line of text. `x` is interpreted according to `anchor`; `top` is the top of the
/// line box.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: u32,
    pub top: u32,
    pub anchor: Anchor,
    pub fill: Rgb8,
    pub stroke: Option<Rgb8>,
}

pub struct TextRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
    family: String,
    size: u32,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("faces", &self.fontdb.len())
            .field("family", &self.family)
            .field("size", &self.size)
            .finish()
    }
}

impl TextRenderer {
    /// Load system fonts plus every font under `font_dirs`. A database without faces
    /// still works; text simply does not show.
    pub fn new(family: &str, size: u32, font_dirs: &[PathBuf]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            db.load_fonts_dir(dir);
        }
        if db.len() == 0 {
            tracing::warn!("no fonts found; overlay text will not be visible");
        } else {
            tracing::debug!(faces = db.len(), family, "font database ready");
        }
        Self {
            fontdb: Arc::new(db),
            family: family.to_owned(),
            size: size.max(1),
        }
    }

    pub fn font_size(&self) -> u32 {
        self.size
    }

    pub fn line_height(&self) -> u32 {
        (self.size as f32 * LINE_SPACING).ceil() as u32
    }

    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Rasterize `lines` and blend them over `canvas`. `scratch` is reused across calls
    /// while the canvas size stays the same.
    pub fn draw(
        &self,
        scratch: &mut Option<tiny_skia::Pixmap>,
        canvas: &mut RgbaImage,
        lines: &[TextLine],
    ) -> anyhow::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let (w, h) = canvas.dimensions();
        let svg = self.build_svg(w, h, lines);

        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts).context("parse overlay svg")?;

        if scratch
            .as_ref()
            .is_none_or(|p| p.width() != w || p.height() != h)
        {
            *scratch = Some(tiny_skia::Pixmap::new(w, h).context("allocate overlay pixmap")?);
        }
        let pixmap = scratch.as_mut().context("overlay pixmap missing")?;
        pixmap.fill(tiny_skia::Color::TRANSPARENT);
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        blend_premultiplied(pixmap.data(), canvas);
        Ok(())
    }

    fn build_svg(&self, w: u32, h: u32, lines: &[TextLine]) -> String {
        let size = self.size as f32;
        let mut svg = String::with_capacity(256 + lines.len() * 160);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{}" font-size="{size}">"#,
            escape_xml(&self.family),
        );
        for line in lines {
            let baseline = line.top as f32 + size * ASCENT;
            let _ = write!(
                svg,
                r#"<text xml:space="preserve" x="{}" y="{baseline}" text-anchor="{}" fill="{}""#,
                line.x,
                line.anchor.as_svg(),
                line.fill.to_hex(),
            );
            if let Some(stroke) = line.stroke {
                let _ = write!(
                    svg,
                    r#" stroke="{}" stroke-width="{}" stroke-linejoin="round" paint-order="stroke""#,
                    stroke.to_hex(),
                    (size / 8.0).max(1.0),
                );
            }
            let _ = write!(svg, ">{}</text>", escape_xml(&line.text));
        }
        svg.push_str("</svg>");
        svg
    }
}

fn font_resolver() -> usvg::FontResolver<'static> {
    use usvg::{FontResolver, fontdb};

    FontResolver {
        select_font: Box::new(|font, db| {
            let mut families: Vec<fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => fontdb::Family::Name(s),
                })
                .collect();
            families.push(fontdb::Family::Monospace);
            families.push(fontdb::Family::SansSerif);

            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(font.weight()),
                ..Default::default()
            };
            db.query(&query).or_else(|| db.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// `src` is premultiplied RGBA from tiny-skia; the canvas is straight RGBA.
fn blend_premultiplied(src: &[u8], canvas: &mut RgbaImage) {
    let dst: &mut [u8] = canvas;
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let a = u16::from(s[3]);
        if a == 0 {
            continue;
        }
        let inv = 255 - a;
        for i in 0..3 {
            let v = u16::from(s[i]) + (u16::from(d[i]) * inv + 127) / 255;
            d[i] = v.min(255) as u8;
        }
        d[3] = (a + (u16::from(d[3]) * inv + 127) / 255).min(255) as u8;
    }
}

/// Greedy word wrap at `columns` characters. Explicit newlines are kept; words longer
/// than a line are split.
pub fn wrap(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut out = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut len = 0usize;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > columns {
                if len > 0 {
                    out.push(std::mem::take(&mut line));
                    len = 0;
                }
                let rest = word.split_off(columns);
                out.push(word.into_iter().collect());
                word = rest;
            }
            if len > 0 && len + 1 + word.len() > columns {
                out.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            len += word.len();
            line.extend(word);
        }
        out.push(line);
    }
    out
}
