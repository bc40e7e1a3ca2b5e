use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Local};
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder as _, RgbaImage,
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
    imageops::{self, FilterType},
};
use resvg::tiny_skia;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::{
        core::{Resolution, Rgb8},
        error::{ReelError, ReelResult},
    },
    overlay::{
        layout::{Column, Layout, Row},
        model::{HostInfo, OverlayModel},
    },
    render::{
        placement::{self, Placement},
        text::{Anchor, TextLine, TextRenderer, wrap},
    },
    scan::descriptor::{ContentHash, FileFacts, FileFrame, FrameDescriptor, FrameKind},
};

/// Placeholder and banner text wraps at this many characters.
const MESSAGE_COLUMNS: usize = 40;
const LUMA_THRESHOLD: u8 = 127;
/// Largest width or height a baseline JPEG can carry.
pub const JPEG_MAX_DIMENSION: u32 = u16::MAX as u32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameFormat {
    #[default]
    Jpeg,
    Png,
}

impl FrameFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "image/jpeg",
            FrameFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "jpg",
            FrameFormat::Png => "png",
        }
    }

    /// Rejects canvases this format cannot encode.
    pub fn check_canvas(self, resolution: Resolution) -> ReelResult<()> {
        let fits = resolution.width() <= JPEG_MAX_DIMENSION
            && resolution.height() <= JPEG_MAX_DIMENSION;
        if self == FrameFormat::Jpeg && !fits {
            return Err(ReelError::config(format!(
                "resolution {resolution} is too large for jpeg frames \
                 (max {JPEG_MAX_DIMENSION} per side); use png"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct CompositorOptions {
    pub format: FrameFormat,
    pub jpeg_quality: u8,
    pub margin: Rgb8,
    pub error_background: Rgb8,
    pub font_family: String,
    /// Defaults to `max(12, height / 40)`.
    pub font_size: Option<u32>,
    pub font_dirs: Vec<PathBuf>,
    pub created: DateTime<Local>,
    pub host: HostInfo,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            format: FrameFormat::Jpeg,
            jpeg_quality: 95,
            margin: Rgb8::BLACK,
            error_background: Rgb8::new(96, 0, 0),
            font_family: "monospace".to_owned(),
            font_size: None,
            font_dirs: Vec::new(),
            created: Local::now(),
            host: HostInfo::default(),
        }
    }
}

pub fn default_font_size(resolution: Resolution) -> u32 {
    (resolution.height() / 40).max(12)
}

/// One encoded frame, ready to be served.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Debug, thiserror::Error)]
enum FrameError {
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

impl FrameError {
    fn class_name(&self) -> String {
        match self {
            FrameError::Read { source, .. } => format!("IoError::{:?}", source.kind()),
            FrameError::Decode { source, .. } => match source {
                image::ImageError::Decoding(_) => "DecodingError",
                image::ImageError::Encoding(_) => "EncodingError",
                image::ImageError::Parameter(_) => "ParameterError",
                image::ImageError::Limits(_) => "LimitsError",
                image::ImageError::Unsupported(_) => "UnsupportedError",
                image::ImageError::IoError(_) => "IoError",
            }
            .to_owned(),
        }
    }
}

struct CanvasState {
    canvas: RgbaImage,
    rgb: Vec<u8>,
    overlay: Option<tiny_skia::Pixmap>,
}

/// Composites frames onto a fixed-size canvas and encodes them.
///
/// All buffers are reused between frames; a single mutex serializes rendering.
pub struct FrameCompositor {
    resolution: Resolution,
    layout: Layout,
    opts: CompositorOptions,
    text: TextRenderer,
    state: Mutex<CanvasState>,
}

impl std::fmt::Debug for FrameCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCompositor")
            .field("resolution", &self.resolution)
            .field("format", &self.opts.format)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl FrameCompositor {
    pub fn new(resolution: Resolution, layout: Layout, opts: CompositorOptions) -> ReelResult<Self> {
        if !(1..=100).contains(&opts.jpeg_quality) {
            return Err(ReelError::config("jpeg quality must be in 1..=100"));
        }
        opts.format.check_canvas(resolution)?;
        let font_size = opts.font_size.unwrap_or_else(|| default_font_size(resolution));
        if font_size == 0 {
            return Err(ReelError::config("font size must be > 0"));
        }
        let text = TextRenderer::new(&opts.font_family, font_size, &opts.font_dirs);
        let (w, h) = (resolution.width(), resolution.height());
        Ok(Self {
            resolution,
            layout,
            text,
            state: Mutex::new(CanvasState {
                canvas: RgbaImage::from_pixel(w, h, opts.margin.to_rgba()),
                rgb: Vec::with_capacity(w as usize * h as usize * 3),
                overlay: None,
            }),
            opts,
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn format(&self) -> FrameFormat {
        self.opts.format
    }

    /// Render one frame. Never fails: unreadable sources become placeholder frames.
    pub fn render(&self, frame: &FrameDescriptor) -> EncodedFrame {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match frame.kind() {
            FrameKind::Banner(message) => self.draw_message(&mut state, message),
            FrameKind::File(file) => {
                if let Err(e) = self.compose_file(&mut state, frame, file) {
                    let class = e.class_name();
                    tracing::warn!(file = %file.path.display(), class = %class, error = %e, "placeholder frame");
                    let message = format!("{class}\n{}", identity(&file.path));
                    self.draw_message(&mut state, &message);
                }
            }
        }
        self.encode(&mut state)
    }

    fn compose_file(
        &self,
        state: &mut CanvasState,
        frame: &FrameDescriptor,
        file: &FileFrame,
    ) -> Result<(), FrameError> {
        let bytes = std::fs::read(&file.path).map_err(|source| FrameError::Read {
            path: file.path.clone(),
            source,
        })?;
        let live = ContentHash::of_bytes(&bytes);
        let facts = FileFacts::read(&file.path);
        let img = image::load_from_memory(&bytes).map_err(|source| FrameError::Decode {
            path: file.path.clone(),
            source,
        })?;
        drop(bytes);

        let warning = integrity_warning(&file.path, file.hash, live);
        if !warning.is_empty() {
            tracing::warn!(file = %file.path.display(), "{warning}");
        }

        state.canvas.pixels_mut().for_each(|p| *p = self.opts.margin.to_rgba());
        self.place(&mut state.canvas, &img);

        let model = OverlayModel::for_file(
            frame,
            &file.path,
            &facts,
            Resolution::new(img.width(), img.height()).ok(),
            self.opts.created,
            &self.opts.host,
            warning,
        );
        drop(img);
        self.draw_overlays(state, &model);
        Ok(())
    }

    fn place(&self, canvas: &mut RgbaImage, img: &DynamicImage) {
        let plan = placement::plan((img.width(), img.height()), self.resolution);
        let placed = match plan {
            Placement::Unchanged => img.to_rgba8(),
            Placement::Crop { width, height } => img.crop_imm(0, 0, width, height).to_rgba8(),
            Placement::Scale { width, height } => img
                .resize_exact(width, height, FilterType::Lanczos3)
                .to_rgba8(),
        };
        let (x, y) = placement::centered_origin(placed.dimensions(), self.resolution);
        if img.color().has_alpha() {
            imageops::overlay(canvas, &placed, x, y);
        } else {
            imageops::replace(canvas, &placed, x, y);
        }
    }

    fn draw_overlays(&self, state: &mut CanvasState, model: &OverlayModel) {
        let texts = self.layout.render(model);
        if texts.is_empty() {
            return;
        }
        let (w, h) = state.canvas.dimensions();
        let lh = self.text.line_height().max(1);
        let pad = self.text.font_size() / 2;
        let thumb = imageops::thumbnail(&state.canvas, w.div_ceil(lh), h.div_ceil(lh));
        let (tw, th) = thumb.dimensions();

        let mut lines = Vec::new();
        for (cell, text) in texts {
            let rows: Vec<&str> = text.split('\n').collect();
            let (x, anchor) = match cell.column {
                Column::Left => (pad, Anchor::Start),
                Column::Center => (w / 2, Anchor::Middle),
                Column::Right => (w.saturating_sub(pad), Anchor::End),
            };
            for (i, row) in rows.iter().enumerate() {
                if row.is_empty() {
                    continue;
                }
                let top = line_top(cell.row, i, rows.len(), lh, h);
                let under = thumb.get_pixel((x / lh).min(tw - 1), (top / lh).min(th - 1));
                let background = Rgb8::new(under[0], under[1], under[2]);
                lines.push(TextLine {
                    text: (*row).to_owned(),
                    x,
                    top,
                    anchor,
                    fill: contrast(background),
                    stroke: Some(background),
                });
            }
        }
        let CanvasState {
            canvas, overlay, ..
        } = state;
        if let Err(e) = self.text.draw(overlay, canvas, &lines) {
            tracing::warn!(error = %e, "overlay text skipped");
        }
    }

    /// Word-wrapped, centered message on the error background.
    fn draw_message(&self, state: &mut CanvasState, message: &str) {
        let bg = self.opts.error_background;
        state.canvas.pixels_mut().for_each(|p| *p = bg.to_rgba());

        let (w, h) = state.canvas.dimensions();
        let lh = self.text.line_height().max(1);
        let rows = wrap(message, MESSAGE_COLUMNS);
        let block = lh.saturating_mul(rows.len() as u32);
        let first = h.saturating_sub(block) / 2;
        let lines: Vec<TextLine> = rows
            .into_iter()
            .enumerate()
            .filter(|(_, row)| !row.is_empty())
            .map(|(i, row)| TextLine {
                text: row,
                x: w / 2,
                top: (first + i as u32 * lh).min(h.saturating_sub(lh)),
                anchor: Anchor::Middle,
                fill: contrast(bg),
                stroke: None,
            })
            .collect();
        let CanvasState {
            canvas, overlay, ..
        } = state;
        if let Err(e) = self.text.draw(overlay, canvas, &lines) {
            tracing::warn!(error = %e, "message text skipped");
        }
    }

    /// Encodes in the configured format, retrying as PNG if that fails.
    fn encode(&self, state: &mut CanvasState) -> EncodedFrame {
        let format = self.opts.format;
        let result = encode_canvas(state, format, self.opts.jpeg_quality)
            .map(|bytes| (bytes, format))
            .or_else(|e| {
                tracing::error!(error = %e, format = ?format, "frame encoding failed, retrying as png");
                encode_canvas(state, FrameFormat::Png, self.opts.jpeg_quality)
                    .map(|bytes| (bytes, FrameFormat::Png))
            });
        match result {
            Ok((bytes, format)) => EncodedFrame {
                bytes,
                content_type: format.content_type(),
            },
            Err(e) => {
                tracing::error!(error = %e, "png fallback failed");
                EncodedFrame {
                    bytes: Vec::new(),
                    content_type: format.content_type(),
                }
            }
        }
    }
}

fn encode_canvas(
    state: &mut CanvasState,
    format: FrameFormat,
    quality: u8,
) -> image::ImageResult<Vec<u8>> {
    let (w, h) = state.canvas.dimensions();
    state.rgb.clear();
    for p in state.canvas.pixels() {
        state.rgb.extend_from_slice(&p.0[..3]);
    }
    let mut out = Vec::with_capacity(state.rgb.len() / 4);
    match format {
        FrameFormat::Jpeg => JpegEncoder::new_with_quality(&mut out, quality).encode(
            &state.rgb,
            w,
            h,
            ExtendedColorType::Rgb8,
        )?,
        FrameFormat::Png => {
            PngEncoder::new(&mut out).write_image(&state.rgb, w, h, ExtendedColorType::Rgb8)?
        }
    }
    Ok(out)
}

fn integrity_warning(path: &Path, scanned: Option<ContentHash>, live: ContentHash) -> String {
    match scanned {
        Some(h) if h == live => String::new(),
        Some(h) => format!("{} changed since scan ({h} -> {live})", identity(path)),
        None => format!("{} was unreadable at scan time", identity(path)),
    }
}

/// `folder/file`, or the path itself when it has no parent name.
fn identity(path: &Path) -> String {
    let file = path.file_name().map(|n| n.to_string_lossy());
    let folder = path
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy());
    match (folder, file) {
        (Some(d), Some(f)) => format!("{d}/{f}"),
        _ => path.display().to_string(),
    }
}

fn contrast(background: Rgb8) -> Rgb8 {
    if background.luma() < LUMA_THRESHOLD {
        Rgb8::WHITE
    } else {
        Rgb8::BLACK
    }
}

/// Top of line `i` out of `n` in `row`, clamped so the whole line box stays on canvas.
fn line_top(row: Row, i: usize, n: usize, lh: u32, h: u32) -> u32 {
    let (i, n, lh, h) = (i as i64, n as i64, i64::from(lh), i64::from(h));
    let top = match row {
        Row::Top => i * lh,
        Row::Bottom => h - (n - i) * lh,
        Row::Middle => {
            let even = if n % 2 == 0 { lh / 2 } else { 0 };
            h / 2 + (i - n / 2) * lh - lh / 2 + even
        }
    };
    top.clamp(0, (h - lh).max(0)) as u32
}
