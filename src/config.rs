use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{
    encode::ffmpeg::{Container, EncodeSettings},
    foundation::{
        core::{Resolution, Rgb8},
        error::{ReelError, ReelResult},
    },
    overlay::{
        layout::{Layout, LayoutSpec},
        model::HostInfo,
    },
    render::compositor::{CompositorOptions, FrameFormat},
    scan::sequence::{DEFAULT_IMAGE_EXTENSIONS, EmptyFolderPolicy, ScanOptions},
};

/// Ports below this need privileges on most systems.
pub const MIN_UNPRIVILEGED_PORT: u16 = 1024;

/// Everything needed to turn folders of images into one video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    pub folders: Vec<PathBuf>,
    pub output: PathBuf,
    pub overwrite: bool,
    pub fps: u32,
    pub banner_seconds: f64,
    /// Fixed canvas size; chosen from the sources when absent.
    pub resolution: Option<Resolution>,
    pub port_min: u16,
    pub port_max: u16,
    pub frame_format: FrameFormat,
    pub jpeg_quality: u8,
    pub font_family: String,
    pub font_size: Option<u32>,
    pub font_dirs: Vec<PathBuf>,
    pub margin_color: Rgb8,
    pub error_color: Rgb8,
    pub extensions: Vec<String>,
    pub empty_folders: EmptyFolderPolicy,
    pub layout: LayoutSpec,
}

impl Default for VideoConfig {
    fn default() -> Self {
        let compositor = CompositorOptions::default();
        Self {
            folders: Vec::new(),
            output: PathBuf::from("out.mp4"),
            overwrite: true,
            fps: 25,
            banner_seconds: 2.0,
            resolution: None,
            port_min: 10000,
            port_max: 65000,
            frame_format: compositor.format,
            jpeg_quality: compositor.jpeg_quality,
            font_family: compositor.font_family,
            font_size: None,
            font_dirs: Vec::new(),
            margin_color: compositor.margin,
            error_color: compositor.error_background,
            extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            empty_folders: EmptyFolderPolicy::default(),
            layout: LayoutSpec::default(),
        }
    }
}

impl VideoConfig {
    pub fn from_json_file(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| ReelError::config(format!("{}: {e}", path.display())))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.folders.is_empty() {
            return Err(ReelError::config("at least one input folder is required"));
        }
        self.encode_settings().validate()?;
        if let Some(r) = self.resolution
            && !r.is_even()
        {
            return Err(ReelError::config(format!(
                "resolution {r} must have even width and height"
            )));
        }
        if let Some(r) = self.resolution {
            self.frame_format.check_canvas(r)?;
        }
        if self.port_min < MIN_UNPRIVILEGED_PORT {
            return Err(ReelError::config(format!(
                "port_min must be >= {MIN_UNPRIVILEGED_PORT}"
            )));
        }
        if self.port_min > self.port_max {
            return Err(ReelError::config("port_min must not exceed port_max"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ReelError::config("jpeg_quality must be in 1..=100"));
        }
        if self.font_size == Some(0) {
            return Err(ReelError::config("font_size must be > 0"));
        }
        if self.extensions.is_empty() {
            return Err(ReelError::config("at least one image extension is required"));
        }
        Layout::compile(&self.layout)?;
        Ok(())
    }

    pub fn container(&self) -> ReelResult<Container> {
        Container::from_path(&self.output)
    }

    pub fn ports(&self) -> RangeInclusive<u16> {
        self.port_min..=self.port_max
    }

    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            fps: self.fps,
            banner_seconds: self.banner_seconds,
            output: self.output.clone(),
            overwrite: self.overwrite,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            extensions: self.extensions.clone(),
            empty_folders: self.empty_folders,
        }
    }

    pub fn compositor_options(&self, created: DateTime<Local>, host: HostInfo) -> CompositorOptions {
        CompositorOptions {
            format: self.frame_format,
            jpeg_quality: self.jpeg_quality,
            margin: self.margin_color,
            error_background: self.error_color,
            font_family: self.font_family.clone(),
            font_size: self.font_size,
            font_dirs: self.font_dirs.clone(),
            created,
            host,
        }
    }
}
