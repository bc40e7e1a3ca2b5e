use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    str::FromStr,
};

use crate::{
    foundation::error::{ReelError, ReelResult},
    scan::descriptor::FrameDescriptor,
    serve::frames::frame_path,
};

/// Output container, chosen from the destination file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    Mp4,
    Mkv,
    Mov,
    Webm,
}

impl Container {
    pub const SUPPORTED: &'static str = "mp4, mkv, mov, webm";

    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse().map_err(|_| {
            ReelError::config(format!(
                "unsupported output format '{}' (expected one of {})",
                path.display(),
                Self::SUPPORTED
            ))
        })
    }

    fn codec_args(self) -> &'static [&'static str] {
        match self {
            Container::Mp4 | Container::Mov => &[
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-crf",
                "18",
                "-movflags",
                "+faststart",
            ],
            Container::Mkv => &["-c:v", "libx264", "-pix_fmt", "yuv420p", "-crf", "18"],
            Container::Webm => &[
                "-c:v",
                "libvpx-vp9",
                "-pix_fmt",
                "yuv420p",
                "-crf",
                "32",
                "-b:v",
                "0",
            ],
        }
    }
}

impl FromStr for Container {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(Container::Mp4),
            "mkv" => Ok(Container::Mkv),
            "mov" => Ok(Container::Mov),
            "webm" => Ok(Container::Webm),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EncodeSettings {
    pub fps: u32,
    /// How long a banner frame stays on screen.
    pub banner_seconds: f64,
    pub output: PathBuf,
    pub overwrite: bool,
}

impl EncodeSettings {
    pub fn validate(&self) -> ReelResult<()> {
        if self.fps == 0 {
            return Err(ReelError::config("fps must be non-zero"));
        }
        if !(self.banner_seconds.is_finite() && self.banner_seconds > 0.0) {
            return Err(ReelError::config("banner seconds must be a positive number"));
        }
        Container::from_path(&self.output)?;
        Ok(())
    }

    pub fn container(&self) -> ReelResult<Container> {
        Container::from_path(&self.output)
    }

    fn duration_of(&self, frame: &FrameDescriptor) -> f64 {
        if frame.is_banner() {
            self.banner_seconds
        } else {
            1.0 / f64::from(self.fps)
        }
    }
}

/// Write an `ffconcat` manifest listing every frame URL with its display time. The last
/// entry is repeated so the concat demuxer honors its duration.
pub fn write_manifest(
    frames: &[FrameDescriptor],
    base_url: &str,
    offset: u32,
    settings: &EncodeSettings,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let base_url = base_url.trim_end_matches('/');
    writeln!(out, "ffconcat version 1.0")?;
    for (i, frame) in frames.iter().enumerate() {
        let url = format!("{base_url}{}", frame_path(offset, i));
        writeln!(out, "file {}", quote(&url))?;
        writeln!(out, "duration {:.6}", settings.duration_of(frame))?;
    }
    if let Some(last) = frames.len().checked_sub(1) {
        let url = format!("{base_url}{}", frame_path(offset, last));
        writeln!(out, "file {}", quote(&url))?;
    }
    Ok(())
}

/// ffconcat single-quoting: `'` becomes `'\''`.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Runs the system `ffmpeg` over a concat manifest.
#[derive(Debug)]
pub struct FfmpegEncoder {
    settings: EncodeSettings,
    container: Container,
}

impl FfmpegEncoder {
    pub fn new(settings: EncodeSettings) -> ReelResult<Self> {
        settings.validate()?;
        let container = settings.container()?;
        if !settings.overwrite && settings.output.exists() {
            return Err(ReelError::config(format!(
                "output file '{}' already exists",
                settings.output.display()
            )));
        }
        Ok(Self {
            settings,
            container,
        })
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    pub fn command(&self, manifest: &Path) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        cmd.arg(if self.settings.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-f",
            "concat",
            "-safe",
            "0",
            "-protocol_whitelist",
            "file,http,tcp",
            "-i",
        ])
        .arg(manifest)
        .args([
            "-an",
            "-vf",
            "scale=trunc(iw/2)*2:trunc(ih/2)*2",
            "-r",
            &self.settings.fps.to_string(),
        ])
        .args(self.container.codec_args())
        .arg(&self.settings.output);
        cmd
    }

    /// Encode the frames listed in `manifest`. Blocks until ffmpeg exits; a non-zero
    /// exit carries ffmpeg's stderr.
    #[tracing::instrument(skip(self), fields(output = %self.settings.output.display()))]
    pub fn run(&self, manifest: &Path) -> ReelResult<()> {
        if !is_ffmpeg_on_path() {
            return Err(ReelError::encode(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }
        ensure_parent_dir(&self.settings.output)?;

        let output = self
            .command(manifest)
            .output()
            .map_err(|e| ReelError::encode(format!("failed to run ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        tracing::info!("encoding finished");
        Ok(())
    }
}
