use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use chrono::Local;

use crate::{
    config::VideoConfig,
    consensus,
    encode::ffmpeg::{FfmpegEncoder, write_manifest},
    foundation::{
        core::Resolution,
        error::{ReelError, ReelResult},
    },
    overlay::{layout::Layout, model::HostInfo},
    render::compositor::{EncodedFrame, FrameCompositor},
    scan::{descriptor::FrameDescriptor, sequence::scan_folders},
    serve::{frames::FrameRoutes, server::EphemeralJobServer},
};

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSummary {
    pub output: PathBuf,
    pub resolution: Resolution,
    pub frames: usize,
    pub banners: usize,
    pub frames_served: u64,
    pub elapsed: Duration,
}

/// Scanned frames plus a compositor sized for them.
#[derive(Debug)]
pub struct PreparedFrames {
    pub frames: Vec<FrameDescriptor>,
    pub compositor: FrameCompositor,
}

impl PreparedFrames {
    pub fn resolution(&self) -> Resolution {
        self.compositor.resolution()
    }
}

/// Validate `cfg`, scan its folders and settle on a canvas resolution.
#[tracing::instrument(skip(cfg))]
pub fn prepare(cfg: &VideoConfig) -> ReelResult<PreparedFrames> {
    cfg.validate()?;
    let layout = Layout::compile(&cfg.layout)?;
    let frames = scan_folders(&cfg.folders, &cfg.scan_options())?;

    let resolution = match cfg.resolution {
        Some(fixed) => fixed,
        None => consensus::choose(&consensus::tally(&frames)),
    };
    tracing::info!(%resolution, fixed = cfg.resolution.is_some(), "canvas resolution");

    let compositor = FrameCompositor::new(
        resolution,
        layout,
        cfg.compositor_options(Local::now(), HostInfo::detect()),
    )?;
    Ok(PreparedFrames { frames, compositor })
}

/// Scan, composite and encode `cfg.folders` into `cfg.output`.
///
/// Frames are rendered on demand while ffmpeg pulls them over loopback HTTP; the
/// concat manifest lives in a scratch directory removed on return.
#[tracing::instrument(skip(cfg), fields(output = %cfg.output.display()))]
pub fn render_video(cfg: &VideoConfig) -> ReelResult<RenderSummary> {
    let started = Instant::now();
    let encoder = FfmpegEncoder::new(cfg.encode_settings())?;
    let PreparedFrames { frames, compositor } = prepare(cfg)?;
    if frames.is_empty() {
        return Err(ReelError::config("no frames to encode"));
    }
    let resolution = compositor.resolution();
    let banners = frames.iter().filter(|f| f.is_banner()).count();
    let total = frames.len();

    let routes = FrameRoutes::new(frames, Arc::new(compositor));
    let offset = routes.offset();
    let server = EphemeralJobServer::new(routes, cfg.ports())?;

    let scratch = tempfile::Builder::new()
        .prefix("stillreel-")
        .tempdir()
        .context("create scratch directory")?;
    let manifest = scratch.path().join("frames.ffconcat");

    server.run(|port| {
        let file = File::create(&manifest)
            .with_context(|| format!("create manifest '{}'", manifest.display()))?;
        let mut out = BufWriter::new(file);
        write_manifest(
            server.handler().frames(),
            &format!("http://127.0.0.1:{port}"),
            offset,
            encoder.settings(),
            &mut out,
        )
        .and_then(|()| out.flush())
        .context("write manifest")?;
        tracing::debug!(manifest = %manifest.display(), frames = total, "manifest written");
        encoder.run(&manifest)
    })?;

    let summary = RenderSummary {
        output: cfg.output.clone(),
        resolution,
        frames: total,
        banners,
        frames_served: server.handler().served(),
        elapsed: started.elapsed(),
    };
    tracing::info!(
        output = %summary.output.display(),
        frames = summary.frames,
        banners = summary.banners,
        served = summary.frames_served,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "video written"
    );
    Ok(summary)
}

/// Render the frame with 1-based video index `index` exactly as the encoder would see it.
pub fn render_single_frame(cfg: &VideoConfig, index: u32) -> ReelResult<(EncodedFrame, Resolution)> {
    let prepared = prepare(cfg)?;
    let frame = prepared
        .frames
        .iter()
        .find(|f| f.index_in_video() == index)
        .ok_or_else(|| {
            ReelError::config(format!(
                "frame {index} out of range (1..={})",
                prepared.frames.len()
            ))
        })?;
    Ok((prepared.compositor.render(frame), prepared.resolution()))
}
