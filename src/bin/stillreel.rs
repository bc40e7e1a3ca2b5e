use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use stillreel::{FrameFormat, Resolution, VideoConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stillreel", version, about)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode the folders into one video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single composited frame to an image file.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Input folders, in playback order. Appended to the folders from --config.
    folders: Vec<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed canvas size, e.g. 1920x1080. Chosen from the images when omitted.
    #[arg(long)]
    resolution: Option<Resolution>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output video path (.mp4, .mkv, .mov or .webm).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Frames per second for image frames.
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// 1-based index of the frame in the video.
    #[arg(long, default_value_t = 1)]
    index: u32,

    /// Output image path; a .png extension selects PNG, anything else JPEG.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(input: InputArgs) -> anyhow::Result<VideoConfig> {
    let mut cfg = match &input.config {
        Some(path) => VideoConfig::from_json_file(path)?,
        None => VideoConfig::default(),
    };
    cfg.folders.extend(input.folders);
    if input.resolution.is_some() {
        cfg.resolution = input.resolution;
    }
    Ok(cfg)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.input)?;
    if let Some(out) = args.out {
        cfg.output = out;
    }
    if let Some(fps) = args.fps {
        cfg.fps = fps;
    }

    let summary = stillreel::render_video(&cfg)?;
    eprintln!(
        "wrote {} ({} frames, {} banners, {})",
        summary.output.display(),
        summary.frames,
        summary.banners,
        summary.resolution
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.input)?;
    let is_png = args
        .out
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(FrameFormat::Png.extension()));
    cfg.frame_format = if is_png {
        FrameFormat::Png
    } else {
        FrameFormat::Jpeg
    };

    let (frame, resolution) = stillreel::render_single_frame(&cfg, args.index)?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &frame.bytes)
        .with_context(|| format!("write frame '{}'", args.out.display()))?;
    eprintln!("wrote {} ({resolution})", args.out.display());
    Ok(())
}
