#![forbid(unsafe_code)]

pub mod config;
pub mod consensus;
pub mod encode;
pub mod foundation;
pub mod overlay;
pub mod pipeline;
pub mod render;
pub mod scan;
pub mod serve;

pub use config::VideoConfig;
pub use encode::ffmpeg::{Container, EncodeSettings, FfmpegEncoder, is_ffmpeg_on_path};
pub use foundation::{
    core::{Resolution, Rgb8},
    error::{ReelError, ReelResult},
};
pub use overlay::{
    layout::{Cell, Column, Layout, LayoutSpec, Row},
    model::{HostInfo, OverlayModel},
    template::{Overlay, TemplateError, compile},
};
pub use pipeline::{PreparedFrames, RenderSummary, prepare, render_single_frame, render_video};
pub use render::compositor::{CompositorOptions, EncodedFrame, FrameCompositor, FrameFormat};
pub use scan::{
    descriptor::{ContentHash, FrameDescriptor, FrameKind, number_frames},
    natural::{compare_names, sort_paths},
    sequence::{EmptyFolderPolicy, ScanOptions, scan_folders},
};
pub use serve::{
    frames::FrameRoutes,
    server::{EphemeralJobServer, HttpResponse, RequestHandler},
};
