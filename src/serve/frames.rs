use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use axum::http::Method;
use rand::Rng as _;

use crate::{
    render::compositor::FrameCompositor,
    scan::descriptor::FrameDescriptor,
    serve::server::{HttpResponse, RequestHandler},
};

const FRAME_PREFIX: &str = "/img/";
const MAX_OFFSET: u32 = 1_000_000;

pub fn frame_path(offset: u32, position: usize) -> String {
    format!("{FRAME_PREFIX}{}", u64::from(offset) + position as u64)
}

/// Serves `GET /img/<n>` by rendering frame `n - offset`.
///
/// The offset is random per run so stale URLs from an earlier run never resolve.
#[derive(Debug)]
pub struct FrameRoutes {
    frames: Vec<FrameDescriptor>,
    compositor: Arc<FrameCompositor>,
    offset: u32,
    served: AtomicU64,
}

impl FrameRoutes {
    pub fn new(frames: Vec<FrameDescriptor>, compositor: Arc<FrameCompositor>) -> Self {
        let offset = rand::rng().random_range(0..MAX_OFFSET);
        Self::with_offset(frames, compositor, offset)
    }

    pub fn with_offset(
        frames: Vec<FrameDescriptor>,
        compositor: Arc<FrameCompositor>,
        offset: u32,
    ) -> Self {
        Self {
            frames,
            compositor,
            offset,
            served: AtomicU64::new(0),
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn frames(&self) -> &[FrameDescriptor] {
        &self.frames
    }

    /// URL path of the frame at `position` in the sequence.
    pub fn path_for(&self, position: usize) -> String {
        frame_path(self.offset, position)
    }

    /// Number of frames rendered so far.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    fn lookup(&self, path: &str) -> Option<&FrameDescriptor> {
        let n = path.strip_prefix(FRAME_PREFIX)?;
        if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let absolute: u64 = n.parse().ok()?;
        let position = absolute.checked_sub(u64::from(self.offset))?;
        self.frames.get(usize::try_from(position).ok()?)
    }
}

impl RequestHandler for FrameRoutes {
    fn handle(&self, method: &Method, path: &str) -> HttpResponse {
        if method != Method::GET {
            return HttpResponse::not_found(path);
        }
        let Some(frame) = self.lookup(path) else {
            tracing::debug!(path, "unknown frame requested");
            return HttpResponse::not_found(path);
        };
        let encoded = self.compositor.render(frame);
        self.served.fetch_add(1, Ordering::Relaxed);
        HttpResponse::ok(encoded.content_type, encoded.bytes)
    }
}
