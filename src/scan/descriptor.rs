use std::{
    fmt,
    io::Cursor,
    path::{Path, PathBuf},
    time::SystemTime,
};

use sha2::Digest as _;

use crate::foundation::core::Resolution;

/// SHA-256 of a file's bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = sha2::Sha256::digest(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Filesystem facts that can change between scan and render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileFacts {
    pub is_symlink: bool,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl FileFacts {
    /// Best effort: missing metadata leaves fields empty instead of failing.
    pub fn read(path: &Path) -> Self {
        let is_symlink = std::fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        let meta = std::fs::metadata(path).ok();
        Self {
            is_symlink,
            size: meta.as_ref().map(|m| m.len()),
            modified: meta.and_then(|m| m.modified().ok()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FileFrame {
    pub path: PathBuf,
    pub hash: Option<ContentHash>,
    pub resolution: Option<Resolution>,
    pub facts: FileFacts,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FrameKind {
    File(FileFrame),
    Banner(String),
}

/// One frame of the output video.
///
/// Counters start at zero and are set once by [`number_frames`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameDescriptor {
    kind: FrameKind,
    index_in_folder: u32,
    index_in_video: u32,
}

impl FrameDescriptor {
    /// Capture scan-time metadata for `path`. Never fails: unreadable files get no hash,
    /// undecodable ones no resolution.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let facts = FileFacts::read(&path);
        let (hash, resolution) = match std::fs::read(&path) {
            Ok(bytes) => (Some(ContentHash::of_bytes(&bytes)), probe_resolution(&bytes)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot read frame source");
                (None, None)
            }
        };
        Self::from_kind(FrameKind::File(FileFrame {
            path,
            hash,
            resolution,
            facts,
        }))
    }

    pub fn banner(message: impl Into<String>) -> Self {
        Self::from_kind(FrameKind::Banner(message.into()))
    }

    fn from_kind(kind: FrameKind) -> Self {
        Self {
            kind,
            index_in_folder: 0,
            index_in_video: 0,
        }
    }

    pub fn kind(&self) -> &FrameKind {
        &self.kind
    }

    pub fn is_banner(&self) -> bool {
        matches!(self.kind, FrameKind::Banner(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            FrameKind::File(f) => Some(&f.path),
            FrameKind::Banner(_) => None,
        }
    }

    pub fn resolution(&self) -> Option<Resolution> {
        match &self.kind {
            FrameKind::File(f) => f.resolution,
            FrameKind::Banner(_) => None,
        }
    }

    pub fn index_in_folder(&self) -> u32 {
        self.index_in_folder
    }

    pub fn index_in_video(&self) -> u32 {
        self.index_in_video
    }
}

/// Read only the header to learn the pixel size.
pub(crate) fn probe_resolution(bytes: &[u8]) -> Option<Resolution> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    let (w, h) = reader.into_dimensions().ok()?;
    Resolution::new(w, h).ok()
}

/// Flatten per-folder groups into one sequence and assign 1-based counters: the folder
/// index restarts with every group, the video index runs across all of them.
pub fn number_frames(groups: Vec<Vec<FrameDescriptor>>) -> Vec<FrameDescriptor> {
    let mut out = Vec::with_capacity(groups.iter().map(Vec::len).sum());
    let mut in_video = 0u32;
    for group in groups {
        for (i, mut frame) in group.into_iter().enumerate() {
            in_video += 1;
            frame.index_in_folder = u32::try_from(i + 1).unwrap_or(u32::MAX);
            frame.index_in_video = in_video;
            out.push(frame);
        }
    }
    out
}
