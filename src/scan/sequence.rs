use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{ReelError, ReelResult},
    scan::{
        descriptor::{FrameDescriptor, number_frames},
        natural::sort_paths,
    },
};

pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"];

/// What to do with a folder that contributes no frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyFolderPolicy {
    /// Insert a banner frame naming the folder.
    #[default]
    Banner,
    /// Leave the folder out silently.
    Skip,
    /// Abort the scan.
    Fail,
}

#[derive(Clone, Debug)]
pub struct ScanOptions {
    pub extensions: Vec<String>,
    pub empty_folders: EmptyFolderPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            empty_folders: EmptyFolderPolicy::default(),
        }
    }
}

impl ScanOptions {
    fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Build the numbered frame sequence for `folders`, in the given folder order and in
/// natural order inside each folder.
#[tracing::instrument(skip(opts))]
pub fn scan_folders(folders: &[PathBuf], opts: &ScanOptions) -> ReelResult<Vec<FrameDescriptor>> {
    let mut groups = Vec::with_capacity(folders.len());
    for folder in folders {
        let listed = list_images(folder, opts);
        let group = match listed {
            Ok(paths) if !paths.is_empty() => {
                tracing::debug!(folder = %folder.display(), frames = paths.len(), "scanned folder");
                paths.into_iter().map(FrameDescriptor::from_path).collect()
            }
            Ok(_) => empty_folder(folder, opts, "no images found".to_owned())?,
            Err(e) => empty_folder(folder, opts, format!("{e:#}"))?,
        };
        groups.push(group);
    }
    let frames = number_frames(groups);
    tracing::info!(folders = folders.len(), frames = frames.len(), "scan complete");
    Ok(frames)
}

fn empty_folder(
    folder: &Path,
    opts: &ScanOptions,
    reason: String,
) -> ReelResult<Vec<FrameDescriptor>> {
    match opts.empty_folders {
        EmptyFolderPolicy::Banner => {
            tracing::warn!(folder = %folder.display(), %reason, "folder yields a banner frame");
            Ok(vec![FrameDescriptor::banner(format!(
                "{}: {reason}",
                folder.display()
            ))])
        }
        EmptyFolderPolicy::Skip => {
            tracing::warn!(folder = %folder.display(), %reason, "skipping folder");
            Ok(Vec::new())
        }
        EmptyFolderPolicy::Fail => Err(ReelError::config(format!(
            "folder '{}' contributes no frames: {reason}",
            folder.display()
        ))),
    }
}

fn list_images(folder: &Path, opts: &ScanOptions) -> anyhow::Result<Vec<PathBuf>> {
    let rd = std::fs::read_dir(folder)
        .with_context(|| format!("read folder '{}'", folder.display()))?;
    let mut paths = Vec::new();
    for entry in rd {
        let path = entry
            .with_context(|| format!("list folder '{}'", folder.display()))?
            .path();
        if path.is_file() && opts.accepts(&path) {
            paths.push(path);
        }
    }
    sort_paths(&mut paths);
    Ok(paths)
}

#[cfg(test)]
#[path = "../../tests/unit/scan/sequence.rs"]
mod tests;
