use std::path::Path;

use chrono::{DateTime, Local};

use crate::{
    foundation::core::Resolution,
    scan::descriptor::{FileFacts, FrameDescriptor},
};

/// Identity of the machine producing the video, read once per run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostInfo {
    pub machine_id: String,
    pub hostname: String,
}

impl HostInfo {
    pub fn detect() -> Self {
        Self {
            machine_id: first_line_of(&["/etc/machine-id", "/var/lib/dbus/machine-id"])
                .unwrap_or_default(),
            hostname: std::env::var("HOSTNAME")
                .ok()
                .or_else(|| std::env::var("COMPUTERNAME").ok())
                .filter(|h| !h.trim().is_empty())
                .or_else(|| first_line_of(&["/proc/sys/kernel/hostname", "/etc/hostname"]))
                .unwrap_or_default(),
        }
    }
}

fn first_line_of(paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|p| {
        let text = std::fs::read_to_string(p).ok()?;
        let line = text.lines().next()?.trim();
        (!line.is_empty()).then(|| line.to_owned())
    })
}

/// Everything an overlay template can reference for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayModel {
    pub file_name: String,
    pub folder_name: String,
    pub is_symlink: bool,
    pub modified: Option<DateTime<Local>>,
    pub size: Option<u64>,
    pub resolution: Option<Resolution>,
    pub index_in_folder: u32,
    pub index_in_video: u32,
    pub created: DateTime<Local>,
    pub host: HostInfo,
    pub warning: String,
}

impl OverlayModel {
    /// Snapshot live disk state for `path`; only the counters come from `frame`.
    pub fn for_file(
        frame: &FrameDescriptor,
        path: &Path,
        facts: &FileFacts,
        resolution: Option<Resolution>,
        created: DateTime<Local>,
        host: &HostInfo,
        warning: String,
    ) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folder_name = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_name,
            folder_name,
            is_symlink: facts.is_symlink,
            modified: facts.modified.map(DateTime::<Local>::from),
            size: facts.size,
            resolution,
            index_in_folder: frame.index_in_folder(),
            index_in_video: frame.index_in_video(),
            created,
            host: host.clone(),
            warning,
        }
    }
}
