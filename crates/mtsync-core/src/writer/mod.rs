pub mod container;
pub mod filetimes;
pub mod jpeg;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::date;
use crate::media::MediaKind;
use filetimes::BirthtimeError;

/// Writer settings fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Result of the birthtime capability probe
    pub creation_time_write_supported: bool,
    /// Quality used when a JPEG is re-saved after its EXIF is rewritten
    pub jpeg_quality: u8,
}

impl WriterConfig {
    /// Probe the platform once and use the default JPEG quality.
    pub fn detect() -> Self {
        Self {
            creation_time_write_supported: filetimes::creation_time_write_supported(),
            jpeg_quality: jpeg::DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::detect()
    }
}

/// The media file's extension is not one the writer handles.
#[derive(Debug, Clone)]
pub struct UnsupportedMediaType(pub PathBuf);

impl fmt::Display for UnsupportedMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported file type: {}", self.0.display())
    }
}

impl std::error::Error for UnsupportedMediaType {}

/// Per-store results of one update. The stores are written independently;
/// see [`WriteReport::is_success`] for how they combine.
#[derive(Debug)]
pub struct WriteReport {
    /// EXIF or container tags
    pub metadata: anyhow::Result<()>,
    /// Modify and access time
    pub filesystem: anyhow::Result<()>,
    /// Birthtime, set from the sidecar's creation time
    pub creation_time: Result<(), BirthtimeError>,
}

impl WriteReport {
    /// The pair counts as updated when the metadata and the modify/access
    /// times were both written. The creation-time store never decides it.
    pub fn is_success(&self) -> bool {
        self.metadata.is_ok() && self.filesystem.is_ok()
    }

    /// Message of the first failing deciding store.
    pub fn failure_reason(&self) -> Option<String> {
        if let Err(e) = &self.metadata {
            return Some(format!("{:#}", e));
        }
        if let Err(e) = &self.filesystem {
            return Some(format!("{:#}", e));
        }
        None
    }
}

/// What the writer did with a media file.
#[derive(Debug)]
pub enum WriteStatus {
    /// Nothing was touched
    DryRun,
    Written(WriteReport),
}

/// Apply the sidecar's timestamps to `media_path`.
///
/// Capture time goes to the type-specific metadata and to modify/access time,
/// creation time to the birthtime where the platform allows it.
pub fn apply_timestamps(
    media_path: &Path,
    capture_time: i64,
    creation_time: i64,
    dry_run: bool,
    config: &WriterConfig,
) -> Result<WriteStatus, UnsupportedMediaType> {
    if dry_run {
        return Ok(WriteStatus::DryRun);
    }

    let kind = MediaKind::from_path(media_path)
        .ok_or_else(|| UnsupportedMediaType(media_path.to_path_buf()))?;

    let metadata = write_metadata(media_path, kind, capture_time, config);
    // After the metadata write, which rewrites the file
    let filesystem = filetimes::set_modify_access_time(media_path, capture_time);
    let creation_time = filetimes::set_creation_time(
        media_path,
        creation_time,
        config.creation_time_write_supported,
    );

    match &creation_time {
        Ok(()) => {}
        Err(e @ BirthtimeError::CapabilityUnavailable) => debug!("{}: {}", media_path.display(), e),
        Err(e) => warn!("{}: {}", media_path.display(), e),
    }

    Ok(WriteStatus::Written(WriteReport {
        metadata,
        filesystem,
        creation_time,
    }))
}

fn write_metadata(
    path: &Path,
    kind: MediaKind,
    capture_time: i64,
    config: &WriterConfig,
) -> anyhow::Result<()> {
    match kind {
        MediaKind::StillImage => {
            let datetime = date::format_exif_datetime(capture_time)
                .with_context(|| format!("timestamp {} out of range", capture_time))?;
            jpeg::write_capture_time(path, &datetime, config.jpeg_quality)
        }
        MediaKind::Video => {
            let datetime = date::format_container_datetime(capture_time)
                .with_context(|| format!("timestamp {} out of range", capture_time))?;
            container::write_creation_date(path, &datetime)
        }
    }
}
