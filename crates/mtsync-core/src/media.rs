use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions handled by the still-image writer
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Extensions handled by the video container writer
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "3gp"];

/// Which timestamp stores a media file carries besides the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// JPEG with EXIF capture-time fields
    StillImage,
    /// ISO-BMFF / QuickTime container with a creation-date tag
    Video,
}

impl MediaKind {
    /// Classify a file by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::StillImage)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// One sidecar and what was learned about it during the scan.
#[derive(Debug, Clone)]
pub struct SidecarPair {
    /// The JSON metadata file
    pub json_path: PathBuf,
    /// The media file it describes, if one was found
    pub media_path: Option<PathBuf>,
    /// `photoTakenTime` in epoch seconds
    pub capture_time: Option<i64>,
    /// `creationTime` in epoch seconds
    pub creation_time: Option<i64>,
}

impl SidecarPair {
    pub fn new(json_path: PathBuf) -> Self {
        Self {
            json_path,
            media_path: None,
            capture_time: None,
            creation_time: None,
        }
    }
}

/// Why a pair was not updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    NoTimestamp,
    DryRun,
    Failed(String),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::NoTimestamp => write!(f, "no-timestamp"),
            Reason::DryRun => write!(f, "dry-run"),
            Reason::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

/// Result record for one sidecar/media pair.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub media_path: PathBuf,
    pub json_path: PathBuf,
    /// Capture time that was (or would have been) applied
    pub timestamp: Option<i64>,
    pub updated: bool,
    /// Set whenever `updated` is false
    pub reason: Option<Reason>,
    /// Whether the filesystem creation time was also set
    pub creation_time_applied: bool,
}

impl UpdateOutcome {
    /// A non-benign failure: anything other than dry-run or a missing timestamp.
    pub fn is_failure(&self) -> bool {
        matches!(self.reason, Some(Reason::Failed(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a/IMG_1.jpg")), Some(MediaKind::StillImage));
        assert_eq!(MediaKind::from_path(Path::new("IMG_1.JPEG")), Some(MediaKind::StillImage));
        assert_eq!(MediaKind::from_path(Path::new("clip.MOV")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("clip.3gp")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("shot.png")), None);
        assert_eq!(MediaKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(Reason::NoTimestamp.to_string(), "no-timestamp");
        assert_eq!(Reason::DryRun.to_string(), "dry-run");
        assert_eq!(Reason::Failed("boom".into()).to_string(), "boom");
    }
}
