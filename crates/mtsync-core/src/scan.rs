use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::date;
use crate::media::{MediaKind, Reason, SidecarPair, UpdateOutcome};
use crate::sidecar;
use crate::writer::{self, WriteStatus, WriterConfig};

/// Options for one scan of an extracted tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub dry_run: bool,
    pub case_insensitive: bool,
    /// Leave sidecars in place after a successful update
    pub keep_sidecars: bool,
}

/// All `*.json` files under `root`, in walk order.
pub fn find_sidecars(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Skipping unreadable path during scan: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_str().is_some_and(|n| n.ends_with(".json")))
        .map(|e| e.into_path())
        .collect()
}

/// Pair every sidecar under `root` with its media file and apply its timestamps.
/// One outcome per sidecar that resolved to a media file.
pub fn scan_and_update(root: &Path, options: &ScanOptions, config: &WriterConfig) -> Vec<UpdateOutcome> {
    // Collected up front: successful updates delete sidecars from the tree
    find_sidecars(root)
        .into_iter()
        .filter_map(|json_path| {
            let mut pair = SidecarPair::new(json_path);
            pair.media_path = sidecar::find_matching_media(&pair.json_path, options.case_insensitive);
            if pair.media_path.is_some() {
                if let Some(times) = date::json::read_sidecar_times(&pair.json_path) {
                    pair.capture_time = Some(times.capture_time);
                    pair.creation_time = Some(times.creation_time);
                }
            }
            process_pair(&pair, options, config)
        })
        .collect()
}

/// None for a sidecar without media; otherwise the pair's outcome.
fn process_pair(pair: &SidecarPair, options: &ScanOptions, config: &WriterConfig) -> Option<UpdateOutcome> {
    let Some(media_path) = pair.media_path.as_deref() else {
        debug!("No matching media for {}", pair.json_path.display());
        return None;
    };

    let mut outcome = UpdateOutcome {
        media_path: media_path.to_path_buf(),
        json_path: pair.json_path.clone(),
        timestamp: pair.capture_time,
        updated: false,
        reason: None,
        creation_time_applied: false,
    };

    let (Some(capture_time), Some(creation_time)) = (pair.capture_time, pair.creation_time) else {
        outcome.reason = Some(Reason::NoTimestamp);
        return Some(outcome);
    };

    let status = writer::apply_timestamps(media_path, capture_time, creation_time, options.dry_run, config);

    match status {
        Err(e) => {
            warn!("Failed to update {}: {}", media_path.display(), e);
            outcome.reason = Some(Reason::Failed(e.to_string()));
        }
        Ok(WriteStatus::DryRun) => {
            let current = match MediaKind::from_path(media_path) {
                Some(MediaKind::StillImage) => date::exif::read_capture_time(media_path),
                _ => None,
            };
            info!(
                "Would update {} from {} to {} (currently {})",
                media_path.display(),
                pair.json_path.display(),
                capture_time,
                current.as_deref().unwrap_or("unset")
            );
            outcome.reason = Some(Reason::DryRun);
        }
        Ok(WriteStatus::Written(report)) => {
            outcome.creation_time_applied = report.creation_time.is_ok();
            match report.failure_reason() {
                None => {
                    info!(
                        "Updated {} from {} to {}{}",
                        media_path.display(),
                        pair.json_path.display(),
                        capture_time,
                        if outcome.creation_time_applied { " (creation time set)" } else { "" }
                    );
                    outcome.updated = true;
                    if !options.keep_sidecars {
                        remove_sidecar(&pair.json_path);
                    }
                }
                Some(reason) => {
                    warn!("Failed to update {}: {}", media_path.display(), reason);
                    outcome.reason = Some(Reason::Failed(reason));
                }
            }
        }
    }

    Some(outcome)
}

/// Missing file is fine; any other error only gets logged.
fn remove_sidecar(json_path: &Path) {
    match fs::remove_file(json_path) {
        Ok(()) => debug!("Removed {}", json_path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", json_path.display(), e),
    }
}
