pub mod archive;
pub mod date;
pub mod media;
pub mod scan;
pub mod sidecar;
pub mod writer;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tracing::info;

pub use media::{Reason, UpdateOutcome};
pub use scan::ScanOptions;
pub use writer::WriterConfig;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// The Takeout archive
    pub zip_path: PathBuf,
    /// Parent of the new extraction folder; the archive's directory when None
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub case_insensitive: bool,
    /// Leave sidecars on disk after a successful update
    pub keep_sidecars: bool,
    pub writer: WriterConfig,
}

impl SyncOptions {
    pub fn new(zip_path: impl Into<PathBuf>) -> Self {
        Self {
            zip_path: zip_path.into(),
            output_dir: None,
            dry_run: false,
            case_insensitive: false,
            keep_sidecars: false,
            writer: WriterConfig::detect(),
        }
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            dry_run: self.dry_run,
            case_insensitive: self.case_insensitive,
            keep_sidecars: self.keep_sidecars,
        }
    }
}

/// Aggregate counts over a run's outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub pairs: u64,
    pub updated: u64,
    pub would_update: u64,
    pub missing_timestamp: u64,
    pub failures: u64,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[UpdateOutcome]) -> Self {
        let mut summary = Summary {
            pairs: outcomes.len() as u64,
            ..Default::default()
        };
        for o in outcomes {
            if o.updated {
                summary.updated += 1;
                continue;
            }
            match o.reason {
                Some(Reason::DryRun) => summary.would_update += 1,
                Some(Reason::NoTimestamp) => summary.missing_timestamp += 1,
                _ => summary.failures += 1,
            }
        }
        summary
    }

    /// 1 when any pair failed for a reason other than dry-run or a missing timestamp.
    pub fn exit_code(&self) -> u8 {
        if self.failures == 0 {
            0
        } else {
            1
        }
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct SyncReport {
    pub extraction_root: PathBuf,
    pub outcomes: Vec<UpdateOutcome>,
}

impl SyncReport {
    pub fn summary(&self) -> Summary {
        Summary::from_outcomes(&self.outcomes)
    }
}

/// Check the archive, extract it into a fresh folder, then sync every sidecar.
///
/// Errors are archive-level: a missing archive, a folder that cannot be
/// created, or an archive that cannot be extracted. Per-pair problems end up
/// in the report's outcomes instead.
pub fn run(options: &SyncOptions) -> anyhow::Result<SyncReport> {
    let zip_path = options.zip_path.as_path();
    check_archive(zip_path)?;

    let extraction_root = archive::allocate_extraction_dir(zip_path, options.output_dir.as_deref())
        .context("Failed to create extraction directory")?;
    let stats = archive::extract_zip(zip_path, &extraction_root).context("Extraction failed")?;
    info!(
        "Extracted {} files ({} members rejected) into {}",
        stats.files,
        stats.rejected,
        extraction_root.display()
    );

    let outcomes = scan::scan_and_update(&extraction_root, &options.scan_options(), &options.writer);
    Ok(SyncReport {
        extraction_root,
        outcomes,
    })
}

fn check_archive(zip_path: &Path) -> anyhow::Result<()> {
    if !zip_path.exists() {
        bail!("ZIP not found: {}", zip_path.display());
    }
    if !zip_path.is_file() {
        bail!("Not a file: {}", zip_path.display());
    }
    Ok(())
}
