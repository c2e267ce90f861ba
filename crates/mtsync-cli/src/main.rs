use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn, Level};

use mtsync_core::{SyncOptions, WriterConfig};

#[derive(Parser)]
#[command(
    name = "mtsync",
    version,
    about = "Extract a Google Photos Takeout zip and sync media timestamps from JSON metadata"
)]
struct Cli {
    /// Path to the ZIP archive (e.g. a Google Takeout export)
    zip_path: PathBuf,

    /// Directory where a new extraction folder will be created
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not modify files, just report intended changes
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Allow case-insensitive filename matching if an exact match is missing
    #[arg(long)]
    case_insensitive: bool,

    /// Keep JSON sidecars after their media file was updated
    #[arg(long)]
    keep_sidecars: bool,

    /// JPEG quality used when re-saving images with rewritten EXIF
    #[arg(long, default_value_t = 95, value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let writer = WriterConfig::detect().with_jpeg_quality(cli.jpeg_quality);
    if !writer.creation_time_write_supported {
        warn!("File creation time cannot be set on this platform; only modify/access times will be updated");
    }

    let options = SyncOptions {
        zip_path: cli.zip_path,
        output_dir: cli.output_dir,
        dry_run: cli.dry_run,
        case_insensitive: cli.case_insensitive,
        keep_sidecars: cli.keep_sidecars,
        writer,
    };

    let report = match mtsync_core::run(&options) {
        Ok(report) => report,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(2);
        }
    };

    let summary = report.summary();
    println!("Extraction folder: {}", report.extraction_root.display());
    println!("Metadata/media pairs found: {}", summary.pairs);
    if options.dry_run {
        println!("Would update: {}", summary.would_update);
    }
    println!("Updated: {}", summary.updated);
    println!("Missing timestamp: {}", summary.missing_timestamp);
    println!("Failures: {}", summary.failures);

    ExitCode::from(summary.exit_code())
}
