use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use rostercards::{ExtractionConfig, ExtractionSession, ExtractionStatus, StudentRecord};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

#[derive(Debug, Parser)]
#[command(about = "Extract student names and headshots from a roster PDF.")]
struct Args {
    /// Roster PDF to read
    input: PathBuf,

    /// Directory receiving student-data.json and student-photos.zip
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write every headshot as a loose JPEG into <output-dir>/photos
    #[arg(long)]
    unpacked: bool,

    /// Text that ends each student's block (matched case-insensitively)
    #[arg(long)]
    marker: Option<String>,

    /// Name runs must be at least this many times larger than the marker text
    #[arg(long)]
    emphasis_ratio: Option<f32>,

    /// Baseline font size used when a page has no marker text
    #[arg(long)]
    default_baseline: Option<f32>,

    /// Smallest accepted photo width and height, in pixels
    #[arg(long)]
    min_image_side: Option<u32>,

    /// Largest accepted photo width / height ratio
    #[arg(long)]
    max_aspect_ratio: Option<f32>,

    /// JPEG quality between 0 and 1
    #[arg(long)]
    quality: Option<f32>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, String> {
    env_logger::init();
    let args = Args::parse();
    let config = build_config(&args);

    let bytes = fs::read(&args.input)
        .map_err(|e| format!("failed to read {}: {e}", args.input.display()))?;

    let mut session = ExtractionSession::new(config);
    let status = session.extract_pdf(bytes).await;
    match &status {
        ExtractionStatus::Succeeded { count, expected } => {
            write_outputs(&session, &args)?;
            println!("{}", status_line(&status));
            if count < expected {
                println!("{} detected names had no usable photo.", expected - count);
            }
            Ok(ExitCode::SUCCESS)
        }
        ExtractionStatus::Failed { reason } => {
            println!("{}", status_line(&status));
            eprintln!("{reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn status_line(status: &ExtractionStatus) -> String {
    match status {
        ExtractionStatus::Succeeded { count, .. } => {
            format!("Success! Extracted {count} students.")
        }
        ExtractionStatus::Failed { .. } => "Process failed.".to_owned(),
    }
}

fn build_config(args: &Args) -> ExtractionConfig {
    let mut config = ExtractionConfig::default();

    if let Some(marker) = args.marker.clone() {
        config.marker = marker;
    }

    if let Some(emphasis_ratio) = args.emphasis_ratio {
        config.emphasis_ratio = emphasis_ratio;
    }

    if let Some(default_baseline) = args.default_baseline {
        config.default_baseline = default_baseline;
    }

    if let Some(min_image_side) = args.min_image_side {
        config.min_image_side = min_image_side;
    }

    if let Some(max_aspect_ratio) = args.max_aspect_ratio {
        config.max_aspect_ratio = max_aspect_ratio;
    }

    if let Some(quality) = args.quality {
        config.jpeg_quality = quality;
    }

    config
}

fn write_outputs(session: &ExtractionSession, args: &Args) -> Result<(), String> {
    let dir = &args.output_dir;
    fs::create_dir_all(dir).map_err(|e| format!("failed to create {}: {e}", dir.display()))?;

    let json_path = dir.join("student-data.json");
    write_json(session.records(), &json_path)
        .map_err(|e| format!("failed to write {}: {e}", json_path.display()))?;

    let zip_path = dir.join("student-photos.zip");
    let file = fs::File::create(&zip_path)
        .map_err(|e| format!("failed to create {}: {e}", zip_path.display()))?;
    session
        .archive()
        .write_zip(BufWriter::new(file))
        .map_err(|e| format!("failed to write {}: {e}", zip_path.display()))?;

    if args.unpacked {
        let photos = dir.join("photos");
        session
            .archive()
            .write_to_dir(&photos)
            .map_err(|e| format!("failed to write photos to {}: {e}", photos.display()))?;
    }

    println!("Saved {} and {}", json_path.display(), zip_path.display());
    Ok(())
}

fn write_json(records: &[StudentRecord], path: &Path) -> Result<(), rostercards::ExtractError> {
    let file = BufWriter::new(fs::File::create(path)?);
    let mut serializer =
        serde_json::Serializer::with_formatter(file, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    Ok(())
}
