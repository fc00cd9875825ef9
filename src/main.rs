//! Main entry point for the flexzip CLI application.
//!
//! Opens a flexControl export archive, then validates, fingerprints and
//! optionally exports every sample found inside.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use flexzip::{ArchiveReader, Cli, Sample, SampleRecord};

/// Per-archive tallies for the summary line
#[derive(Default)]
struct Summary {
    valid: usize,
    invalid: usize,
    exported: usize,
    skipped: usize,
}

/// Application entry point.
///
/// Parses command-line arguments, installs logging and dispatches to the
/// listing or validation mode. Exits with status 1 when any sample fails
/// validation.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let archive = ArchiveReader::open(&cli.file).await?;

    // List mode: show sample roots and exit
    if cli.list {
        list_samples(&archive);
        return Ok(());
    }

    let summary = process_archive(&archive, &cli).await?;

    if !cli.is_very_quiet() {
        eprintln!(
            "\n{} valid, {} invalid sample(s) in {}",
            summary.valid,
            summary.invalid,
            archive.name()
        );
        if cli.export_dir.is_some() {
            eprintln!(
                "{} exported, {} skipped",
                summary.exported, summary.skipped
            );
        }
    }

    if summary.invalid > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// List sample roots with their file counts.
fn list_samples(archive: &ArchiveReader) {
    let mut count = 0usize;
    for sample in archive.samples() {
        println!("{:>5}  {}", sample.file_count(), display_root(sample.root_path()));
        count += 1;
    }
    println!("{}", "-".repeat(40));
    println!("{:>5}  sample(s)", count);
}

/// Validate every sample, reporting failures up to `--max-errors`.
///
/// Content and read problems count against the sample and processing
/// moves on; failing to write an export aborts the run.
async fn process_archive(archive: &ArchiveReader, cli: &Cli) -> Result<Summary> {
    let mut summary = Summary::default();

    for mut sample in archive.samples() {
        let record = match check_sample(&mut sample).await {
            Ok(record) => record,
            Err(e) => {
                summary.invalid += 1;
                if summary.invalid <= cli.max_errors {
                    eprintln!("FAIL  {}: {}", display_root(sample.root_path()), e);
                } else if summary.invalid == cli.max_errors + 1 && !cli.is_very_quiet() {
                    eprintln!("(further failures not shown)");
                }
                continue;
            }
        };
        summary.valid += 1;

        if cli.json {
            println!("{}", serde_json::to_string(&record)?);
        } else if !cli.is_quiet() {
            println!("  OK  {}  {}", record.digest, display_root(&record.root_path));
            if cli.verbose {
                print_record(&record);
            }
        }

        if let Some(ref dir) = cli.export_dir {
            let destination = PathBuf::from(dir).join(format!("{}.zip", record.digest));

            // Same digest means same content, so an existing file is a duplicate
            if destination.exists() && (cli.never_overwrite || !cli.overwrite) {
                if !cli.is_quiet() {
                    eprintln!("Skipping: {} (already exported)", destination.display());
                }
                summary.skipped += 1;
                continue;
            }

            sample.export(&destination).await?;
            summary.exported += 1;
            if !cli.is_quiet() {
                println!("   exported: {}", destination.display());
            }
        }
    }

    Ok(summary)
}

/// Validate one sample and collect its fields.
async fn check_sample(sample: &mut Sample) -> flexzip::Result<SampleRecord> {
    sample.validate().await?;
    sample.record().await
}

fn print_record(record: &SampleRecord) {
    let rows = [
        ("Sample ID", record.sample_id.clone()),
        ("Target ID", record.target_id.clone()),
        ("Acquired", record.acquisition_date.to_rfc3339()),
        ("Instrument", record.instrument_serial_number.clone()),
        ("Instrument type", record.instrument_type.to_string()),
        ("Digitizer type", record.digitizer_type.to_string()),
        ("Position", record.position.clone()),
        ("Original path", record.original_path.clone()),
        ("flexControl", record.flex_control_version.clone()),
        ("AIDA", record.aida_version.clone()),
        ("Calibrated", record.calibration_date.to_rfc3339()),
        ("Spectrum size", record.spectrum_size.to_string()),
    ];
    for (label, value) in rows {
        println!("        {:<16} {}", label, value);
    }
}

fn display_root(root: &str) -> &str {
    if root.is_empty() { "." } else { root }
}
