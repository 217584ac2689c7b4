use anyhow::Result;
use clap::{CommandFactory, Parser, ValueEnum};
use photo_rename_core::{
    load_config, run_batch, AppConfig, BatchOptions, BatchReport, CollectOptions, ExifReader,
    FileOutcome, FileReport, OverwritePolicy, PlanOptions, TransferMode, TransferOptions,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "photo-rename", version)]
#[command(about = "Simple Photo Renaming Tool")]
#[command(after_help = "Example: photo-rename -d ../myphotos DSCN6529.JPG")]
struct Cli {
    /// Destination directory
    #[arg(short, long, value_name = "DIR")]
    destdir: Option<PathBuf>,
    /// Overwrite existing destination files
    #[arg(short, long)]
    force: bool,
    /// Include hidden files in glob expansion
    #[arg(short = 'H', long)]
    hidden: bool,
    /// Move files instead of copying them
    #[arg(short, long = "move")]
    move_files: bool,
    /// Recurse into directories
    #[arg(short, long)]
    recursive: bool,
    /// Print each source --> destination mapping
    #[arg(short, long)]
    verbose: bool,
    /// Plan only, do not touch any file
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// Use the file modification time when DateTime is missing
    #[arg(long)]
    mtime_fallback: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
    /// Image files or glob patterns; with none, help is printed and the exit status is 0
    #[arg(value_name = "IMAGES")]
    images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.images.is_empty() {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    }
    init_tracing();

    let config = load_config()?;
    let verbose = cli.verbose || config.verbose;
    let options = batch_options(&cli, &config);
    let output = cli.output;

    let report = run_batch(&options, ExifReader, |file| {
        print_file(file, verbose, output)
    })?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_summary(&report, verbose),
    }

    if report.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
}

fn batch_options(cli: &Cli, config: &AppConfig) -> BatchOptions {
    let mode = if cli.move_files || config.move_files {
        TransferMode::Move
    } else {
        TransferMode::Copy
    };
    let overwrite = if cli.force || config.force {
        OverwritePolicy::Allow
    } else {
        OverwritePolicy::Forbid
    };

    BatchOptions {
        patterns: cli.images.clone(),
        destination: cli.destdir.clone().unwrap_or_else(|| config.destdir.clone()),
        collect: CollectOptions {
            recursive: cli.recursive || config.recursive,
            include_hidden: cli.hidden || config.include_hidden,
        },
        transfer: TransferOptions { mode, overwrite },
        plan: PlanOptions {
            mtime_fallback: cli.mtime_fallback || config.mtime_fallback,
        },
        dry_run: cli.dry_run,
    }
}

fn print_file(file: &FileReport, verbose: bool, output: OutputFormat) {
    let destination = file
        .destination
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    match &file.outcome {
        FileOutcome::Failed { reason } => eprintln!("photo-rename: {reason}"),
        FileOutcome::SkippedExisting => eprintln!(
            "photo-rename: {} already exists, skipping {} (use --force to overwrite)",
            destination,
            file.source.display()
        ),
        FileOutcome::SkippedCollision { with } => eprintln!(
            "photo-rename: {} would also become {}, skipping (already taken by {})",
            file.source.display(),
            destination,
            with.display()
        ),
        FileOutcome::SkippedDirectory => eprintln!(
            "photo-rename: {} is a directory, skipping (use --recursive)",
            file.source.display()
        ),
        FileOutcome::Planned if output == OutputFormat::Text => {
            println!("{} --> {} (dry-run)", file.source.display(), destination)
        }
        FileOutcome::Copied | FileOutcome::Moved if verbose && output == OutputFormat::Text => {
            println!("{} --> {}", file.source.display(), destination)
        }
        FileOutcome::AlreadyInPlace if verbose && output == OutputFormat::Text => {
            println!("{} --> {} (unchanged)", file.source.display(), destination)
        }
        _ => {}
    }
}

fn print_summary(report: &BatchReport, verbose: bool) {
    for pattern in &report.unmatched_patterns {
        eprintln!("photo-rename: no files match {pattern}");
    }
    for error in &report.pattern_errors {
        eprintln!("photo-rename: {error}");
    }

    if verbose {
        let stats = &report.stats;
        eprintln!(
            "candidates={} copied={} moved={} planned={} unchanged={} skipped={} failed={}",
            stats.candidates,
            stats.copied,
            stats.moved,
            stats.planned,
            stats.unchanged,
            stats.skipped,
            stats.failed
        );
    }
}
