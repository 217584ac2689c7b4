use crate::collector::{collect_files, CollectOptions};
use crate::metadata::MetadataReader;
use crate::planner::{PlanOptions, RenamePlanner};
use crate::transfer::{preflight, transfer_file, TransferOptions, TransferOutcome};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub patterns: Vec<String>,
    pub destination: PathBuf,
    pub collect: CollectOptions,
    pub transfer: TransferOptions,
    pub plan: PlanOptions,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Copied,
    Moved,
    Planned,
    AlreadyInPlace,
    SkippedExisting,
    SkippedCollision { with: PathBuf },
    SkippedDirectory,
    Failed { reason: String },
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

impl From<TransferOutcome> for FileOutcome {
    fn from(outcome: TransferOutcome) -> Self {
        match outcome {
            TransferOutcome::Copied => FileOutcome::Copied,
            TransferOutcome::Moved => FileOutcome::Moved,
            TransferOutcome::SkippedExisting => FileOutcome::SkippedExisting,
            TransferOutcome::AlreadyInPlace => FileOutcome::AlreadyInPlace,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub candidates: usize,
    pub copied: usize,
    pub moved: usize,
    pub planned: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchReport {
    pub destination: PathBuf,
    pub files: Vec<FileReport>,
    pub unmatched_patterns: Vec<String>,
    pub pattern_errors: Vec<String>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
            || !self.unmatched_patterns.is_empty()
            || !self.pattern_errors.is_empty()
    }

    fn record(&mut self, report: FileReport) {
        match &report.outcome {
            FileOutcome::Copied => self.stats.copied += 1,
            FileOutcome::Moved => self.stats.moved += 1,
            FileOutcome::Planned => self.stats.planned += 1,
            FileOutcome::AlreadyInPlace => self.stats.unchanged += 1,
            FileOutcome::SkippedExisting
            | FileOutcome::SkippedCollision { .. }
            | FileOutcome::SkippedDirectory => self.stats.skipped += 1,
            FileOutcome::Failed { .. } => self.stats.failed += 1,
        }
        self.files.push(report);
    }
}

/// Collects every pattern, then plans and transfers each file on its own.
/// Only failing to create the destination directory aborts the run.
pub fn run_batch<R, F>(options: &BatchOptions, reader: R, mut on_file: F) -> Result<BatchReport>
where
    R: MetadataReader,
    F: FnMut(&FileReport),
{
    let collected = collect_files(&options.patterns, &options.collect);

    if !options.dry_run && !options.destination.is_dir() {
        fs::create_dir_all(&options.destination).with_context(|| {
            format!(
                "Could not create destination directory: {}",
                options.destination.display()
            )
        })?;
    }

    let planner = RenamePlanner::with_options(reader, options.plan);
    let mut report = BatchReport {
        destination: options.destination.clone(),
        unmatched_patterns: collected.unmatched,
        pattern_errors: collected.errors.iter().map(ToString::to_string).collect(),
        ..BatchReport::default()
    };
    report.stats.candidates = collected.files.len();

    for dir in collected.skipped_directories {
        let entry = FileReport {
            source: dir,
            destination: None,
            outcome: FileOutcome::SkippedDirectory,
        };
        on_file(&entry);
        report.record(entry);
    }

    let mut claimed = HashMap::<PathBuf, PathBuf>::new();
    for source in collected.files {
        let destination = match planner.plan_destination(&source, &options.destination) {
            Ok(destination) => destination,
            Err(err) => {
                let entry = FileReport {
                    source,
                    destination: None,
                    outcome: FileOutcome::Failed {
                        reason: err.to_string(),
                    },
                };
                on_file(&entry);
                report.record(entry);
                continue;
            }
        };

        let outcome = if let Some(earlier) = claimed.get(&destination) {
            FileOutcome::SkippedCollision {
                with: earlier.clone(),
            }
        } else if options.dry_run {
            preflight(&source, &destination, &options.transfer)
                .map(FileOutcome::from)
                .unwrap_or(FileOutcome::Planned)
        } else {
            match transfer_file(&source, &destination, &options.transfer) {
                Ok(outcome) => FileOutcome::from(outcome),
                Err(err) => FileOutcome::Failed {
                    reason: format!("{err:#}"),
                },
            }
        };
        // A failed transfer leaves the name free for the next source.
        if !outcome.is_failure() {
            claimed
                .entry(destination.clone())
                .or_insert_with(|| source.clone());
        }

        tracing::debug!(
            from = %source.display(),
            to = %destination.display(),
            ?outcome,
            "processed"
        );
        let entry = FileReport {
            source,
            destination: Some(destination),
            outcome,
        };
        on_file(&entry);
        report.record(entry);
    }

    Ok(report)
}
