use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, FileTimes};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    #[default]
    Copy,
    Move,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    #[default]
    Forbid,
    Allow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    pub mode: TransferMode,
    pub overwrite: OverwritePolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    Copied,
    Moved,
    SkippedExisting,
    AlreadyInPlace,
}

/// The outcome decided without touching any file, or `None` when the
/// transfer has to run. Dry runs report exactly what a real run would skip.
pub fn preflight(
    source: &Path,
    destination: &Path,
    options: &TransferOptions,
) -> Option<TransferOutcome> {
    if is_same_file(source, destination) {
        return Some(TransferOutcome::AlreadyInPlace);
    }
    if destination.exists() && options.overwrite == OverwritePolicy::Forbid {
        return Some(TransferOutcome::SkippedExisting);
    }
    None
}

pub fn transfer_file(
    source: &Path,
    destination: &Path,
    options: &TransferOptions,
) -> Result<TransferOutcome> {
    // Not atomic with the transfer below; a concurrent writer can still race us.
    if let Some(outcome) = preflight(source, destination, options) {
        return Ok(outcome);
    }

    match options.mode {
        TransferMode::Copy => {
            copy_preserving_times(source, destination)?;
            Ok(TransferOutcome::Copied)
        }
        TransferMode::Move => {
            move_file(source, destination)?;
            Ok(TransferOutcome::Moved)
        }
    }
}

fn move_file(source: &Path, destination: &Path) -> Result<()> {
    let rename_err = match fs::rename(source, destination) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    // Cross-device moves cannot be renamed; fall back to copy and delete.
    tracing::debug!(
        from = %source.display(),
        to = %destination.display(),
        error = %rename_err,
        "rename failed, copying instead"
    );
    copy_preserving_times(source, destination).with_context(|| {
        format!(
            "Failed to move {} -> {}: {rename_err}",
            source.display(),
            destination.display()
        )
    })?;
    fs::remove_file(source)
        .with_context(|| format!("Copied but could not remove {}", source.display()))?;
    Ok(())
}

fn copy_preserving_times(source: &Path, destination: &Path) -> Result<()> {
    fs::copy(source, destination).with_context(|| {
        format!(
            "Failed to copy {} -> {}",
            source.display(),
            destination.display()
        )
    })?;

    if let Err(err) = restore_times(source, destination) {
        tracing::warn!(
            path = %destination.display(),
            error = %err,
            "could not preserve timestamps"
        );
    }
    Ok(())
}

fn restore_times(source: &Path, destination: &Path) -> std::io::Result<()> {
    let meta = fs::metadata(source)?;
    let mut times = FileTimes::new().set_modified(meta.modified()?);
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }

    let file = match File::options().write(true).open(destination) {
        Ok(file) => file,
        Err(_) => File::open(destination)?,
    };
    file.set_times(times)
}

fn is_same_file(source: &Path, destination: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(destination)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
