use crate::metadata::{MetadataError, MetadataReader};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const EXIF_DATE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("{} has no DateTime metadata", path.display())]
    MissingDateTime { path: PathBuf },
    #[error("{} has a malformed DateTime value: {value:?}", path.display())]
    MalformedDateTime { path: PathBuf, value: String },
    #[error("{} has no usable modification time", path.display())]
    ModifiedTimeUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    pub mtime_fallback: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RenamePlanner<R> {
    reader: R,
    options: PlanOptions,
}

impl<R: MetadataReader> RenamePlanner<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, PlanOptions::default())
    }

    pub fn with_options(reader: R, options: PlanOptions) -> Self {
        Self { reader, options }
    }

    pub fn plan_destination(
        &self,
        source: &Path,
        destination_directory: &Path,
    ) -> Result<PathBuf, PlanError> {
        let metadata = self.reader.read(source)?;
        let stamp = match metadata.date_time() {
            Some(value) => value.to_string(),
            None if self.options.mtime_fallback => {
                let stamp = modified_stamp(source)?;
                tracing::debug!(path = %source.display(), %stamp, "falling back to mtime");
                stamp
            }
            None => {
                return Err(PlanError::MissingDateTime {
                    path: source.to_path_buf(),
                })
            }
        };

        let file_name = forge_file_name(&stamp, source).ok_or_else(|| {
            PlanError::MalformedDateTime {
                path: source.to_path_buf(),
                value: stamp.clone(),
            }
        })?;
        Ok(destination_directory.join(file_name))
    }
}

/// `YYYY:MM:DD HH:MM:SS` plus the source extension becomes
/// `YYYY-MM-DD_HH-MM-SS.ext`, extension lower-cased.
pub fn forge_file_name(date_time: &str, source: &Path) -> Option<String> {
    let hyphenated = date_time.replace(':', "-");
    let mut parts = hyphenated.split_whitespace();
    let (Some(date), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };

    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    Some(format!("{date}_{time}{extension}"))
}

fn modified_stamp(path: &Path) -> Result<String, PlanError> {
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| PlanError::ModifiedTimeUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
    let local: DateTime<Local> = DateTime::from(modified);
    Ok(local.format(EXIF_DATE_TIME_FORMAT).to_string())
}
