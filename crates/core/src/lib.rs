mod batch;
mod collector;
mod config;
mod exif_reader;
mod metadata;
mod planner;
mod transfer;

#[cfg(test)]
mod test_support;

pub use batch::{run_batch, BatchOptions, BatchReport, BatchStats, FileOutcome, FileReport};
pub use collector::{collect_files, CollectOptions, Collected, PatternError};
pub use config::{config_path, load_config, load_config_from, AppConfig, CONFIG_ENV};
pub use exif_reader::{read_exif_metadata, ExifReader};
pub use metadata::{
    ImageMetadata, MetadataError, MetadataReader, MetadataValue, DATE_TIME_FIELD,
};
pub use planner::{forge_file_name, PlanError, PlanOptions, RenamePlanner};
pub use transfer::{
    preflight, transfer_file, OverwritePolicy, TransferMode, TransferOptions, TransferOutcome,
};
