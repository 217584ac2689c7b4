use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DATE_TIME_FIELD: &str = "DateTime";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Text(String),
    Integer(i64),
    Tuple(Vec<MetadataValue>),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Field name to value mapping decoded from a single image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    fields: BTreeMap<String, MetadataValue>,
}

impl ImageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first value seen for a field name.
    pub fn insert(&mut self, name: impl Into<String>, value: MetadataValue) {
        self.fields.entry(name.into()).or_insert(value);
    }

    pub fn get(&self, name: &str) -> Option<&MetadataValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(MetadataValue::as_text)
    }

    pub fn date_time(&self) -> Option<&str> {
        self.text(DATE_TIME_FIELD)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, MetadataValue)> for ImageMetadata {
    fn from_iter<I: IntoIterator<Item = (K, MetadataValue)>>(iter: I) -> Self {
        let mut metadata = ImageMetadata::new();
        for (name, value) in iter {
            metadata.insert(name, value);
        }
        metadata
    }
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("{} cannot be found, or the image cannot be opened and identified", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} cannot be found, or the image cannot be opened and identified", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },
}

impl MetadataError {
    pub fn path(&self) -> &Path {
        match self {
            MetadataError::Open { path, .. } | MetadataError::Decode { path, .. } => path,
        }
    }
}

/// Decodes the metadata of one image file.
pub trait MetadataReader {
    fn read(&self, path: &Path) -> Result<ImageMetadata, MetadataError>;
}

impl<R: MetadataReader + ?Sized> MetadataReader for &R {
    fn read(&self, path: &Path) -> Result<ImageMetadata, MetadataError> {
        (**self).read(path)
    }
}
