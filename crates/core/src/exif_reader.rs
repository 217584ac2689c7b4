use crate::metadata::{ImageMetadata, MetadataError, MetadataReader, MetadataValue};
use exif::{Field, In, Reader, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExifReader;

impl MetadataReader for ExifReader {
    fn read(&self, path: &Path) -> Result<ImageMetadata, MetadataError> {
        read_exif_metadata(path)
    }
}

pub fn read_exif_metadata(path: &Path) -> Result<ImageMetadata, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buf = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => exif,
        // A recognised container without an EXIF block decodes to nothing.
        Err(exif::Error::NotFound(_)) => {
            tracing::debug!(path = %path.display(), "no EXIF block");
            return Ok(ImageMetadata::new());
        }
        Err(source) => {
            return Err(MetadataError::Decode {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    Ok(exif
        .fields()
        .filter(|field| field.ifd_num == In::PRIMARY)
        .map(|field| (field.tag.to_string(), convert_value(field)))
        .collect())
}

fn convert_value(field: &Field) -> MetadataValue {
    match &field.value {
        Value::Ascii(strings) => MetadataValue::Text(
            strings
                .first()
                .map(|raw| {
                    String::from_utf8_lossy(raw)
                        .trim_end_matches('\0')
                        .to_string()
                })
                .unwrap_or_default(),
        ),
        Value::Byte(values) => integers(values),
        Value::Short(values) => integers(values),
        Value::Long(values) => integers(values),
        Value::SByte(values) => integers(values),
        Value::SShort(values) => integers(values),
        Value::SLong(values) => integers(values),
        Value::Rational(values) => collapse(
            values
                .iter()
                .map(|r| pair(i64::from(r.num), i64::from(r.denom)))
                .collect(),
        ),
        Value::SRational(values) => collapse(
            values
                .iter()
                .map(|r| pair(i64::from(r.num), i64::from(r.denom)))
                .collect(),
        ),
        _ => MetadataValue::Text(field.display_value().to_string()),
    }
}

fn integers<T: Copy + Into<i64>>(values: &[T]) -> MetadataValue {
    collapse(
        values
            .iter()
            .map(|v| MetadataValue::Integer((*v).into()))
            .collect(),
    )
}

fn pair(num: i64, denom: i64) -> MetadataValue {
    MetadataValue::Tuple(vec![MetadataValue::Integer(num), MetadataValue::Integer(denom)])
}

fn collapse(mut values: Vec<MetadataValue>) -> MetadataValue {
    if values.len() == 1 {
        values.remove(0)
    } else {
        MetadataValue::Tuple(values)
    }
}
