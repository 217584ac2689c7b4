use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use std::io::Cursor;

pub fn jpeg_with_date_time(date_time: &str) -> Vec<u8> {
    let field = Field {
        tag: Tag::DateTime,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![date_time.as_bytes().to_vec()]),
    };
    jpeg_with_fields(&[field])
}

pub fn jpeg_with_fields(fields: &[Field]) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).expect("encode exif");
    let tiff = tiff.into_inner();

    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    let len = u16::try_from(tiff.len() + 8).expect("APP1 segment too large");
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

pub fn jpeg_without_exif() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xD9]
}
