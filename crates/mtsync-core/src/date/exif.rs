use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Reader, Tag, Value};

/// Read an ASCII date field from a file's EXIF, exactly as stored
/// (`YYYY:MM:DD HH:MM:SS`). None when the file has no EXIF or no such tag.
pub fn read_exif_datetime(path: &Path, tag: Tag) -> Option<String> {
    let file = File::open(path).ok()?;
    let exif = Reader::new().read_from_container(&mut BufReader::new(file)).ok()?;
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => {
            let raw = parts.first()?;
            Some(String::from_utf8_lossy(raw).trim_end_matches('\0').to_string())
        }
        _ => None,
    }
}

/// Current `DateTimeOriginal` of a still image
pub fn read_capture_time(path: &Path) -> Option<String> {
    read_exif_datetime(path, Tag::DateTimeOriginal)
}
