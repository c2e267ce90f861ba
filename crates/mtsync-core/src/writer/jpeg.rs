use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use exif::{In, Reader, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;
use tracing::debug;

/// Default re-encode quality for JPEGs whose EXIF is rewritten
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Write `datetime` (`YYYY:MM:DD HH:MM:SS`) into `DateTime`, `DateTimeOriginal`
/// and `DateTimeDigitized`, then save the JPEG in place.
///
/// Saving re-encodes the pixels at `quality`: this is a lossy side effect of
/// every still-image update, not just a metadata splice. Existing EXIF is
/// carried over; when it is absent or unreadable the file gets a fresh block.
/// The file is only touched once every step has succeeded in memory.
pub fn write_capture_time(path: &Path, datetime: &str, quality: u8) -> anyhow::Result<()> {
    let original = fs::read(path).with_context(|| format!("Reading {}", path.display()))?;
    let mut encoded = reencode(&original, quality)
        .with_context(|| format!("Re-encoding {}", path.display()))?;

    let mut metadata = match Metadata::new_from_path(path) {
        Ok(m) => m,
        Err(e) => {
            debug!("No usable EXIF in {}, starting empty: {}", path.display(), e);
            Metadata::new()
        }
    };
    metadata.set_tag(ExifTag::ModifyDate(datetime.to_string()));
    metadata.set_tag(ExifTag::DateTimeOriginal(datetime.to_string()));
    metadata.set_tag(ExifTag::CreateDate(datetime.to_string()));
    if let Some(scene_type) = normalized_scene_type(&original) {
        metadata.set_tag(ExifTag::SceneType(scene_type));
    }

    metadata
        .write_to_vec(&mut encoded, FileExtension::JPEG)
        .with_context(|| format!("Serializing EXIF for {}", path.display()))?;
    fs::write(path, encoded).with_context(|| format!("Saving {}", path.display()))?;
    Ok(())
}

/// `SceneType` must be serialized as UNDEFINED bytes; some writers store it as
/// a number, which does not survive a rewrite. None when the tag is absent.
fn normalized_scene_type(jpeg: &[u8]) -> Option<Vec<u8>> {
    let exif = Reader::new().read_from_container(&mut Cursor::new(jpeg)).ok()?;
    let field = exif.get_field(Tag::SceneType, In::PRIMARY)?;
    match &field.value {
        Value::Undefined(bytes, _) => Some(bytes.clone()),
        Value::Byte(v) => Some(v.clone()),
        Value::Short(v) => Some(v.iter().map(|&n| n as u8).collect()),
        Value::Long(v) => Some(v.iter().map(|&n| n as u8).collect()),
        _ => None,
    }
}

fn reencode(jpeg: &[u8], quality: u8) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)?;
    // JPEG stores 8-bit gray or RGB only
    let img = match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let mut out = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
    Ok(out)
}
