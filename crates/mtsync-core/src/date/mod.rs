pub mod exif;
pub mod json;

use chrono::{DateTime, Local};

/// EXIF date-time layout (`DateTime`, `DateTimeOriginal`, `DateTimeDigitized`)
pub const EXIF_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Layout written to container date tags
pub const CONTAINER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Convert UTC epoch seconds to local time.
pub fn local_from_epoch(epoch: i64) -> Option<DateTime<Local>> {
    let utc = DateTime::from_timestamp(epoch, 0)?;
    Some(utc.with_timezone(&Local))
}

/// `YYYY:MM:DD HH:MM:SS` in local time
pub fn format_exif_datetime(epoch: i64) -> Option<String> {
    Some(local_from_epoch(epoch)?.format(EXIF_FORMAT).to_string())
}

/// `YYYY-MM-DDTHH:MM:SS` in local time
pub fn format_container_datetime(epoch: i64) -> Option<String> {
    Some(local_from_epoch(epoch)?.format(CONTAINER_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_formats_agree_on_the_same_instant() {
        let epoch = 1_600_000_000;
        let exif = format_exif_datetime(epoch).unwrap();
        let container = format_container_datetime(epoch).unwrap();

        let a = NaiveDateTime::parse_from_str(&exif, EXIF_FORMAT).unwrap();
        let b = NaiveDateTime::parse_from_str(&container, CONTAINER_FORMAT).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, local_from_epoch(epoch).unwrap().naive_local());
    }

    #[test]
    fn test_out_of_range_epoch() {
        assert!(format_exif_datetime(i64::MAX).is_none());
    }
}
