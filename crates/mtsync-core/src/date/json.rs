use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

/// Key holding the capture time
pub const CAPTURE_KEY: &str = "photoTakenTime";

/// Key holding the upload/creation time
pub const CREATION_KEY: &str = "creationTime";

/// Both timestamps carried by a sidecar, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidecarTimes {
    pub capture_time: i64,
    pub creation_time: i64,
}

/// Parse Google's JSON metadata and extract both timestamps.
/// `Ok(None)` unless both are present and numeric.
pub fn parse_google_json(json_bytes: &[u8]) -> serde_json::Result<Option<SidecarTimes>> {
    let data: Value = serde_json::from_slice(json_bytes)?;
    Ok(times_from_value(&data))
}

fn times_from_value(data: &Value) -> Option<SidecarTimes> {
    Some(SidecarTimes {
        capture_time: timestamp_of(data, CAPTURE_KEY)?,
        creation_time: timestamp_of(data, CREATION_KEY)?,
    })
}

/// `data[key].timestamp` as whole seconds; accepts numbers and numeric strings
fn timestamp_of(data: &Value, key: &str) -> Option<i64> {
    match data.get(key)?.as_object()?.get("timestamp")? {
        Value::Number(n) => n.as_i64().or_else(|| truncate(n.as_f64()?)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| truncate(s.parse().ok()?))
        }
        _ => None,
    }
}

fn truncate(secs: f64) -> Option<i64> {
    secs.is_finite().then(|| secs.trunc() as i64)
}

/// Read a sidecar from disk. Unreadable or malformed files are logged and
/// yield None; so does a sidecar missing either timestamp.
pub fn read_sidecar_times(json_path: &Path) -> Option<SidecarTimes> {
    let bytes = match fs::read(json_path) {
        Ok(b) => b,
        Err(e) => {
            warn!("Failed to read JSON {}: {}", json_path.display(), e);
            return None;
        }
    };
    let times = match parse_google_json(&bytes) {
        Ok(times) => times,
        Err(e) => {
            warn!("Failed to parse JSON {}: {}", json_path.display(), e);
            return None;
        }
    };
    if times.is_none() {
        debug!("No supported timestamp in {}", json_path.display());
    }
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_string_and_numeric_timestamps() {
        let json = br#"{
            "title": "IMG_1.jpg",
            "photoTakenTime": {"timestamp": "1600000000", "formatted": "Sep 13, 2020"},
            "creationTime": {"timestamp": 1600000500}
        }"#;
        assert_eq!(
            parse_google_json(json).unwrap(),
            Some(SidecarTimes { capture_time: 1_600_000_000, creation_time: 1_600_000_500 })
        );
    }

    #[test]
    fn test_fractional_timestamps_truncate() {
        let json = br#"{"photoTakenTime": {"timestamp": "1600000000.9"}, "creationTime": {"timestamp": 12.5}}"#;
        let times = parse_google_json(json).unwrap().unwrap();
        assert_eq!(times.capture_time, 1_600_000_000);
        assert_eq!(times.creation_time, 12);
    }

    #[test]
    fn test_single_key_is_not_a_partial_result() {
        let only_capture = br#"{"photoTakenTime": {"timestamp": "1600000000"}}"#;
        let only_creation = br#"{"creationTime": {"timestamp": "1600000000"}}"#;
        assert_eq!(parse_google_json(only_capture).unwrap(), None);
        assert_eq!(parse_google_json(only_creation).unwrap(), None);
    }

    #[test]
    fn test_unparseable_values() {
        let bad = br#"{"photoTakenTime": {"timestamp": "yesterday"}, "creationTime": {"timestamp": "1"}}"#;
        let wrong_shape = br#"{"photoTakenTime": "1600000000", "creationTime": {"timestamp": "1"}}"#;
        assert_eq!(parse_google_json(bad).unwrap(), None);
        assert_eq!(parse_google_json(wrong_shape).unwrap(), None);
        assert_eq!(parse_google_json(b"[1, 2]").unwrap(), None);
        assert!(parse_google_json(b"{ not json").is_err());
    }

    #[test]
    fn test_read_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_1.jpg.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert_eq!(read_sidecar_times(&path), None);
        assert_eq!(read_sidecar_times(&dir.path().join("absent.json")), None);
    }

    #[test]
    fn test_read_sidecar_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_1.jpg.supplemental-metadata.json");
        std::fs::write(
            &path,
            br#"{"photoTakenTime": {"timestamp": "1568000000"}, "creationTime": {"timestamp": 1570000000}}"#,
        )
        .unwrap();
        assert_eq!(
            read_sidecar_times(&path),
            Some(SidecarTimes { capture_time: 1_568_000_000, creation_time: 1_570_000_000 })
        );
    }
}
