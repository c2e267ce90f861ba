use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use encoding_rs::SHIFT_JIS;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Decode ZIP entry name, trying UTF-8 first, then Shift_JIS
fn decode_zip_name(raw: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(raw) {
        return s.to_string();
    }

    // Japanese exports are often Shift_JIS without the UTF-8 flag
    let (decoded, _, had_errors) = SHIFT_JIS.decode(raw);
    if !had_errors {
        return decoded.into_owned();
    }

    String::from_utf8_lossy(raw).into_owned()
}

/// Turn an entry name into a relative path that stays inside the destination.
/// Returns None for absolute names and names whose `..` climbs above the root.
pub fn sanitize_entry_name(name: &str) -> Option<PathBuf> {
    let name = name.replace('\\', "/");

    if name.starts_with('/') {
        return None;
    }
    // "C:/..." or "C:foo"
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return None;
    }

    let mut parts: Vec<&str> = Vec::new();
    for part in name.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            p => parts.push(p),
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.iter().collect())
}

/// Create `<stem>_extracted` (or `<stem>_extracted_<n>`) under `output_dir`,
/// defaulting to the archive's own directory. Never reuses an existing folder.
pub fn allocate_extraction_dir(zip_path: &Path, output_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let stem = zip_path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("archive path has no file name")?;
    let parent = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => zip_path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(&parent)
            .with_context(|| format!("Creating output directory {}", parent.display()))?;
    }

    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            format!("{}_extracted", stem)
        } else {
            format!("{}_extracted_{}", stem, suffix)
        };
        let candidate = parent.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => {
                return Err(e).with_context(|| format!("Creating {}", candidate.display()));
            }
        }
    }
}

/// Counts from one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: u64,
    pub dirs: u64,
    pub rejected: u64,
}

/// Extract every safe member of `zip_path` into `destination`.
/// Fails on an unreadable archive, or when every member was rejected.
pub fn extract_zip(zip_path: &Path, destination: &Path) -> anyhow::Result<ExtractStats> {
    info!("Extracting {} to {}", zip_path.display(), destination.display());
    let file = File::open(zip_path).with_context(|| format!("Opening {}", zip_path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("Reading zip {}", zip_path.display()))?;

    let mut stats = ExtractStats::default();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let entry_name = decode_zip_name(entry.name_raw());

        let Some(relative) = sanitize_entry_name(&entry_name) else {
            warn!("Skipping unsafe archive member: {}", entry_name);
            stats.rejected += 1;
            continue;
        };
        let dest = destination.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest).with_context(|| format!("Creating {}", dest.display()))?;
            stats.dirs += 1;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Creating {}", parent.display()))?;
        }
        let mut out_file = BufWriter::new(
            File::create(&dest).with_context(|| format!("Creating {}", dest.display()))?,
        );
        io::copy(&mut entry, &mut out_file)
            .with_context(|| format!("Extracting {}", entry_name))?;
        debug!("Extracted {}", relative.display());
        stats.files += 1;
    }

    if stats.rejected > 0 && stats.files == 0 && stats.dirs == 0 {
        bail!("every member of {} was rejected", zip_path.display());
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zw = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zw.start_file(*name, SimpleFileOptions::default()).unwrap();
            zw.write_all(data).unwrap();
        }
        zw.finish().unwrap();
    }

    #[test]
    fn test_sanitize_entry_name() {
        assert_eq!(sanitize_entry_name("a/b.jpg"), Some(PathBuf::from("a/b.jpg")));
        assert_eq!(sanitize_entry_name("a\\b.jpg"), Some(PathBuf::from("a/b.jpg")));
        assert_eq!(sanitize_entry_name("a/../b.jpg"), Some(PathBuf::from("b.jpg")));
        assert_eq!(sanitize_entry_name("./a//b.jpg"), Some(PathBuf::from("a/b.jpg")));
        assert_eq!(sanitize_entry_name("../evil.txt"), None);
        assert_eq!(sanitize_entry_name("a/../../evil.txt"), None);
        assert_eq!(sanitize_entry_name("/etc/passwd"), None);
        assert_eq!(sanitize_entry_name("C:/Windows/evil.dll"), None);
        assert_eq!(sanitize_entry_name("."), None);
    }

    #[test]
    fn test_allocate_extraction_dir_never_reuses() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("foo.zip");
        File::create(&zip_path).unwrap();

        let first = allocate_extraction_dir(&zip_path, None).unwrap();
        let second = allocate_extraction_dir(&zip_path, None).unwrap();
        assert_eq!(first, dir.path().join("foo_extracted"));
        assert_eq!(second, dir.path().join("foo_extracted_1"));
        assert!(first.is_dir() && second.is_dir());
    }

    #[test]
    fn test_allocate_extraction_dir_in_output_dir() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("Takeout.zip");
        let out = dir.path().join("out/nested");

        let root = allocate_extraction_dir(&zip_path, Some(&out)).unwrap();
        assert_eq!(root, out.join("Takeout_extracted"));
    }

    #[test]
    fn test_extract_rejects_traversal() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("t.zip");
        write_zip(
            &zip_path,
            &[
                ("Takeout/Photos/a.jpg", b"jpg"),
                ("../escape.txt", b"x"),
                ("/abs.txt", b"x"),
            ],
        );
        let dest = dir.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let stats = extract_zip(&zip_path, &dest).unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(fs::read(dest.join("Takeout/Photos/a.jpg")).unwrap(), b"jpg");
        assert!(!dir.path().join("escape.txt").exists());
        assert!(!dest.join("abs.txt").exists());
    }

    #[test]
    fn test_extract_fails_when_everything_rejected() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("bad.zip");
        write_zip(&zip_path, &[("../a.txt", b"x")]);
        let dest = dir.path().join("dest");
        fs::create_dir(&dest).unwrap();

        assert!(extract_zip(&zip_path, &dest).is_err());
    }

    #[test]
    fn test_extract_fails_on_corrupt_zip() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("corrupt.zip");
        fs::write(&zip_path, b"definitely not a zip").unwrap();

        assert!(extract_zip(&zip_path, dir.path()).is_err());
    }

    #[test]
    fn test_decode_shift_jis_name() {
        // "写真" in Shift_JIS
        let raw = [0x8e, 0xca, 0x90, 0x5e];
        assert_eq!(decode_zip_name(&raw), "写真");
        assert_eq!(decode_zip_name("plain.jpg".as_bytes()), "plain.jpg");
    }
}
