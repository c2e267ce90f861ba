use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Extension of the metadata sidecars
pub const SIDECAR_MARKER: &str = "json";

/// Trailing duplicate counter Takeout appends after the media extension, e.g. `IMG.jpg(1)`
static COUNTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\d+\)$").unwrap());

/// Candidate media file names for a sidecar, most likely first.
///
/// `IMG.jpg.json` and `IMG.jpg.<anything>.json` both yield `IMG.jpg`; exactly one
/// middle segment is tolerated. Names whose second-to-last segment is itself
/// `json` yield nothing. A duplicate counter on the last segment
/// (`IMG.jpg(1).json`, `IMG.jpg.supplemental-metadata(1).json`) also yields
/// `IMG(1).jpg`.
pub fn candidate_media_names(json_filename: &str) -> Vec<String> {
    let Some(base) = json_filename.strip_suffix(".json") else {
        return Vec::new();
    };
    let Some((head, last)) = base.rsplit_once('.') else {
        return Vec::new();
    };
    if last == SIDECAR_MARKER {
        return Vec::new();
    }

    let mut names = vec![base.to_string()];
    if is_name_with_ext(head) {
        names.push(head.to_string());
    }

    // Counter variants go last so a literal `IMG.jpg(1)` still wins
    for variant in counter_variants(base) {
        if !names.contains(&variant) {
            names.push(variant);
        }
    }

    names
}

/// Takeout puts the duplicate counter after the extension in sidecar names:
/// `IMG.jpg(1)` and `IMG.jpg.supplemental-metadata(1)` both describe `IMG(1).jpg`.
fn counter_variants(base: &str) -> Vec<String> {
    let mut variants = Vec::new();
    let Some((head, tail)) = base.rsplit_once('.') else {
        return variants;
    };
    let Some(counter) = COUNTER_RE.find(tail) else {
        return variants;
    };

    // Counter on the extension itself
    let ext = &tail[..counter.start()];
    if !ext.is_empty() && !head.is_empty() {
        variants.push(format!("{}{}.{}", head, counter.as_str(), ext));
    }
    // Counter on the middle segment
    if let Some((stem, ext)) = head.rsplit_once('.') {
        if !stem.is_empty() && !ext.is_empty() {
            variants.push(format!("{}{}.{}", stem, counter.as_str(), ext));
        }
    }
    variants
}

fn is_name_with_ext(name: &str) -> bool {
    matches!(name.rsplit_once('.'), Some((stem, ext)) if !stem.is_empty() && !ext.is_empty())
}

/// Find the media file a sidecar describes, in the sidecar's own directory.
///
/// Exact names are tried first. With `case_insensitive`, a single directory
/// listing is then matched against each candidate (NFC, lowercased); a
/// candidate with more than one match fails the whole resolution.
pub fn find_matching_media(json_path: &Path, case_insensitive: bool) -> Option<PathBuf> {
    let json_name = json_path.file_name()?.to_str()?;
    let candidates = candidate_media_names(json_name);
    if candidates.is_empty() {
        return None;
    }

    for name in &candidates {
        let direct = json_path.with_file_name(name);
        if direct.is_file() {
            return Some(direct);
        }
    }

    if !case_insensitive {
        return None;
    }

    let dir = json_path.parent()?;
    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.as_path() != json_path)
        .collect();

    for name in &candidates {
        let wanted = fold_name(name);
        let matches: Vec<&PathBuf> = entries
            .iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| fold_name(n) == wanted)
            })
            .collect();
        match matches.as_slice() {
            [] => continue,
            [only] => return Some((*only).clone()),
            _ => {
                debug!(
                    "Ambiguous case-insensitive match for {}: {} candidates",
                    json_path.display(),
                    matches.len()
                );
                return None;
            }
        }
    }

    None
}

fn fold_name(name: &str) -> String {
    name.nfc().collect::<String>().to_lowercase()
}
