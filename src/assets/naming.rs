//! Library filenames and the `YYYY/MM` directory layout.
//!
//! ```text
//! memes/
//! └── 2024/
//!     └── 03/
//!         └── 20240315_093012_1f0c9a2b_distracted-boyfriend.jpg
//! ```

use chrono::{DateTime, Datelike, TimeZone};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Longest sanitized stem kept in a generated filename, in characters.
const MAX_STEM_CHARS: usize = 50;

/// Stem used when nothing survives sanitizing.
const FALLBACK_STEM: &str = "image";

/// Keep alphanumerics, `-` and `_`; whitespace becomes `_`; everything else is dropped.
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .take(MAX_STEM_CHARS)
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned
    }
}

/// Eight hex characters that differ between calls, even within the same
/// nanosecond, and between processes.
fn random_suffix(seed: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hasher.update(seq.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(seed.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..8].to_string()
}

/// Build `<YYYYMMDD_HHMMSS>_<8 hex>_<stem><.ext>` for a file imported as `original_name`.
///
/// `extension` is taken from `original_name` when not given; it is lowercased
/// and may be empty.
pub fn unique_filename<Tz: TimeZone>(
    original_name: &str,
    extension: Option<&str>,
    now: &DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let original = Path::new(original_name);
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = extension
        .map(|e| e.trim_start_matches('.').to_string())
        .or_else(|| original.extension().map(|e| e.to_string_lossy().to_string()))
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    format!(
        "{}_{}_{}{}",
        now.format("%Y%m%d_%H%M%S"),
        random_suffix(original_name),
        sanitize_stem(&stem),
        extension
    )
}

/// Relative `YYYY/MM` directory for the given moment.
pub fn date_bucket<Tz: TimeZone>(now: &DateTime<Tz>) -> PathBuf {
    PathBuf::from(format!("{:04}", now.year())).join(format!("{:02}", now.month()))
}

/// Recover the `YYYY/MM` bucket from a path laid out as `.../YYYY/MM/<file>`.
pub fn bucket_of(path: &Path) -> Option<PathBuf> {
    let month_dir = path.parent()?;
    let month = month_dir.file_name()?.to_str()?;
    let year = month_dir.parent()?.file_name()?.to_str()?;

    let is_year = year.len() == 4 && year.chars().all(|c| c.is_ascii_digit());
    let is_month = month.len() == 2 && matches!(month.parse::<u32>(), Ok(1..=12));

    if is_year && is_month {
        Some(PathBuf::from(year).join(month))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 12).unwrap()
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("Distracted Boyfriend!"), "Distracted_Boyfriend");
        assert_eq!(sanitize_stem("a-b_c"), "a-b_c");
        assert_eq!(sanitize_stem("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_stem("!!!"), "image");
        assert_eq!(sanitize_stem("   "), "image");
        assert_eq!(sanitize_stem(&"x".repeat(80)).chars().count(), 50);
    }

    #[test]
    fn test_unique_filename_layout() {
        let name = unique_filename("Funny Cat.PNG", None, &fixed_now());

        assert!(name.starts_with("20240315_093012_"));
        assert!(name.ends_with("_Funny_Cat.png"));
        let suffix = &name["20240315_093012_".len().."20240315_093012_".len() + 8];
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_unique_filename_explicit_extension() {
        let name = unique_filename("clipboard_image", Some(".JPG"), &fixed_now());
        assert!(name.ends_with("_clipboard_image.jpg"));

        let bare = unique_filename("noext", None, &fixed_now());
        assert!(bare.ends_with("_noext"));
    }

    #[test]
    fn test_unique_filename_differs_between_calls() {
        let now = fixed_now();
        let a = unique_filename("same.png", None, &now);
        let b = unique_filename("same.png", None, &now);
        assert_ne!(a, b);
    }

    #[test]
    fn test_date_bucket() {
        assert_eq!(date_bucket(&fixed_now()), PathBuf::from("2024").join("03"));
    }

    #[test]
    fn test_bucket_of() {
        let path = Path::new("/lib/memes/2024/03/x.jpg");
        assert_eq!(bucket_of(path), Some(PathBuf::from("2024").join("03")));
        assert_eq!(bucket_of(Path::new("/lib/memes/2024/13/x.jpg")), None);
        assert_eq!(bucket_of(Path::new("/tmp/downloads/x.jpg")), None);
        assert_eq!(bucket_of(Path::new("x.jpg")), None);
    }
}
