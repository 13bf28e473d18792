use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use super::naming::{bucket_of, date_bucket};
use super::normalize::{fit_within, flatten_onto_white, write_image};
use super::{open_image, AssetError};
use crate::config::ThumbnailConfig;

const THUMB_SUFFIX: &str = ".thumb.jpg";
const THUMB_QUALITY: u8 = 85;

/// Manages thumbnail generation and caching.
///
/// Thumbnails mirror the source's date bucket and stem:
/// `<root>/YYYY/MM/<stem>.thumb.jpg`.
pub struct ThumbnailCache {
    root: PathBuf,
    size: u32,
}

impl ThumbnailCache {
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            root: config.path.clone(),
            size: config.size,
        }
    }

    /// Where the thumbnail for `source` lives. Sources outside a `YYYY/MM`
    /// layout are bucketed under the current month.
    pub fn thumbnail_path(&self, source: &Path) -> PathBuf {
        let bucket = bucket_of(source).unwrap_or_else(|| date_bucket(&chrono::Local::now()));
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        self.root.join(bucket).join(format!("{}{}", stem, THUMB_SUFFIX))
    }

    /// A thumbnail is fresh when it is at least as new as its source.
    fn is_fresh(source: &Path, thumb: &Path) -> bool {
        let mtime = |p: &Path| -> Option<SystemTime> { fs::metadata(p).ok()?.modified().ok() };
        match (mtime(source), mtime(thumb)) {
            (Some(source_mtime), Some(thumb_mtime)) => thumb_mtime >= source_mtime,
            _ => false,
        }
    }

    /// Return the cached thumbnail for `source`, regenerating it when missing or stale.
    pub fn get_or_create(&self, source: &Path) -> Result<PathBuf, AssetError> {
        if !source.exists() {
            return Err(AssetError::NotFound(source.to_path_buf()));
        }

        let thumb_path = self.thumbnail_path(source);
        if Self::is_fresh(source, &thumb_path) {
            tracing::trace!(source = %source.display(), "thumbnail cache hit");
            return Ok(thumb_path);
        }

        if let Some(parent) = thumb_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let img = open_image(source)?;
        let thumbnail = flatten_onto_white(&fit_within(img, self.size));
        write_image(&thumbnail, &thumb_path, THUMB_QUALITY)?;

        tracing::debug!(source = %source.display(), thumb = %thumb_path.display(), "generated thumbnail");
        Ok(thumb_path)
    }

    /// Remove the cached thumbnail for `source`, if any.
    pub fn remove(&self, source: &Path) -> Result<bool, AssetError> {
        let thumb_path = self.thumbnail_path(source);
        if thumb_path.exists() {
            fs::remove_file(&thumb_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Delete every cached thumbnail that does not belong to one of
    /// `valid_sources`. Returns how many were removed.
    pub fn cleanup_orphans<'a, I>(&self, valid_sources: I) -> usize
    where
        I: IntoIterator<Item = &'a Path>,
    {
        if !self.root.exists() {
            return 0;
        }

        let keep: HashSet<PathBuf> = valid_sources
            .into_iter()
            .filter(|p| p.exists())
            .map(|p| self.thumbnail_path(p))
            .collect();

        let mut removed = 0;
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_thumb = entry.file_type().is_file()
                && path
                    .file_name()
                    .map(|n| n.to_string_lossy().ends_with(THUMB_SUFFIX))
                    .unwrap_or(false);
            if !is_thumb || keep.contains(path) {
                continue;
            }

            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(thumb = %path.display(), error = %e, "failed to remove orphaned thumbnail"),
            }
        }

        if removed > 0 {
            tracing::info!(removed, "removed orphaned thumbnails");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
    use std::time::Duration;
    use tempfile::tempdir;

    fn cache_in(dir: &Path) -> ThumbnailCache {
        ThumbnailCache::new(&ThumbnailConfig {
            path: dir.join("thumbs"),
            size: 64,
        })
    }

    fn write_source(dir: &Path, rel: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255])))
            .save(&path)
            .unwrap();
        path
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_thumbnail_path_mirrors_bucket() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());

        let path = cache.thumbnail_path(Path::new("/lib/memes/2023/11/abc_cat.png"));
        assert_eq!(path, dir.path().join("thumbs/2023/11/abc_cat.thumb.jpg"));
    }

    #[test]
    fn test_generate_bounded_jpeg() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());
        let source = write_source(dir.path(), "memes/2024/02/wide.png", 300, 150);

        let thumb = cache.get_or_create(&source).unwrap();

        assert_eq!(thumb, dir.path().join("thumbs/2024/02/wide.thumb.jpg"));
        let img = image::open(&thumb).unwrap();
        assert_eq!(img.dimensions(), (64, 32));
    }

    #[test]
    fn test_small_source_is_not_enlarged() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());
        let source = write_source(dir.path(), "memes/2024/02/tiny.png", 10, 20);

        let thumb = cache.get_or_create(&source).unwrap();
        assert_eq!(image::open(&thumb).unwrap().dimensions(), (10, 20));
    }

    #[test]
    fn test_fresh_thumbnail_is_reused_and_stale_one_regenerated() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());
        let source = write_source(dir.path(), "memes/2024/02/a.png", 100, 100);
        let thumb = cache.get_or_create(&source).unwrap();

        let base = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&source, base);
        set_mtime(&thumb, base + Duration::from_secs(60));
        let cached_mtime = fs::metadata(&thumb).unwrap().modified().unwrap();
        cache.get_or_create(&source).unwrap();
        assert_eq!(fs::metadata(&thumb).unwrap().modified().unwrap(), cached_mtime);

        set_mtime(&source, base + Duration::from_secs(120));
        cache.get_or_create(&source).unwrap();
        assert!(fs::metadata(&thumb).unwrap().modified().unwrap() > base + Duration::from_secs(120));
    }

    #[test]
    fn test_missing_source_is_not_found() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());
        let err = cache.get_or_create(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn test_cleanup_orphans_keeps_valid_sources() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());
        let keep = write_source(dir.path(), "memes/2024/02/keep.png", 20, 20);
        let gone = write_source(dir.path(), "memes/2024/02/gone.png", 20, 20);
        let keep_thumb = cache.get_or_create(&keep).unwrap();
        let gone_thumb = cache.get_or_create(&gone).unwrap();
        fs::remove_file(&gone).unwrap();

        let removed = cache.cleanup_orphans([keep.as_path(), gone.as_path()]);

        assert_eq!(removed, 1);
        assert!(keep_thumb.exists());
        assert!(!gone_thumb.exists());
    }

    #[test]
    fn test_cleanup_ignores_non_thumbnail_files() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());
        let other = dir.path().join("thumbs/2024/02/notes.txt");
        fs::create_dir_all(other.parent().unwrap()).unwrap();
        fs::write(&other, "keep me").unwrap();

        assert_eq!(cache.cleanup_orphans(std::iter::empty::<&Path>()), 0);
        assert!(other.exists());
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());
        let source = write_source(dir.path(), "memes/2024/02/a.png", 20, 20);
        let thumb = cache.get_or_create(&source).unwrap();

        assert!(cache.remove(&source).unwrap());
        assert!(!thumb.exists());
        assert!(!cache.remove(&source).unwrap());
    }
}
