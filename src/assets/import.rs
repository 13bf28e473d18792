//! Bringing outside files into the library.

use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};

use super::discovery::discover_images;
use super::{AssetError, AssetStore, StoredAsset};
use crate::db::{Database, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct ImportedImage {
    pub source: PathBuf,
    pub id: i64,
    pub stored: StoredAsset,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<ImportedImage>,
    pub failed: Vec<(PathBuf, String)>,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        match (self.imported.len(), self.failed.len()) {
            (0, 0) => "No images found to import".to_string(),
            (n, 0) => format!("Imported {} image(s)", n),
            (n, f) => format!("Imported {} image(s), {} failed", n, f),
        }
    }
}

/// Expand directories to the supported files beneath them.
fn expand_sources(assets: &AssetStore, sources: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for source in sources {
        if source.is_dir() {
            files.extend(discover_images(source, assets.extensions()));
        } else {
            files.push(source.clone());
        }
    }
    files
}

/// Original name recorded for images pasted as raw pixels.
pub const CLIPBOARD_IMAGE_NAME: &str = "clipboard_image.png";

/// Validate, store and record a single file.
pub fn import_file(assets: &AssetStore, db: &Database, source: &Path) -> Result<ImportedImage, ImportError> {
    let original_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    import_named(assets, db, source, &original_name)
}

/// Import raw pixels, such as a screenshot taken from the clipboard. They
/// are written to a scratch PNG first so they take the same path as a file
/// and get the same validation and normalization.
pub fn import_pixels(
    assets: &AssetStore,
    db: &Database,
    pixels: &RgbaImage,
    original_name: &str,
) -> Result<ImportedImage, ImportError> {
    let mut scratch = tempfile::Builder::new()
        .prefix("mememanager-")
        .suffix(".png")
        .tempfile()
        .map_err(AssetError::Io)?;
    pixels
        .write_to(scratch.as_file_mut(), ImageFormat::Png)
        .map_err(AssetError::Image)?;

    // The scratch file is removed when it drops at the end of this call
    import_named(assets, db, scratch.path(), original_name)
}

fn import_named(
    assets: &AssetStore,
    db: &Database,
    source: &Path,
    original_name: &str,
) -> Result<ImportedImage, ImportError> {
    let decoded = assets.load_validated(source)?;

    let stored = assets.persist(source, original_name, Some(decoded))?;
    let id = match db.create_image(&stored.filename, original_name, &stored.path.to_string_lossy()) {
        Ok(id) => id,
        Err(e) => {
            if let Err(cleanup) = assets.delete_image_file(&stored.path) {
                tracing::warn!(path = %stored.path.display(), error = %cleanup, "failed to remove stored file after error");
            }
            return Err(e.into());
        }
    };

    Ok(ImportedImage {
        source: source.to_path_buf(),
        id,
        stored,
    })
}

/// Import every file (or directory of files) in `sources`. A failure on one
/// file is recorded in the report and the rest of the batch continues.
pub fn import_files(assets: &AssetStore, db: &Database, sources: &[PathBuf]) -> ImportReport {
    let files = expand_sources(assets, sources);
    let mut report = ImportReport::default();

    tracing::info!(count = files.len(), "importing images");

    for path in files {
        match import_file(assets, db, &path) {
            Ok(imported) => {
                tracing::info!(source = %path.display(), id = imported.id, "imported image");
                report.imported.push(imported);
            }
            Err(e) => {
                tracing::warn!(source = %path.display(), error = %e, "failed to import image");
                report.failed.push((path, e.to_string()));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_support::{store_in, write_image_file};
    use crate::db::test_db;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_import_single_file_records_metadata() {
        let dir = tempdir().unwrap();
        let assets = store_in(dir.path());
        let db = test_db();
        let source = dir.path().join("in/cat.png");
        write_image_file(&source, 40, 40);

        let report = import_files(&assets, &db, &[source.clone()]);

        assert_eq!(report.imported.len(), 1);
        assert!(report.failed.is_empty());
        let record = db.get_image(report.imported[0].id).unwrap().unwrap();
        assert_eq!(record.original_name, "cat.png");
        assert_eq!(record.filename, report.imported[0].stored.filename);
        assert!(Path::new(&record.path).exists());
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let dir = tempdir().unwrap();
        let assets = store_in(dir.path());
        let db = test_db();
        let good = dir.path().join("in/good.png");
        let bad = dir.path().join("in/bad.png");
        write_image_file(&good, 10, 10);
        fs::write(&bad, b"nope").unwrap();

        let report = import_files(
            &assets,
            &db,
            &[bad.clone(), dir.path().join("in/missing.jpg"), good],
        );

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, bad);
        assert_eq!(report.summary(), "Imported 1 image(s), 2 failed");
        // Nothing was stored for the rejected files
        assert_eq!(assets.storage_usage().file_count, 1);
        assert_eq!(db.stats().unwrap().image_count, 1);
    }

    #[test]
    fn test_directories_are_expanded() {
        let dir = tempdir().unwrap();
        let assets = store_in(dir.path());
        let db = test_db();
        let folder = dir.path().join("folder");
        write_image_file(&folder.join("a.png"), 5, 5);
        write_image_file(&folder.join("nested/b.jpg"), 5, 5);
        fs::write(folder.join("readme.txt"), "x").unwrap();

        let report = import_files(&assets, &db, &[folder]);

        assert_eq!(report.imported.len(), 2);
        assert!(report.failed.is_empty());
        let names: Vec<_> = db.list_images().unwrap().into_iter().map(|r| r.original_name).collect();
        assert!(names.contains(&"a.png".to_string()));
        assert!(names.contains(&"b.jpg".to_string()));
    }

    #[test]
    fn test_store_failure_removes_stored_file() {
        let dir = tempdir().unwrap();
        let assets = store_in(dir.path());
        let db = test_db();
        db.conn.execute_batch("DROP TABLE image_tags; DROP TABLE images;").unwrap();
        let source = dir.path().join("in/a.png");
        write_image_file(&source, 5, 5);

        let err = import_file(&assets, &db, &source).unwrap_err();

        assert!(matches!(err, ImportError::Store(_)));
        assert_eq!(assets.storage_usage().file_count, 0);
    }

    #[test]
    fn test_import_pixels_records_given_name() {
        let dir = tempdir().unwrap();
        let assets = store_in(dir.path());
        let db = test_db();
        let pixels = RgbaImage::from_pixel(30, 20, image::Rgba([10, 200, 30, 255]));

        let imported = import_pixels(&assets, &db, &pixels, CLIPBOARD_IMAGE_NAME).unwrap();

        let record = db.get_image(imported.id).unwrap().unwrap();
        assert_eq!(record.original_name, "clipboard_image.png");
        assert!(record.filename.ends_with("_clipboard_image.png"));
        assert!(Path::new(&record.path).exists());
        // Only the stored copy remains; the scratch file is gone
        assert!(!imported.source.exists());
        assert_eq!(assets.storage_usage().file_count, 1);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(ImportReport::default().summary(), "No images found to import");
    }
}
