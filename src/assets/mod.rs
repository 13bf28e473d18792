//! Image files on disk: validation, storage layout, normalization and thumbnails.

pub mod discovery;
pub mod import;
pub mod naming;
pub mod normalize;
pub mod paste;
pub mod thumbnails;

use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{StorageConfig, ThumbnailConfig};

pub use discovery::discover_images;
pub use import::{
    import_file, import_files, import_pixels, ImportError, ImportReport, ImportedImage, CLIPBOARD_IMAGE_NAME,
};
pub use paste::paths_from_paste;
pub use thumbnails::ThumbnailCache;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported image format: {0:?}")]
    UnsupportedFormat(String),

    #[error("{} is not a valid image: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode an image, sniffing the format from its contents.
pub(crate) fn open_image(path: &Path) -> Result<DynamicImage, AssetError> {
    let corrupt = |source: image::ImageError| AssetError::Corrupt {
        path: path.to_path_buf(),
        source,
    };
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(corrupt)
}

/// A file written into the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Unique library filename.
    pub filename: String,
    /// Full path of the stored file.
    pub path: PathBuf,
}

/// Basic facts about an image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
    pub file_size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageUsage {
    pub total_bytes: u64,
    pub file_count: usize,
}

/// Owns the image library directory and the thumbnail cache.
pub struct AssetStore {
    storage_root: PathBuf,
    extensions: Vec<String>,
    max_dimension: u32,
    jpeg_quality: u8,
    thumbnails: ThumbnailCache,
}

impl AssetStore {
    pub fn new(storage: &StorageConfig, thumbnails: &ThumbnailConfig) -> Result<Self, AssetError> {
        fs::create_dir_all(&storage.path)?;
        fs::create_dir_all(&thumbnails.path)?;

        Ok(Self {
            storage_root: storage.path.clone(),
            extensions: storage
                .image_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            max_dimension: storage.max_dimension,
            jpeg_quality: storage.jpeg_quality,
            thumbnails: ThumbnailCache::new(thumbnails),
        })
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    pub fn is_supported_format(&self, path: &Path) -> bool {
        discovery::has_extension(path, &self.extensions)
    }

    fn check_format(&self, path: &Path) -> Result<(), AssetError> {
        if self.is_supported_format(path) {
            Ok(())
        } else {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default();
            Err(AssetError::UnsupportedFormat(ext))
        }
    }

    /// Check existence, extension and full decodability; returns the decoded image.
    pub fn load_validated(&self, path: &Path) -> Result<DynamicImage, AssetError> {
        if !path.is_file() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }
        self.check_format(path)?;
        open_image(path)
    }

    pub fn validate(&self, path: &Path) -> Result<(), AssetError> {
        self.load_validated(path).map(|_| ())
    }

    /// Full path for a new library file, creating its `YYYY/MM` directory.
    fn storage_path(&self, filename: &str, now: &chrono::DateTime<chrono::Local>) -> Result<PathBuf, AssetError> {
        let dir = self.storage_root.join(naming::date_bucket(now));
        fs::create_dir_all(&dir)?;
        Ok(dir.join(filename))
    }

    /// Store `source` in the library under a fresh unique name.
    ///
    /// The image is normalized when it can be decoded; otherwise the bytes
    /// are copied verbatim.
    pub fn save_image(&self, source: &Path, original_name: &str) -> Result<StoredAsset, AssetError> {
        if !source.is_file() {
            return Err(AssetError::NotFound(source.to_path_buf()));
        }
        self.check_format(source)?;
        let decoded = match open_image(source) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!(source = %source.display(), error = %e, "cannot decode, storing original bytes");
                None
            }
        };
        self.persist(source, original_name, decoded)
    }

    /// Write an already-validated image into the library.
    pub(crate) fn persist(
        &self,
        source: &Path,
        original_name: &str,
        decoded: Option<DynamicImage>,
    ) -> Result<StoredAsset, AssetError> {
        let now = chrono::Local::now();
        let extension = source.extension().map(|e| e.to_string_lossy().to_string());
        let filename = naming::unique_filename(original_name, extension.as_deref(), &now);
        let path = self.storage_path(&filename, &now)?;

        // GIFs keep their animation only as the original bytes.
        let is_gif = extension
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case("gif"));

        let normalized = match decoded {
            Some(img) if !is_gif => {
                let rgb = normalize::normalize(&img, self.max_dimension);
                match normalize::write_image(&rgb, &path, self.jpeg_quality) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(source = %source.display(), error = %e, "normalization failed, copying original bytes");
                        false
                    }
                }
            }
            _ => false,
        };
        if !normalized {
            fs::copy(source, &path)?;
        }

        tracing::info!(source = %source.display(), stored = %path.display(), "stored image");
        Ok(StoredAsset { filename, path })
    }

    /// Delete a stored image and its cached thumbnail. Returns false if the
    /// file was already gone.
    pub fn delete_image_file(&self, path: &Path) -> Result<bool, AssetError> {
        self.thumbnails.remove(path)?;
        if path.exists() {
            fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn image_info(&self, path: &Path) -> Result<ImageInfo, AssetError> {
        let file_size = fs::metadata(path)?.len();
        let reader = image::ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().map(|f| format!("{:?}", f).to_uppercase());
        let (width, height) = reader.into_dimensions().map_err(|source| AssetError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(ImageInfo {
            width,
            height,
            format,
            file_size,
        })
    }

    /// Total size and count of supported files under the storage root.
    pub fn storage_usage(&self) -> StorageUsage {
        WalkDir::new(&self.storage_root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_supported_format(e.path()))
            .filter_map(|e| e.metadata().ok())
            .fold(StorageUsage::default(), |usage, meta| StorageUsage {
                total_bytes: usage.total_bytes + meta.len(),
                file_count: usage.file_count + 1,
            })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use image::{Rgba, RgbaImage};

    pub fn store_in(dir: &Path) -> AssetStore {
        let storage = StorageConfig {
            path: dir.join("memes"),
            max_dimension: 256,
            ..StorageConfig::default()
        };
        let thumbnails = ThumbnailConfig {
            path: dir.join("thumbs"),
            size: 32,
        };
        AssetStore::new(&storage, &thumbnails).unwrap()
    }

    pub fn write_image_file(path: &Path, width: u32, height: u32) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 128])))
            .save(path)
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{store_in, write_image_file};
    use super::*;
    use image::GenericImageView;
    use tempfile::tempdir;

    #[test]
    fn test_supported_formats() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        assert!(store.is_supported_format(Path::new("a.PNG")));
        assert!(store.is_supported_format(Path::new("a.webp")));
        assert!(!store.is_supported_format(Path::new("a.tiff")));
        assert!(!store.is_supported_format(Path::new("README")));
    }

    #[test]
    fn test_validate_rejects_missing_unsupported_and_corrupt() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let missing = store.validate(&dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(missing, AssetError::NotFound(_)));

        let text = dir.path().join("notes.txt");
        fs::write(&text, "hello").unwrap();
        assert!(matches!(store.validate(&text).unwrap_err(), AssetError::UnsupportedFormat(ref e) if e == "txt"));

        let corrupt = dir.path().join("broken.png");
        fs::write(&corrupt, b"\x89PNG\r\n\x1a\nnot really").unwrap();
        assert!(matches!(store.validate(&corrupt).unwrap_err(), AssetError::Corrupt { .. }));

        let good = dir.path().join("good.png");
        write_image_file(&good, 4, 4);
        store.validate(&good).unwrap();
    }

    #[test]
    fn test_save_image_normalizes_into_date_bucket() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let source = dir.path().join("in/Big Meme.png");
        write_image_file(&source, 1024, 512);

        let stored = store.save_image(&source, "Big Meme.png").unwrap();

        let bucket = naming::date_bucket(&chrono::Local::now());
        assert_eq!(stored.path.parent().unwrap(), store.storage_root().join(bucket));
        assert!(stored.filename.ends_with("_Big_Meme.png"));
        assert_eq!(stored.path.file_name().unwrap().to_string_lossy(), stored.filename);

        let img = image::open(&stored.path).unwrap();
        assert_eq!(img.dimensions(), (256, 128));
        assert!(!img.color().has_alpha());
        // The source is left in place
        assert!(source.exists());
    }

    #[test]
    fn test_save_image_copies_undecodable_bytes() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let source = dir.path().join("weird.jpg");
        fs::write(&source, b"definitely not a jpeg").unwrap();

        let stored = store.save_image(&source, "weird.jpg").unwrap();
        assert_eq!(fs::read(&stored.path).unwrap(), b"definitely not a jpeg");
    }

    #[test]
    fn test_save_image_keeps_gif_bytes() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let source = dir.path().join("anim.gif");
        write_image_file(&source, 8, 8);

        let stored = store.save_image(&source, "anim.gif").unwrap();
        assert_eq!(fs::read(&stored.path).unwrap(), fs::read(&source).unwrap());
    }

    #[test]
    fn test_save_image_rejects_unsupported() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let source = dir.path().join("doc.pdf");
        fs::write(&source, b"%PDF").unwrap();

        assert!(matches!(
            store.save_image(&source, "doc.pdf"),
            Err(AssetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_delete_image_file_removes_thumbnail() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let source = dir.path().join("a.png");
        write_image_file(&source, 64, 64);
        let stored = store.save_image(&source, "a.png").unwrap();
        let thumb = store.thumbnails().get_or_create(&stored.path).unwrap();

        assert!(store.delete_image_file(&stored.path).unwrap());
        assert!(!stored.path.exists());
        assert!(!thumb.exists());
        assert!(!store.delete_image_file(&stored.path).unwrap());
    }

    #[test]
    fn test_image_info_and_storage_usage() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let source = dir.path().join("a.png");
        write_image_file(&source, 30, 20);
        let stored = store.save_image(&source, "a.png").unwrap();

        let info = store.image_info(&stored.path).unwrap();
        assert_eq!((info.width, info.height), (30, 20));
        assert_eq!(info.format.as_deref(), Some("PNG"));
        assert!(info.file_size > 0);

        fs::write(store.storage_root().join("stray.txt"), "x").unwrap();
        let usage = store.storage_usage();
        assert_eq!(usage.file_count, 1);
        assert_eq!(usage.total_bytes, info.file_size);
    }
}
