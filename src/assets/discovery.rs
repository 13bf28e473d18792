use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// True when `path` has one of `extensions` (case-insensitive, no leading dot).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            extensions.iter().any(|e| e.to_lowercase() == ext_lower)
        })
        .unwrap_or(false)
}

/// All files under `directory` with an allowed extension, sorted by path.
pub fn discover_images(directory: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), extensions))
        .map(|e| e.into_path())
        .collect();

    images.sort();
    images
}
