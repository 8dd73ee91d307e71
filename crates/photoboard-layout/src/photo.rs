//! Photo handles: decoded images plus the file metadata the render
//! pipeline substitutes into rich text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use image::{DynamicImage, GenericImageView};

use crate::types::Result;

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "webp"];

/// A decoded photo. The image buffer is shared: the same photo may be
/// duplicated across sets or reused as a page background.
#[derive(Debug, Clone)]
pub struct Photo {
    pub path: PathBuf,
    /// Display name, substituted for `$name$` in rich text
    pub name: String,
    /// File modification time, substituted for `$date_photo$`
    pub modified: Option<DateTime<Local>>,
    /// Rotation in degrees; quarter turns only
    pub rotation: i32,
    /// Excluded from pagination when set
    pub removed: bool,
    /// Marks a user-created duplicate of another list entry
    pub duplicated: bool,
    pub width: u32,
    pub height: u32,
    pub image: Arc<DynamicImage>,
}

impl Photo {
    pub fn new(path: impl Into<PathBuf>, image: DynamicImage) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::with_name(path, name, image)
    }

    pub fn with_name(path: impl Into<PathBuf>, name: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            modified: None,
            rotation: 0,
            removed: false,
            duplicated: false,
            width: image.width(),
            height: image.height(),
            image: Arc::new(image),
        }
    }
}

/// Load every supported image in a directory, ordered by file name.
/// Files that fail to decode are logged and skipped.
pub async fn load_photos(dir: impl AsRef<Path>) -> Result<Vec<Arc<Photo>>> {
    let dir = dir.as_ref().to_owned();

    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && supported {
            paths.push(path);
        }
    }
    paths.sort();

    let mut photos = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(&path).await?;
        let decoded =
            tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await?;
        let image = match decoded {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let modified = tokio::fs::metadata(&path)
            .await
            .ok()
            .and_then(|meta| meta.modified().ok())
            .map(DateTime::<Local>::from);

        let mut photo = Photo::new(&path, image);
        photo.modified = modified;
        photos.push(Arc::new(photo));
    }

    Ok(photos)
}

/// The pagination input: loaded photos with removed entries dropped,
/// in list order, duplicates included.
pub fn valid_photos(photos: &[Arc<Photo>]) -> Vec<Arc<Photo>> {
    photos
        .iter()
        .filter(|photo| !photo.removed)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_photo(name: &str) -> Arc<Photo> {
        let image = DynamicImage::new_rgba8(4, 4);
        Arc::new(Photo::with_name(format!("{name}.png"), name, image))
    }

    #[test]
    fn test_valid_photos_filters_removed() {
        let mut photos = vec![solid_photo("a"), solid_photo("b"), solid_photo("c")];
        Arc::get_mut(&mut photos[1]).unwrap().removed = true;

        let valid = valid_photos(&photos);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].name, "a");
        assert_eq!(valid[1].name, "c");
    }

    #[tokio::test]
    async fn test_load_photos_skips_non_images() {
        let dir = tempfile::tempdir().unwrap();

        let mut buffer = Vec::new();
        let image = DynamicImage::new_rgb8(2, 2);
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(dir.path().join("photo.png"), &buffer).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let photos = load_photos(dir.path()).await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].name, "photo");
        assert!(photos[0].modified.is_some());
    }
}
