//! Uploaded image validation and storage.
//!
//! Uploads are sniffed from their magic bytes and fully decoded before
//! anything touches the disk, so a file with an image extension but
//! garbage content is rejected. Accepted files are written under the media
//! root with a random name; the database stores the media-relative path.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use tracing::{debug, warn};
use uuid::Uuid;

/// Image formats accepted for recipe photos.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum upload size (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Directory under the media root holding recipe images.
const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,

    #[error("Unsupported image format: {0:?}. Allowed: JPEG, PNG, GIF, WebP")]
    UnsupportedFormat(ImageFormat),

    #[error("The submitted file is empty.")]
    Empty,

    #[error("File too large. Maximum size is 10MB")]
    TooLarge,

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Whether the error is the uploader's fault rather than the server's
    pub fn is_client_error(&self) -> bool {
        !matches!(self, MediaError::Io(_))
    }
}

/// Checks that `data` is a decodable image in an allowed format.
pub fn validate_image(data: &[u8]) -> Result<ImageFormat, MediaError> {
    if data.is_empty() {
        return Err(MediaError::Empty);
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(MediaError::TooLarge);
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|_| MediaError::NotAnImage)?;

    let format = reader.format().ok_or(MediaError::NotAnImage)?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(MediaError::UnsupportedFormat(format));
    }

    reader.decode().map_err(|e| {
        debug!(error = %e, "Image failed to decode");
        MediaError::NotAnImage
    })?;

    Ok(format)
}

/// Filesystem-backed media storage.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    /// `root` is the directory files are written to; `url_prefix` is where
    /// the HTTP server exposes it (e.g. `/media`).
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates and writes a recipe image, returning its media-relative path.
    pub async fn save_recipe_image(&self, data: &[u8]) -> Result<String, MediaError> {
        let format = validate_image(data)?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");

        let relative = format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), extension);
        let path = self.root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        debug!(path = %path.display(), bytes = data.len(), "Stored recipe image");
        Ok(relative)
    }

    /// Removes a stored file; failures are logged, not returned.
    pub async fn remove(&self, relative: &str) {
        if relative.split('/').any(|part| part == "..") {
            warn!(relative, "Refusing to remove path outside media root");
            return;
        }

        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(relative, error = %e, "Failed to remove media file");
            }
        }
    }

    /// Public URL for a media-relative path.
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(10, 10, image::Rgb([200, 30, 30]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_validate_image_accepts_png() {
        assert_eq!(validate_image(&png_bytes()).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_validate_image_rejects_text() {
        let err = validate_image(b"notimage").unwrap_err();
        assert!(matches!(err, MediaError::NotAnImage));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_validate_image_rejects_truncated_png() {
        let mut data = png_bytes();
        data.truncate(20);
        assert!(matches!(validate_image(&data), Err(MediaError::NotAnImage)));
    }

    #[test]
    fn test_validate_image_rejects_empty() {
        assert!(matches!(validate_image(&[]), Err(MediaError::Empty)));
    }

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let store = MediaStore::new("/tmp/media", "/media/");
        assert_eq!(
            store.url_for("uploads/recipe/a.png"),
            "/media/uploads/recipe/a.png"
        );
    }

    #[tokio::test]
    async fn test_save_and_remove_recipe_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "/media");

        let relative = store.save_recipe_image(&png_bytes()).await.unwrap();
        assert!(relative.starts_with("uploads/recipe/"));
        assert!(relative.ends_with(".png"));
        assert!(dir.path().join(&relative).exists());

        store.remove(&relative).await;
        assert!(!dir.path().join(&relative).exists());
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "/media");

        assert!(store.save_recipe_image(b"notimage").await.is_err());
        assert!(!dir.path().join(RECIPE_IMAGE_DIR).exists());
    }
}
