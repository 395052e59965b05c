//! Product image storage on the local filesystem.
//!
//! Images are written under `{media_dir}/products/` with a random file name;
//! the database stores the path relative to `media_dir`, which is also the
//! path under the `/media/` URL prefix.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Subdirectory of the media root holding product images.
pub const PRODUCT_IMAGE_DIR: &str = "products";

/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Extensions accepted for product images.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Errors from storing an image.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The file is not one of the accepted image types.
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    /// The file is larger than [`MAX_IMAGE_BYTES`].
    #[error("image is too large ({0} bytes)")]
    TooLarge(usize),

    /// Writing or removing the file failed.
    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Message shown next to the image field.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::UnsupportedType(_) => "Upload a valid image. Allowed types: jpg, png, gif, webp.",
            Self::TooLarge(_) => "The image is too large (5 MB maximum).",
            Self::Io(_) => "The image could not be saved.",
        }
    }
}

/// Lower-cased extension of an uploaded file name, if it is an accepted image type.
///
/// # Errors
///
/// Returns `MediaError::UnsupportedType` for any other extension.
pub fn image_extension(file_name: &str) -> Result<&'static str, MediaError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|allowed| **allowed == ext)
        .copied()
        .ok_or(MediaError::UnsupportedType(ext))
}

/// Stores product images under a media root.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Save an uploaded image and return its path relative to the media root.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` if the type or size is rejected or the write fails.
    pub async fn save_product_image(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let ext = image_extension(file_name)?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(MediaError::TooLarge(bytes.len()));
        }

        let dir = self.root.join(PRODUCT_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}.{ext}", Uuid::new_v4().simple());
        tokio::fs::write(dir.join(&name), bytes).await?;

        let relative = format!("{PRODUCT_IMAGE_DIR}/{name}");
        tracing::debug!(path = %relative, size = bytes.len(), "Saved product image");
        Ok(relative)
    }

    /// Remove a stored image. A file that is already gone is not an error,
    /// and paths that would escape the media root are ignored.
    pub async fn remove(&self, relative: &str) {
        if relative.contains("..") || Path::new(relative).is_absolute() {
            tracing::warn!(path = relative, "Refusing to remove media outside the media root");
            return;
        }
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => tracing::debug!(path = relative, "Removed product image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = relative, error = %e, "Failed to remove product image"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("arm.PNG").unwrap(), "png");
        assert_eq!(image_extension("photo.jpeg").unwrap(), "jpeg");
        assert!(matches!(
            image_extension("script.sh"),
            Err(MediaError::UnsupportedType(_))
        ));
        assert!(image_extension("no_extension").is_err());
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = std::env::temp_dir().join(format!("robo-media-{}", Uuid::new_v4().simple()));
        let store = MediaStore::new(&root);

        let path = store.save_product_image("gripper.png", b"fake").await.unwrap();
        assert!(path.starts_with("products/"));
        assert!(path.ends_with(".png"));
        assert!(root.join(&path).exists());

        store.remove(&path).await;
        assert!(!root.join(&path).exists());
        // Removing twice is fine.
        store.remove(&path).await;

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_too_large() {
        let store = MediaStore::new(std::env::temp_dir());
        let bytes = vec![0_u8; MAX_IMAGE_BYTES + 1];
        assert!(matches!(
            store.save_product_image("big.png", &bytes).await,
            Err(MediaError::TooLarge(_))
        ));
    }
}
