use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{AppError, AppResult};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Local filesystem blob store for uploaded images.
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store an image for the named owner and return its path relative to the media root.
    pub async fn save_image(
        &self,
        owner_name: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> AppResult<String> {
        let extension = image_extension(file_name).ok_or_else(|| {
            AppError::field(
                "image",
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            )
        })?;

        let relative = upload_path(owner_name, &extension);
        let full = self.root.join(&relative);

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create media dir: {}", e)))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write image: {}", e)))?;

        tracing::debug!(path = %full.display(), size = bytes.len(), "Stored image");
        Ok(relative)
    }
}

/// `uploads/{slug}-{uuid}.{ext}`
pub fn upload_path(owner_name: &str, extension: &str) -> String {
    format!("uploads/{}-{}.{}", slugify(owner_name), Uuid::new_v4(), extension)
}

fn image_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Lowercase ASCII slug: alphanumerics kept, runs of spaces/dashes collapsed to one dash.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        }
    }

    slug
}
