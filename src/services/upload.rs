use crate::error::{AppError, AppResult};
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;
const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Clone)]
pub struct UploadConfig {
    pub upload_dir: String,
    pub max_file_size: usize,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
        let max_file_size = env::var("UPLOAD_MAX_BYTES")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .filter(|size: &usize| *size > 0)
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);
        Self {
            upload_dir,
            max_file_size,
        }
    }
}

/// Where an upload is filed under `UPLOAD_DIR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    Gallery,
    Avatar,
    Event,
}

impl UploadTarget {
    fn subdirectory(self) -> &'static str {
        match self {
            UploadTarget::Gallery => "gallery",
            UploadTarget::Avatar => "avatars",
            UploadTarget::Event => "events",
        }
    }
}

/// Magic bytes must agree with the declared content type.
fn validate_magic_bytes(data: &[u8], content_type: &str) -> bool {
    match content_type {
        "image/jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
        "image/gif" => data.starts_with(&[0x47, 0x49, 0x46, 0x38]),
        "image/webp" => {
            data.len() >= 12 && data[..4] == *b"RIFF" && data[8..12] == *b"WEBP"
        }
        _ => false,
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

pub struct UploadService;

impl UploadService {
    /// Checks size, type and content, then writes the file.
    /// Returns the public URL path, e.g. `/uploads/gallery/<uuid>.jpg`.
    pub async fn save_image(
        config: &UploadConfig,
        data: &[u8],
        content_type: &str,
        target: UploadTarget,
    ) -> AppResult<String> {
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if data.len() > config.max_file_size {
            return Err(AppError::PayloadTooLarge);
        }

        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(AppError::Validation(format!(
                "Unsupported file type: {}. Allowed: jpeg, png, gif, webp",
                content_type
            )));
        }
        if !validate_magic_bytes(data, content_type) {
            return Err(AppError::Validation(
                "File content does not match declared content type".to_string(),
            ));
        }
        let ext = extension_for(content_type)
            .ok_or_else(|| AppError::Validation("Unsupported file type".to_string()))?;

        let subdirectory = target.subdirectory();
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = Path::new(&config.upload_dir).join(subdirectory);

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create upload directory: {}", e))?;
        fs::write(dir.join(&filename), data)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write upload: {}", e))?;

        tracing::debug!(dir = subdirectory, %filename, "Stored upload");
        Ok(format!("/uploads/{}/{}", subdirectory, filename))
    }

    /// Best-effort removal of a file previously returned by `save_image`.
    pub async fn remove(config: &UploadConfig, public_url: &str) {
        let Some(path) = local_path(config, public_url) else {
            return;
        };
        if let Err(e) = fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), "Failed to remove upload: {}", e);
        }
    }
}

/// Maps `/uploads/<dir>/<file>` back to disk, refusing anything that could
/// escape the upload directory.
fn local_path(config: &UploadConfig, public_url: &str) -> Option<PathBuf> {
    let rest = public_url.strip_prefix("/uploads/")?;
    let (dir, file) = rest.split_once('/')?;
    let valid = |s: &str| {
        !s.is_empty()
            && s != ".."
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    if !valid(dir) || !valid(file) {
        return None;
    }
    Some(Path::new(&config.upload_dir).join(dir).join(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> UploadConfig {
        UploadConfig {
            upload_dir: dir.to_string_lossy().into_owned(),
            max_file_size: 64,
        }
    }

    #[test]
    fn magic_bytes_per_type() {
        assert!(validate_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg"));
        assert!(validate_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D], "image/png"));
        assert!(validate_magic_bytes(b"GIF89a", "image/gif"));
        assert!(validate_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 ", "image/webp"));
    }

    #[test]
    fn mismatched_or_short_content_rejected() {
        assert!(!validate_magic_bytes(&[0x89, 0x50, 0x4E, 0x47], "image/jpeg"));
        assert!(!validate_magic_bytes(&[0xFF, 0xD8], "image/jpeg"));
        assert!(!validate_magic_bytes(&[0xFF, 0xD8, 0xFF], "application/pdf"));
    }

    #[test]
    fn local_path_rejects_traversal() {
        let cfg = config(Path::new("/srv/uploads"));
        assert_eq!(
            local_path(&cfg, "/uploads/gallery/abc.jpg"),
            Some(PathBuf::from("/srv/uploads/gallery/abc.jpg"))
        );
        assert_eq!(local_path(&cfg, "/uploads/../etc/passwd"), None);
        assert_eq!(local_path(&cfg, "/uploads/gallery/../../x"), None);
        assert_eq!(local_path(&cfg, "https://cdn.example/x.jpg"), None);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_before_writing() {
        let dir = std::env::temp_dir().join(format!("alumni-upload-{}", Uuid::new_v4()));
        let cfg = config(&dir);
        let mut data = vec![0xFF, 0xD8, 0xFF];
        data.resize(65, 0);

        let err = UploadService::save_image(&cfg, &data, "image/jpeg", UploadTarget::Gallery)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn saved_image_lands_in_target_directory() {
        let dir = std::env::temp_dir().join(format!("alumni-upload-{}", Uuid::new_v4()));
        let cfg = config(&dir);

        let url = UploadService::save_image(&cfg, b"GIF89a..", "image/gif", UploadTarget::Avatar)
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/avatars/") && url.ends_with(".gif"));

        let path = local_path(&cfg, &url).unwrap();
        assert!(path.exists());
        UploadService::remove(&cfg, &url).await;
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
