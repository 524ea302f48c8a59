use std::future::Future;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::api::error;
use crate::modules::media::model::{PhotoCategory, PhotoUpload, UploadConfig};

#[derive(Clone)]
pub struct MediaService {
    config: UploadConfig,
}

impl MediaService {
    pub fn new(config: UploadConfig) -> Self {
        log::info!("MediaService storing uploads under {}", config.upload_dir);
        Self { config }
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    /// Creates one directory per photo category.
    pub async fn init_dirs(&self) -> Result<(), error::SystemError> {
        for category in PhotoCategory::ALL {
            tokio::fs::create_dir_all(self.category_dir(category)).await?;
        }
        Ok(())
    }

    fn category_dir(&self, category: PhotoCategory) -> PathBuf {
        Path::new(&self.config.upload_dir).join(category.as_str())
    }

    fn resolve_mime(&self, upload: &PhotoUpload) -> String {
        upload
            .mime_type
            .clone()
            .filter(|m| m != "application/octet-stream")
            .unwrap_or_else(|| {
                mime_guess::from_path(&upload.filename).first_or_octet_stream().to_string()
            })
    }

    fn validate_file(&self, upload: &PhotoUpload, mime_type: &str) -> Result<(), error::SystemError> {
        if upload.bytes.is_empty() {
            return Err(error::SystemError::bad_request("File is empty"));
        }

        if upload.bytes.len() > self.config.max_file_size {
            return Err(error::SystemError::bad_request(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }

        if !self.config.allowed_mime_types.iter().any(|m| m == mime_type) {
            return Err(error::SystemError::bad_request(
                "Invalid file type. Allowed: JPG, PNG, GIF, WebP",
            ));
        }

        Ok(())
    }

    fn generate_filename(&self, original_filename: &str) -> String {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase);

        let uuid = Uuid::now_v7();
        match extension {
            Some(ext) if !ext.is_empty() => format!("{uuid}.{ext}"),
            _ => uuid.to_string(),
        }
    }

    /// Validates and writes the photo, returning the URL it is served under.
    pub async fn save_photo(
        &self,
        category: PhotoCategory,
        upload: PhotoUpload,
    ) -> Result<String, error::SystemError> {
        let mime_type = self.resolve_mime(&upload);
        self.validate_file(&upload, &mime_type)?;

        let filename = self.generate_filename(&upload.filename);
        let dir = self.category_dir(category);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&filename), &upload.bytes).await?;

        log::info!("Stored {} photo {} ({} bytes)", category.as_str(), filename, upload.bytes.len());
        Ok(format!("{}/{}/{}", self.config.base_url, category.as_str(), filename))
    }

    /// Saves the photo and hands its URL to `commit`; the file is removed again
    /// when `commit` fails so no upload outlives a rejected write.
    pub async fn save_photo_with<T, F, Fut>(
        &self,
        category: PhotoCategory,
        upload: PhotoUpload,
        commit: F,
    ) -> Result<T, error::SystemError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, error::SystemError>>,
    {
        let url = self.save_photo(category, upload).await?;
        match commit(url.clone()).await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.discard(&url).await;
                Err(e)
            }
        }
    }

    /// Best-effort removal of a photo whose owning write was rejected.
    pub async fn discard(&self, url: &str) {
        let mut segments = url.rsplit('/');
        let (Some(file), Some(category)) = (segments.next(), segments.next()) else {
            return;
        };
        let Ok(path) = self.resolve_path(category, file) else {
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            log::warn!("Failed to discard photo {}: {}", path.display(), e);
        }
    }

    /// Maps a served URL segment back onto disk, refusing anything outside the category dir.
    pub fn resolve_path(&self, category: &str, file: &str) -> Result<PathBuf, error::SystemError> {
        let category = PhotoCategory::parse(category)
            .ok_or_else(|| error::SystemError::not_found("File not found"))?;

        let valid = !file.is_empty()
            && !file.starts_with('.')
            && file.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if !valid {
            return Err(error::SystemError::not_found("File not found"));
        }

        Ok(self.category_dir(category).join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(dir: &Path) -> MediaService {
        MediaService::new(UploadConfig::new(dir.to_string_lossy(), 16))
    }

    fn upload(filename: &str, mime: Option<&str>, bytes: &[u8]) -> PhotoUpload {
        PhotoUpload {
            filename: filename.to_string(),
            mime_type: mime.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("media-test-{}", Uuid::now_v7()))
    }

    #[tokio::test]
    async fn saves_photo_under_category() {
        let dir = temp_dir();
        let media = service(&dir);

        let url = media
            .save_photo(PhotoCategory::Groups, upload("Team.PNG", Some("image/png"), b"png"))
            .await
            .unwrap();

        assert!(url.starts_with("/uploads/groups/"));
        assert!(url.ends_with(".png"));

        let file = url.rsplit('/').next().unwrap();
        let path = media.resolve_path("groups", file).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png");

        media.discard(&url).await;
        assert!(!path.exists());

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn rejected_commit_discards_the_file() {
        let dir = temp_dir();
        let media = service(&dir);

        let err = media
            .save_photo_with(
                PhotoCategory::Profiles,
                upload("me.png", Some("image/png"), b"png"),
                |_url| async { Err::<(), _>(error::SystemError::not_found("User not found")) },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));

        let profiles = dir.join("profiles");
        let mut entries = tokio::fs::read_dir(&profiles).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());

        let kept = media
            .save_photo_with(
                PhotoCategory::Profiles,
                upload("me.png", Some("image/png"), b"png"),
                |url| async move { Ok(url) },
            )
            .await
            .unwrap();
        let file = kept.rsplit('/').next().unwrap();
        assert!(media.resolve_path("profiles", file).unwrap().exists());

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn mime_falls_back_to_extension() {
        let dir = temp_dir();
        let media = service(&dir);

        let ok = media
            .save_photo(PhotoCategory::Messages, upload("cat.jpg", None, b"jpg"))
            .await;
        assert!(ok.is_ok());

        let err = media
            .save_photo(PhotoCategory::Messages, upload("notes.txt", None, b"text"))
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn rejects_empty_and_oversized_files() {
        let dir = temp_dir();
        let media = service(&dir);

        let empty = media
            .save_photo(PhotoCategory::Profiles, upload("a.png", Some("image/png"), b""))
            .await;
        assert!(matches!(empty, Err(error::SystemError::BadRequest(_))));

        let big = media
            .save_photo(PhotoCategory::Profiles, upload("a.png", Some("image/png"), &[0u8; 17]))
            .await;
        assert!(matches!(big, Err(error::SystemError::BadRequest(_))));
    }

    #[test]
    fn resolve_path_rejects_traversal() {
        let media = service(Path::new("/tmp/uploads"));

        assert!(media.resolve_path("profiles", "abc.png").is_ok());
        assert!(media.resolve_path("secrets", "abc.png").is_err());
        assert!(media.resolve_path("profiles", "..").is_err());
        assert!(media.resolve_path("profiles", "../x.png").is_err());
        assert!(media.resolve_path("profiles", "").is_err());
    }
}
