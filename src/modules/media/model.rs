#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoCategory {
    Profiles,
    Groups,
    Messages,
}

impl PhotoCategory {
    pub const ALL: [PhotoCategory; 3] =
        [PhotoCategory::Profiles, PhotoCategory::Groups, PhotoCategory::Messages];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoCategory::Profiles => "profiles",
            PhotoCategory::Groups => "groups",
            PhotoCategory::Messages => "messages",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// Photo upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
    pub upload_dir: String,
    pub base_url: String,
}

impl UploadConfig {
    pub fn new(upload_dir: impl Into<String>, max_file_size: usize) -> Self {
        Self { upload_dir: upload_dir.into(), max_file_size, ..Self::default() }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
            upload_dir: "./uploads".to_string(),
            base_url: "/uploads".to_string(),
        }
    }
}

/// Photo part pulled out of a multipart body, not yet written to disk.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}
