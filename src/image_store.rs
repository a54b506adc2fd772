use chrono::{DateTime, Utc};
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A verification photo as received from the reporter
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reads a photo from disk, deriving the content type from its extension
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(ImageUpload {
            content_type: content_type_for(path).to_string(),
            file_name,
            bytes,
        })
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Where verification photos end up
pub trait ImageStore: Send + Sync {
    /// Persists the photo and returns a locator for it
    fn store(
        &self,
        subject_id: i64,
        uploaded_at: DateTime<Utc>,
        image: &ImageUpload,
    ) -> io::Result<String>;
}

/// Keeps photos in a local directory
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalImageStore { root: root.into() }
    }

    /// `atk_{subject}_{timestamp}_{name}`; only the last path component of
    /// the uploaded name survives
    pub fn stored_file_name(subject_id: i64, uploaded_at: DateTime<Utc>, original: &str) -> String {
        let original = Path::new(original)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("image");
        format!(
            "atk_{}_{}_{}",
            subject_id,
            uploaded_at.format("%Y-%m-%dT%H-%M-%S-%3fZ"),
            original
        )
    }
}

impl ImageStore for LocalImageStore {
    fn store(
        &self,
        subject_id: i64,
        uploaded_at: DateTime<Utc>,
        image: &ImageUpload,
    ) -> io::Result<String> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(Self::stored_file_name(
            subject_id,
            uploaded_at,
            &image.file_name,
        ));
        fs::write(&path, &image.bytes)?;

        let stored = path.canonicalize()?;
        info!("Stored {} byte image at {}", image.bytes.len(), stored.display());
        Ok(format!("file://{}", stored.display()))
    }
}
