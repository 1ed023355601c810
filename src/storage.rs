use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Accepted upload types and the extensions each may carry.
const IMAGE_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
];

/// Directory an upload lands in, also the second segment of its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    DriverPhotos,
    TourGuidePhotos,
    HotelPhotos,
    VehiclePhotos,
    Licenses,
    NidCards,
}

impl UploadCategory {
    /// Categories served to anyone under `/uploads/<dir>`. Identity
    /// documents are only reachable through their owner-checked endpoint.
    pub const PUBLIC: [UploadCategory; 4] = [
        UploadCategory::DriverPhotos,
        UploadCategory::TourGuidePhotos,
        UploadCategory::HotelPhotos,
        UploadCategory::VehiclePhotos,
    ];

    pub fn is_public(self) -> bool {
        Self::PUBLIC.contains(&self)
    }

    pub fn dir(self) -> &'static str {
        match self {
            UploadCategory::DriverPhotos => "drivers",
            UploadCategory::TourGuidePhotos => "tour-guides",
            UploadCategory::HotelPhotos => "hotels",
            UploadCategory::VehiclePhotos => "vehicles",
            UploadCategory::Licenses => "licenses",
            UploadCategory::NidCards => "nid-cards",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

/// Check an upload before anything is written. Returns the extension to
/// store the file under.
pub fn validate_image(
    content_type: Option<&str>,
    file_name: Option<&str>,
    len: usize,
    max_bytes: usize,
) -> AppResult<&'static str> {
    if len == 0 {
        return Err(AppError::validation("file", "File is empty"));
    }
    if len > max_bytes {
        return Err(AppError::validation(
            "file",
            format!("File exceeds the {} MB limit", max_bytes / (1024 * 1024)),
        ));
    }

    let content_type = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .unwrap_or_default();
    let ext = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .and_then(|(_, exts)| exts.iter().find(|e| **e == ext).copied())
        .ok_or_else(|| {
            AppError::validation(
                "file",
                "Only JPEG, PNG, GIF or WebP images are allowed",
            )
        })
}

/// Content type to serve a stored image with, from its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    IMAGE_TYPES
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map(|(mime, _)| *mime)
        .unwrap_or("application/octet-stream")
}

/// Local-disk store for uploaded files.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    public_base_url: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn dir(&self, category: UploadCategory) -> PathBuf {
        self.root.join(category.dir())
    }

    /// Public address of a stored photo.
    pub fn url_for(&self, category: UploadCategory, filename: &str) -> String {
        format!("{}/uploads/{}/{}", self.public_base_url, category.dir(), filename)
    }

    /// Authenticated address of a verification document's file.
    pub fn document_url(&self, document_id: Uuid) -> String {
        format!("{}/api/documents/{}/file", self.public_base_url, document_id)
    }

    /// Read back a stored file. A file gone from disk is `NotFound`.
    pub async fn read(&self, path: &Path) -> AppResult<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Stored file is missing");
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(
        &self,
        category: UploadCategory,
        ext: &str,
        bytes: &[u8],
    ) -> AppResult<StoredFile> {
        let dir = self.dir(category);
        tokio::fs::create_dir_all(&dir).await?;

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored upload");

        Ok(StoredFile {
            url: self.url_for(category, &filename),
            filename,
            path,
        })
    }

    /// Best effort; a file left behind is only wasted disk.
    pub async fn remove(&self, file: &StoredFile) {
        if let Err(e) = tokio::fs::remove_file(&file.path).await {
            tracing::warn!(path = %file.path.display(), error = %e, "Failed to remove upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: usize = 1024 * 1024;

    #[test]
    fn test_accepts_images() {
        assert_eq!(validate_image(Some("image/png"), Some("me.PNG"), 10, 5 * MB).unwrap(), "png");
        assert_eq!(
            validate_image(Some("image/jpeg"), Some("license.jpeg"), 10, 5 * MB).unwrap(),
            "jpeg"
        );
        assert_eq!(
            validate_image(Some("image/webp; charset=binary"), Some("a.webp"), 10, 5 * MB).unwrap(),
            "webp"
        );
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(validate_image(Some("application/pdf"), Some("license.pdf"), 10, 5 * MB).is_err());
        assert!(validate_image(Some("text/plain"), Some("a.png"), 10, 5 * MB).is_err());
        assert!(validate_image(Some("image/png"), Some("a.exe"), 10, 5 * MB).is_err());
        assert!(validate_image(None, Some("a.png"), 10, 5 * MB).is_err());
        assert!(validate_image(Some("image/png"), None, 10, 5 * MB).is_err());
    }

    #[test]
    fn test_size_limits() {
        assert!(validate_image(Some("image/png"), Some("a.png"), 5 * MB, 5 * MB).is_ok());
        assert!(validate_image(Some("image/png"), Some("a.png"), 5 * MB + 1, 5 * MB).is_err());
        assert!(validate_image(Some("image/png"), Some("a.png"), 0, 5 * MB).is_err());
    }

    #[test]
    fn test_url_for() {
        let store = FileStore::new("uploads", "http://localhost:5000");
        assert_eq!(
            store.url_for(UploadCategory::HotelPhotos, "x.png"),
            "http://localhost:5000/uploads/hotels/x.png"
        );

        let id = Uuid::new_v4();
        assert_eq!(
            store.document_url(id),
            format!("http://localhost:5000/api/documents/{}/file", id)
        );
    }

    #[test]
    fn test_identity_documents_are_not_public() {
        assert!(!UploadCategory::Licenses.is_public());
        assert!(!UploadCategory::NidCards.is_public());
        assert!(UploadCategory::DriverPhotos.is_public());
        assert!(UploadCategory::VehiclePhotos.is_public());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a/b.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("b.webp")), "image/webp");
        assert_eq!(content_type_for(Path::new("b")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let store = FileStore::new(std::env::temp_dir(), "http://localhost:5000");
        let missing = std::env::temp_dir().join(format!("{}.png", Uuid::new_v4()));
        assert!(matches!(store.read(&missing).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = std::env::temp_dir().join(format!("marketplace-store-{}", Uuid::new_v4()));
        let store = FileStore::new(&root, "http://localhost:5000");

        let stored = store.save(UploadCategory::HotelPhotos, "png", b"fake").await.unwrap();
        assert!(stored.path.starts_with(root.join("hotels")));
        assert!(stored.url.ends_with(&stored.filename));
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"fake");

        store.remove(&stored).await;
        assert!(!stored.path.exists());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
