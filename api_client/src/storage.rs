//! Object storage for uploaded photo files.

use crate::{service_error, ApiClient, ApiClientError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::path::Path;

pub const PHOTO_BUCKET: &str = "photography";
pub const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/svg+xml",
];
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;
pub const MIN_IMAGE_BYTES: usize = 1024;

/// An image picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// Object path inside the bucket; what `remove` expects.
    pub path: String,
    pub public_url: String,
    pub size: usize,
    pub mime_type: String,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_from_extension(&name).to_string();
        ImageFile { name, mime_type, bytes }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ApiClientError> {
        let name = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| ApiClientError::Other("Invalid file name".into()))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiClientError::Other(e.to_string()))?;
        Ok(ImageFile::new(name, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn extension(&self) -> &str {
        self.name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("jpg")
    }

    pub fn size_in_mb(&self) -> String {
        format!("{:.2}", self.size() as f64 / (1024.0 * 1024.0))
    }
}

pub fn mime_from_extension(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Check type and size limits; all violations are reported together.
pub fn validate_image(file: &ImageFile) -> Result<(), ApiClientError> {
    let mut errors = Vec::new();
    if !ALLOWED_IMAGE_TYPES.contains(&file.mime_type.as_str()) {
        errors.push("File type not allowed. Only images are accepted (JPEG, PNG, WebP, GIF, SVG)");
    }
    if file.size() > MAX_IMAGE_BYTES {
        errors.push("File is too large. Maximum 50MB");
    }
    if file.size() < MIN_IMAGE_BYTES {
        errors.push("File is too small. Minimum 1KB");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiClientError::InvalidFile(errors.join(", ")))
    }
}

pub fn generated_file_name(extension: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "photo_{}_{}.{}",
        chrono::Utc::now().timestamp_millis(),
        &random[..13],
        extension
    )
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload(&self, file: &ImageFile) -> Result<UploadedFile, ApiClientError>;
    async fn remove(&self, path: &str) -> Result<(), ApiClientError>;
}

impl ApiClient {
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url(),
            PHOTO_BUCKET,
            path
        )
    }
}

#[async_trait]
impl FileStorage for ApiClient {
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, file)))]
    async fn upload(&self, file: &ImageFile) -> Result<UploadedFile, ApiClientError> {
        validate_image(file)?;
        let path = generated_file_name(file.extension());
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url(), PHOTO_BUCKET, path);

        let response = self
            .authorized(self.http().post(&url))
            .header(CONTENT_TYPE, &file.mime_type)
            .header("cache-control", "3600")
            .header("x-upsert", "false")
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let err = service_error(response).await;
            tracing::error!(error = %err, file = %file.name, "image upload failed");
            return Err(err);
        }

        tracing::info!(path = %path, size = file.size(), "image uploaded");
        Ok(UploadedFile {
            public_url: self.public_url(&path),
            path,
            size: file.size(),
            mime_type: file.mime_type.clone(),
        })
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    async fn remove(&self, path: &str) -> Result<(), ApiClientError> {
        #[derive(Serialize)]
        struct RemoveRequest<'a> {
            prefixes: Vec<&'a str>,
        }

        if path.is_empty() {
            return Err(ApiClientError::Other("File name required".into()));
        }

        let url = format!("{}/storage/v1/object/{}", self.base_url(), PHOTO_BUCKET);
        let response = self
            .authorized(self.http().delete(&url))
            .json(&RemoveRequest { prefixes: vec![path] })
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_image_limits() {
        let ok = ImageFile::new("a.JPG", vec![0; 2048]);
        assert_eq!(ok.mime_type, "image/jpeg");
        assert!(validate_image(&ok).is_ok());

        let tiny = ImageFile::new("a.png", vec![0; 10]);
        let err = validate_image(&tiny).unwrap_err().to_string();
        assert!(err.contains("too small"));

        let text = ImageFile::new("notes.txt", vec![0; 2048]);
        let err = validate_image(&text).unwrap_err().to_string();
        assert!(err.contains("not allowed"));
    }

    #[test]
    fn test_generated_file_name_shape() {
        let name = generated_file_name("webp");
        assert!(name.starts_with("photo_"));
        assert!(name.ends_with(".webp"));
        assert_eq!(name.split('_').count(), 3);
    }

    #[test]
    fn test_public_url() {
        let client = ApiClient::new("https://proj.example.co/", "anon");
        assert_eq!(
            client.public_url("photo_1.jpg"),
            "https://proj.example.co/storage/v1/object/public/photography/photo_1.jpg"
        );
    }
}
