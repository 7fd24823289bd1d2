//! Image downloading with an on-disk cache.

use futures::StreamExt;
use gallery::GalleryCard;
use iced::widget::image::Handle;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Semaphore;

const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageLoaderError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Image not found")]
    NotFound,
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP Error: {0}")]
    Status(u16),
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Semaphore closed")]
    SemaphoreClosed,
}

fn request_error(e: reqwest::Error) -> ImageLoaderError {
    if e.is_timeout() {
        ImageLoaderError::Timeout
    } else {
        ImageLoaderError::Network(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ImageLoader {
    cache_dir: PathBuf,
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl ImageLoader {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self::with_client(cache_dir, reqwest::Client::new())
    }

    pub fn with_client(cache_dir: PathBuf, client: reqwest::Client) -> Self {
        Self {
            cache_dir,
            client,
            semaphore: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
        }
    }

    /// Cache location for a record's image. The URL is hashed in so an
    /// edited record does not keep showing its old picture.
    pub fn cache_path(&self, id: &str, url: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.cache_dir
            .join(format!("{}-{:016x}.img", safe_id, hasher.finish()))
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn load(&self, id: &str, url: &str) -> Result<Handle, ImageLoaderError> {
        let start = Instant::now();
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ImageLoaderError::SemaphoreClosed)?;

        let cache_path = self.cache_path(id, url);
        if cache_path.exists() {
            return Ok(Handle::from_path(&cache_path));
        }

        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ImageLoaderError::NotFound);
        }
        if !status.is_success() {
            return Err(ImageLoaderError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await.map_err(request_error)?;

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ImageLoaderError::Io(e.to_string()))?;
        }
        fs::write(&cache_path, &bytes)
            .await
            .map_err(|e| ImageLoaderError::Io(e.to_string()))?;

        tracing::info!("image_time_ms" = %start.elapsed().as_millis(), "id" = id);
        Ok(Handle::from_path(&cache_path))
    }

    /// Load the first `count` card images concurrently. Failures are logged
    /// and returned alongside the successes.
    pub async fn preload(
        &self,
        cards: &[GalleryCard],
        count: usize,
    ) -> Vec<(String, Result<Handle, String>)> {
        let start = Instant::now();
        let results: Vec<_> = futures::stream::iter(0..count.min(cards.len()))
            .map(|i| async move {
                let card = &cards[i];
                let result = self.load(&card.id, &card.image_url).await.map_err(|e| {
                    tracing::error!("Failed to preload image for {}: {}", card.id, e);
                    e.to_string()
                });
                (card.id.clone(), result)
            })
            .buffer_unordered(DEFAULT_CONCURRENCY)
            .collect()
            .await;
        tracing::info!("preload_time_ms" = %start.elapsed().as_millis(), "count" = results.len());
        results
    }
}
