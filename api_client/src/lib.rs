//! Client for the hosted photo record store.
//!
//! The backend exposes the `photography` table over a REST dialect
//! (`/rest/v1/<table>` with `column=op.value` selectors) and an object
//! storage bucket of the same name. Both are consumed through the
//! [`RecordStore`] and [`FileStorage`] traits so the gallery core never
//! depends on the concrete HTTP client.

mod storage;

pub use storage::{
    generated_file_name, mime_from_extension, validate_image, FileStorage, ImageFile,
    UploadedFile, ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES, MIN_IMAGE_BYTES, PHOTO_BUCKET,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PHOTO_TABLE: &str = "photography";

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("Request Error: {0}")]
    RequestError(String),
    #[error("Store Error ({status}): {message}")]
    StoreError { status: u16, message: String },
    #[error("Photo not found: {0}")]
    NotFound(String),
    #[error("Invalid file: {0}")]
    InvalidFile(String),
    #[error("Other Error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoStatus {
    #[default]
    Available,
    Sold,
}

impl PhotoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoStatus::Available => "available",
            PhotoStatus::Sold => "sold",
        }
    }
}

impl fmt::Display for PhotoStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PhotoStatus {
    type Err = ApiClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(PhotoStatus::Available),
            "sold" => Ok(PhotoStatus::Sold),
            other => Err(ApiClientError::Other(format!("Unknown status: {}", other))),
        }
    }
}

/// A photo as stored in the `photography` table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PhotoRecord {
    #[serde(deserialize_with = "id_from_text_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "date_or_empty")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "tag_set")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: PhotoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The writable part of a [`PhotoRecord`]; sent on create and update.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PhotoPayload {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub status: PhotoStatus,
}

impl From<&PhotoRecord> for PhotoPayload {
    fn from(record: &PhotoRecord) -> Self {
        PhotoPayload {
            title: record.title.clone(),
            description: record.description.clone(),
            image_url: record.image_url.clone(),
            price: record.price,
            location: record.location.clone(),
            date: record.date,
            tags: record.tags.clone(),
            status: record.status,
        }
    }
}

/// Split a comma separated tag field into trimmed, non-empty, unique tags.
/// Order of first appearance is kept.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn id_from_text_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }
    Ok(match RawId::deserialize(d)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn date_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            // timestamps come back as full RFC 3339 strings on some columns
            let day = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
    }
}

fn tag_set<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<String>>::deserialize(d)?.unwrap_or_default();
    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    Ok(tags)
}

/// Remote collection of photo records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, newest first, optionally narrowed to one status.
    async fn list(&self, status: Option<PhotoStatus>) -> Result<Vec<PhotoRecord>, ApiClientError>;
    async fn get(&self, id: &str) -> Result<Option<PhotoRecord>, ApiClientError>;
    async fn create(&self, payload: &PhotoPayload) -> Result<PhotoRecord, ApiClientError>;
    async fn update(&self, id: &str, payload: &PhotoPayload) -> Result<PhotoRecord, ApiClientError>;
    async fn delete(&self, id: &str) -> Result<(), ApiClientError>;
    /// Case-insensitive substring match over title and description.
    async fn search(&self, query: &str) -> Result<Vec<PhotoRecord>, ApiClientError>;
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
}

pub(crate) async fn service_error(response: reqwest::Response) -> ApiClientError {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = serde_json::from_str::<ServiceErrorBody>(&text)
        .ok()
        .and_then(|b| b.message.or(b.error_description).or(b.msg))
        .unwrap_or(text);
    ApiClientError::StoreError { status, message }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        ApiClient {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Use a signed-in session token instead of the anonymous key for
    /// row-level access checks.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn set_access_token(&mut self, token: String) {
        self.access_token = Some(token);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, PHOTO_TABLE)
    }

    pub(crate) fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    async fn fetch_rows(&self, query: &[(&str, String)]) -> Result<Vec<PhotoRecord>, ApiClientError> {
        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("select", "*")])
            .query(query)
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }

        response
            .json::<Vec<PhotoRecord>>()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))
    }

    async fn write_rows(&self, request: reqwest::RequestBuilder) -> Result<Vec<PhotoRecord>, ApiClientError> {
        let response = self
            .authorized(request)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }

        response
            .json::<Vec<PhotoRecord>>()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))
    }
}

/// Quoted `ilike` pattern for an `or=(...)` filter. Quoting keeps `,` `.`
/// and parentheses literal; only `"` and `\` need escaping inside.
fn search_pattern(query: &str) -> String {
    let escaped = query.trim().replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"*{}*\"", escaped)
}

#[async_trait]
impl RecordStore for ApiClient {
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    async fn list(&self, status: Option<PhotoStatus>) -> Result<Vec<PhotoRecord>, ApiClientError> {
        let mut query = vec![("order", "created_at.desc".to_string())];
        if let Some(status) = status {
            query.push(("status", format!("eq.{}", status)));
        }
        let rows = self.fetch_rows(&query).await?;
        tracing::debug!(count = rows.len(), "listed photo records");
        Ok(rows)
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    async fn get(&self, id: &str) -> Result<Option<PhotoRecord>, ApiClientError> {
        let rows = self.fetch_rows(&[("id", format!("eq.{}", id))]).await?;
        Ok(rows.into_iter().next())
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, payload)))]
    async fn create(&self, payload: &PhotoPayload) -> Result<PhotoRecord, ApiClientError> {
        let request = self.client.post(self.table_url()).json(&[payload]);
        let created = self
            .write_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiClientError::Other("No record returned".into()))?;
        tracing::info!(id = %created.id, "photo record created");
        Ok(created)
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, payload)))]
    async fn update(&self, id: &str, payload: &PhotoPayload) -> Result<PhotoRecord, ApiClientError> {
        let request = self
            .client
            .patch(self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .json(payload);
        let updated = self
            .write_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiClientError::NotFound(id.to_string()))?;
        tracing::info!(id = %updated.id, "photo record updated");
        Ok(updated)
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    async fn delete(&self, id: &str) -> Result<(), ApiClientError> {
        if self.get(id).await?.is_none() {
            return Err(ApiClientError::NotFound(id.to_string()));
        }

        let response = self
            .authorized(self.client.delete(self.table_url()))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }
        tracing::info!(id, "photo record deleted");
        Ok(())
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    async fn search(&self, query: &str) -> Result<Vec<PhotoRecord>, ApiClientError> {
        let pattern = search_pattern(query);
        let filter = format!("(title.ilike.{0},description.ilike.{0})", pattern);
        self.fetch_rows(&[("or", filter), ("order", "created_at.desc".to_string())])
            .await
    }
}
