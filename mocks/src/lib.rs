use api_client::{
    ApiClientError, FileStorage, ImageFile, PhotoPayload, PhotoRecord, PhotoStatus, RecordStore,
    UploadedFile,
};
use async_trait::async_trait;
use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::json;
use std::sync::{Arc, Mutex};

pub const ANON_KEY: &str = "anon-key";

/// Build a record with just the fields the gallery cares about.
pub fn sample_record(id: &str, title: &str, tags: &[&str]) -> PhotoRecord {
    PhotoRecord {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        image_url: format!("https://cdn.example.com/{}.jpg", id),
        price: None,
        location: None,
        date: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        status: PhotoStatus::Available,
        created_at: None,
        updated_at: None,
    }
}

/// Three records tagged like the portfolio's default categories.
pub fn sample_records() -> Vec<PhotoRecord> {
    vec![
        sample_record("1", "Bosque", &["naturaleza"]),
        sample_record("2", "Avenida", &["urbano"]),
        sample_record("3", "Parque", &["naturaleza", "urbano"]),
    ]
}

pub fn records_body() -> serde_json::Value {
    json!([
        {
            "id": 1,
            "title": "Bosque",
            "description": "Niebla al amanecer",
            "image_url": "https://cdn.example.com/1.jpg",
            "price": 150,
            "location": "Chiloé",
            "date": "2024-03-02",
            "tags": ["naturaleza"],
            "status": "available",
            "created_at": "2024-03-03T10:00:00+00:00"
        },
        {
            "id": 2,
            "title": "Avenida",
            "description": null,
            "image_url": "https://cdn.example.com/2.jpg",
            "price": null,
            "location": null,
            "date": null,
            "tags": ["urbano"],
            "status": "sold",
            "created_at": "2024-03-01T10:00:00+00:00"
        }
    ])
}

/// Create an empty mock server standing in for the hosted backend.
pub fn store_server() -> Server {
    Server::run()
}

/// Expect a GET on the photo table answering with [`records_body`].
pub fn expect_list(server: &Server) {
    server.expect(
        Expectation::matching(all_of![
            request::method("GET"),
            request::path("/rest/v1/photography"),
            request::headers(contains(("apikey", ANON_KEY))),
        ])
        .respond_with(json_encoded(records_body())),
    );
}

/// Expect a password grant on the auth endpoint.
pub fn expect_password_grant(server: &Server, access_token: &str) {
    server.expect(
        Expectation::matching(all_of![
            request::method("POST"),
            request::path("/auth/v1/token"),
            request::query(url_decoded(contains(("grant_type", "password")))),
        ])
        .respond_with(json_encoded(session_body(access_token, 3600))),
    );
}

pub fn session_body(access_token: &str, expires_in: i64) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": expires_in,
        "refresh_token": "refresh-token",
        "user": {
            "id": "user-1",
            "email": "admin@example.com",
            "user_metadata": { "name": "Admin" }
        }
    })
}

#[derive(Default)]
struct Inner {
    records: Vec<PhotoRecord>,
    next_id: u64,
    calls: Vec<String>,
    failure: Option<String>,
    failing_call: Option<String>,
    uploads: Vec<String>,
}

/// In-memory record store and file storage used by controller tests.
/// Every call is logged by name so tests can assert what reached the store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<PhotoRecord>) -> Self {
        let store = Self::default();
        {
            let mut inner = store.inner.lock().unwrap();
            inner.next_id = records.len() as u64 + 100;
            inner.records = records;
        }
        store
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn records(&self) -> Vec<PhotoRecord> {
        self.inner.lock().unwrap().records.clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.inner.lock().unwrap().uploads.clone()
    }

    /// Make every following call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        self.inner.lock().unwrap().failure = Some(message.to_string());
    }

    /// Make only calls named `call` fail with `message`.
    pub fn fail_on(&self, call: &str, message: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.failure = Some(message.to_string());
        inner.failing_call = Some(call.to_string());
    }

    pub fn recover(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.failure = None;
        inner.failing_call = None;
    }

    fn enter(&self, call: &str) -> Result<std::sync::MutexGuard<'_, Inner>, ApiClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call.to_string());
        let targeted = inner.failing_call.as_deref().map_or(true, |c| c == call);
        if let (Some(message), true) = (inner.failure.clone(), targeted) {
            return Err(ApiClientError::StoreError { status: 500, message });
        }
        Ok(inner)
    }
}

fn record_from(id: String, payload: &PhotoPayload) -> PhotoRecord {
    PhotoRecord {
        id,
        title: payload.title.clone(),
        description: payload.description.clone(),
        image_url: payload.image_url.clone(),
        price: payload.price,
        location: payload.location.clone(),
        date: payload.date,
        tags: payload.tags.clone(),
        status: payload.status,
        created_at: None,
        updated_at: None,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, status: Option<PhotoStatus>) -> Result<Vec<PhotoRecord>, ApiClientError> {
        let inner = self.enter("list")?;
        Ok(inner
            .records
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<PhotoRecord>, ApiClientError> {
        let inner = self.enter("get")?;
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, payload: &PhotoPayload) -> Result<PhotoRecord, ApiClientError> {
        let mut inner = self.enter("create")?;
        inner.next_id += 1;
        let record = record_from(inner.next_id.to_string(), payload);
        inner.records.insert(0, record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, payload: &PhotoPayload) -> Result<PhotoRecord, ApiClientError> {
        let mut inner = self.enter("update")?;
        let slot = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiClientError::NotFound(id.to_string()))?;
        *slot = record_from(id.to_string(), payload);
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiClientError> {
        let mut inner = self.enter("delete")?;
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        if inner.records.len() == before {
            return Err(ApiClientError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<PhotoRecord>, ApiClientError> {
        let inner = self.enter("search")?;
        let needle = query.to_lowercase();
        Ok(inner
            .records
            .iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r
                        .description
                        .as_deref()
                        .map_or(false, |d| d.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FileStorage for MemoryStore {
    async fn upload(&self, file: &ImageFile) -> Result<UploadedFile, ApiClientError> {
        api_client::validate_image(file)?;
        let mut inner = self.enter("upload")?;
        let path = format!("photo_{}.{}", inner.uploads.len() + 1, file.extension());
        inner.uploads.push(path.clone());
        Ok(UploadedFile {
            public_url: format!("https://storage.example.com/photography/{}", path),
            path,
            size: file.size(),
            mime_type: file.mime_type.clone(),
        })
    }

    async fn remove(&self, path: &str) -> Result<(), ApiClientError> {
        let mut inner = self.enter("remove")?;
        inner.uploads.retain(|p| p != path);
        Ok(())
    }
}
