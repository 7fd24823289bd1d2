//! Session authentication against the hosted backend.
//!
//! Admin actions need a signed-in session; the gallery itself only uses the
//! anonymous key. Sessions are kept in the system keyring by default, or in
//! `~/.folio/session.json` when [`USE_FILE_STORE_ENV`] is set.

use chrono::{DateTime, Utc};
use keyring::Entry;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

const KEYRING_SERVICE_NAME: &str = "Folio";
const KEYRING_SESSION_KEY: &str = "session";
pub const USE_FILE_STORE_ENV: &str = "FOLIO_USE_FILE_STORE";
/// Sessions this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Keyring Error: {0}")]
    Keyring(String),
    #[error("Request Error: {0}")]
    Request(String),
    #[error("Auth Error ({status}): {message}")]
    Service { status: u16, message: String },
    #[error("Session Storage Error: {0}")]
    Storage(String),
    #[error("Other Error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl SessionUser {
    pub fn display_name(&self) -> String {
        self.user_metadata
            .get("name")
            .and_then(|n| n.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| "Administrator".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp, seconds.
    pub expires_at: i64,
    pub user: SessionUser,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at - EXPIRY_MARGIN_SECS
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: SessionUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| now.timestamp() + self.expires_in.unwrap_or(3600));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

async fn auth_error(response: reqwest::Response) -> AuthError {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = serde_json::from_str::<AuthErrorBody>(&text)
        .ok()
        .and_then(|b| b.error_description.or(b.msg).or(b.message))
        .unwrap_or(text);
    AuthError::Service { status, message }
}

/// Where a signed-in session survives between runs.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, AuthError>;
    fn save(&self, session: &Session) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

pub struct KeyringStore;

impl KeyringStore {
    fn entry() -> Result<Entry, AuthError> {
        Entry::new(KEYRING_SERVICE_NAME, KEYRING_SESSION_KEY)
            .map_err(|e| AuthError::Keyring(e.to_string()))
    }
}

impl SessionStore for KeyringStore {
    fn load(&self) -> Result<Option<Session>, AuthError> {
        match Self::entry()?.get_password() {
            Ok(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| AuthError::Storage(e.to_string())),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AuthError::Keyring(e.to_string())),
        }
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        let raw = serde_json::to_string(session).map_err(|e| AuthError::Storage(e.to_string()))?;
        Self::entry()?
            .set_password(&raw)
            .map_err(|e| AuthError::Keyring(e.to_string()))
    }

    fn clear(&self) -> Result<(), AuthError> {
        match Self::entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AuthError::Keyring(e.to_string())),
        }
    }
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        FileStore { path }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".folio")
            .join("session.json")
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Option<Session>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| AuthError::Storage(e.to_string()))?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(session).map_err(|e| AuthError::Storage(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| AuthError::Storage(e.to_string()))
    }

    fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    session: Mutex<Option<Session>>,
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<Session>, AuthError> {
        self.session
            .lock()
            .map(|s| s.clone())
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        let mut slot = self.session.lock().map_err(|e| AuthError::Storage(e.to_string()))?;
        *slot = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut slot = self.session.lock().map_err(|e| AuthError::Storage(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// Keyring unless the file store was requested through the environment.
pub fn default_store() -> Box<dyn SessionStore> {
    if std::env::var(USE_FILE_STORE_ENV).is_ok() {
        Box::new(FileStore::new(FileStore::default_path()))
    } else {
        Box::new(KeyringStore)
    }
}

pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    store: Box<dyn SessionStore>,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, store: Box<dyn SessionStore>) -> Self {
        let base_url: String = base_url.into();
        AuthClient {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            store,
        }
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        Ok(token.into_session(Utc::now()))
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, password)))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "sign in failed");
                e
            })?;
        self.store.save(&session)?;
        tracing::info!(user = %session.user.email.as_deref().unwrap_or(&session.user.id), "signed in");
        Ok(session)
    }

    /// The stored session, refreshed when it is about to expire.
    /// A session that cannot be refreshed is discarded.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let session = match self.store.load()? {
            Some(s) => s,
            None => return Ok(None),
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        let refresh_token = match &session.refresh_token {
            Some(t) => t.clone(),
            None => {
                self.store.clear()?;
                return Ok(None);
            }
        };
        match self
            .token_grant(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await
        {
            Ok(fresh) => {
                self.store.save(&fresh)?;
                tracing::debug!("session refreshed");
                Ok(Some(fresh))
            }
            Err(e) => {
                tracing::warn!(error = %e, "session refresh failed, signing out");
                self.store.clear()?;
                Ok(None)
            }
        }
    }

    /// Revoke the remote session and forget the local one. A failed revoke
    /// is logged; the local session is cleared regardless.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = self.store.load()? {
            let url = format!("{}/auth/v1/logout", self.base_url);
            let result = self
                .client
                .post(&url)
                .header("apikey", &self.api_key)
                .header(AUTHORIZATION, format!("Bearer {}", session.access_token))
                .send()
                .await;
            match result {
                Ok(r) if r.status().is_success() => {}
                Ok(r) => tracing::warn!(status = r.status().as_u16(), "remote sign out rejected"),
                Err(e) => tracing::warn!(error = %e, "remote sign out failed"),
            }
        }
        self.store.clear()?;
        tracing::info!("signed out");
        Ok(())
    }
}
