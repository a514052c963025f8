//! Client for a hosted PocketBase-style record backend.
//!
//! Independent of the local store: nothing here reads or writes the
//! `BirthdayMap`. List and create require a valid session and fail before
//! touching the network without one.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use url::Url;

/// Collection holding user accounts
pub const USERS_COLLECTION: &str = "users";
/// Collection holding birthday records
pub const BIRTHDAYS_COLLECTION: &str = "birthdays";
/// Field the birthdays collection is listed by
pub const BIRTHDAY_SORT: &str = "birthday";

const PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Missing, expired or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend refused the submitted fields.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Network failure or an unexpected response.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token:   String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email:   Option<String>,
}

#[derive(Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

impl Session {
    /// Expiry (unix seconds) carried in the token, if it has one.
    pub fn expires_at(&self) -> Option<i64> {
        self.claims().and_then(|claims| claims.exp)
    }

    /// A token is valid when its payload decodes and any expiry lies after `now`.
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.claims()
            .is_some_and(|claims| claims.exp.is_none_or(|exp| exp > now))
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(chrono::Utc::now().timestamp())
    }

    fn claims(&self) -> Option<TokenClaims> {
        let payload = self.token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// A record from the hosted birthdays collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBirthday {
    pub id:       String,
    pub name:     String,
    pub birthday: String,
    #[serde(default)]
    pub user:     String,
}

#[derive(Deserialize)]
struct AuthResponse {
    token:  String,
    record: AuthRecord,
}

#[derive(Deserialize)]
struct AuthRecord {
    id:    String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage<T> {
    page:        u32,
    total_pages: u32,
    items:       Vec<T>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct RemoteClient {
    client:  reqwest::Client,
    base:    Url,
    session: Option<Session>,
}

impl RemoteClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    /// Returns `RemoteError::InvalidUrl` for an unparsable URL and
    /// `RemoteError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let mut base = Url::parse(base_url)?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(timeout);
        #[cfg(target_arch = "wasm32")]
        let _ = timeout;
        let client = builder.build()?;

        Ok(Self {
            client,
            base,
            session: None,
        })
    }

    #[must_use]
    pub fn with_session(mut self, session: Option<Session>) -> Self {
        self.session = session;
        self
    }

    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_valid)
    }

    /// Drops the current session.
    pub fn logout(&mut self) {
        if self.session.take().is_some() {
            log::info!("Logged out of {}", self.base);
        }
    }

    /// Signs in with a password and keeps the resulting session.
    ///
    /// # Errors
    /// Returns `RemoteError::Unauthorized` for bad credentials and
    /// `RemoteError::Transport` for network or response failures.
    pub async fn authenticate(
        &mut self,
        identity: &str,
        password: &str,
    ) -> Result<&Session, RemoteError> {
        let url = self.collection_url(USERS_COLLECTION, "auth-with-password")?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "identity": identity, "password": password }))
            .send()
            .await?;
        let auth: AuthResponse = read_json(response).await?;

        log::info!("Authenticated as {identity}");
        Ok(self.session.insert(Session {
            token:   auth.token,
            user_id: auth.record.id,
            email:   auth.record.email,
        }))
    }

    /// Creates a user account. Does not sign in.
    ///
    /// # Errors
    /// Returns `RemoteError::Validation` if the backend rejects the fields.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<Value, RemoteError> {
        let url = self.collection_url(USERS_COLLECTION, "records")?;
        let response = self
            .client
            .post(url)
            .json(&json!({
                "email": email,
                "password": password,
                "passwordConfirm": password_confirm,
            }))
            .send()
            .await?;
        read_json(response).await
    }

    /// Fetches every record of `collection` ordered by `sort`, following all pages.
    ///
    /// # Errors
    /// Returns `RemoteError::Unauthorized` without a valid session, otherwise
    /// any backend or transport failure.
    pub async fn list_records<T: DeserializeOwned>(
        &self,
        collection: &str,
        sort: &str,
    ) -> Result<Vec<T>, RemoteError> {
        let session = self.require_session()?;
        let url = self.collection_url(collection, "records")?;

        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let response = self
                .client
                .get(url.clone())
                .header(AUTHORIZATION, &session.token)
                .query(&[
                    ("sort", sort.to_owned()),
                    ("page", page.to_string()),
                    ("perPage", PAGE_SIZE.to_string()),
                ])
                .send()
                .await?;
            let batch: ListPage<T> = read_json(response).await?;
            items.extend(batch.items);
            if batch.page >= batch.total_pages {
                break;
            }
            page = batch.page + 1;
        }

        log::debug!("Fetched {} records from {collection}", items.len());
        Ok(items)
    }

    /// Creates a record in `collection`.
    ///
    /// # Errors
    /// Returns `RemoteError::Unauthorized` without a valid session,
    /// `RemoteError::Validation` if the backend rejects the fields, otherwise
    /// a transport failure.
    pub async fn create_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
    ) -> Result<T, RemoteError> {
        let session = self.require_session()?;
        let url = self.collection_url(collection, "records")?;
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, &session.token)
            .json(fields)
            .send()
            .await?;
        read_json(response).await
    }

    /// All birthdays in the hosted collection, ordered by date.
    ///
    /// # Errors
    /// See [`RemoteClient::list_records`].
    pub async fn list_birthdays(&self) -> Result<Vec<RemoteBirthday>, RemoteError> {
        self.list_records(BIRTHDAYS_COLLECTION, BIRTHDAY_SORT).await
    }

    /// Adds a birthday owned by the signed-in user.
    ///
    /// # Errors
    /// See [`RemoteClient::create_record`].
    pub async fn create_birthday(
        &self,
        name: &str,
        birthday: &str,
    ) -> Result<RemoteBirthday, RemoteError> {
        let session = self.require_session()?;
        let mut fields = Map::new();
        fields.insert("name".to_owned(), Value::from(name));
        fields.insert("birthday".to_owned(), Value::from(birthday));
        fields.insert("user".to_owned(), Value::from(session.user_id.as_str()));
        self.create_record(BIRTHDAYS_COLLECTION, &fields).await
    }

    fn require_session(&self) -> Result<&Session, RemoteError> {
        match &self.session {
            Some(session) if session.is_valid() => Ok(session),
            Some(_) => Err(RemoteError::Unauthorized("session expired".to_owned())),
            None => Err(RemoteError::Unauthorized("not signed in".to_owned())),
        }
    }

    fn collection_url(&self, collection: &str, action: &str) -> Result<Url, RemoteError> {
        Ok(self
            .base
            .join(&format!("api/collections/{collection}/{action}"))?)
    }
}

/// Maps a failed response to the error taxonomy.
pub fn classify_status(status: StatusCode, message: String) -> RemoteError {
    match status {
        StatusCode::BAD_REQUEST => RemoteError::Validation(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized(message),
        _ => RemoteError::Transport(format!("{status}: {message}")),
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| RemoteError::Transport(format!("unreadable response: {e}")));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body).map_or(body, |b| b.message);
    log::warn!("Backend answered {status}: {message}");
    Err(classify_status(status, message))
}
