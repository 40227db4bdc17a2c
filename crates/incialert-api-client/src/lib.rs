//! Shared HTTP client for the Inci-Alert incident API.
//!
//! Provides a client holding a persisted bearer-token session, generic
//! GET/POST/PUT/DELETE helpers with uniform error translation, and domain methods
//! (incidents, auth, stats). The terminal dashboard uses this client directly.

pub mod api;
pub mod error;
pub mod media;
pub mod session;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use incialert_core::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use incialert_core::ClientConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use error::{ClientError, ClientResult};
pub use media::MediaUpload;
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use source::IncidentSource;

/// Whether a call sends the session's bearer token.
///
/// Public reads (incident listing, stats) never attach it, even when a token exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

/// Error body shape returned by the API on failure.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for the Inci-Alert API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> ClientResult<Self> {
        Self::with_timeout(
            base_url,
            session,
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        session: Session,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: Arc::new(session),
        })
    }

    /// Client from [`ClientConfig`]: base URL, timeout and token file location.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let session = Session::new(FileTokenStore::new(&config.token_path));
        Self::with_timeout(&config.api_url, session, config.http_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_token(&self, token: &str) {
        self.session.set_token(token);
    }

    pub fn clear_token(&self) {
        self.session.clear_token();
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    fn apply_auth(&self, request: RequestBuilder, access: Access) -> RequestBuilder {
        match (access, self.session.token()) {
            (Access::Authenticated, Some(token)) => {
                request.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token))
            }
            _ => request,
        }
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        request: RequestBuilder,
        access: Access,
    ) -> ClientResult<Response> {
        let request = self.apply_auth(request, access);
        tracing::debug!(
            method,
            path,
            authenticated = access == Access::Authenticated && self.session.token().is_some(),
            "Sending API request"
        );
        let response = request.send().await?;
        check_status(response).await
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        access: Access,
    ) -> ClientResult<T> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.send("GET", path, request, access).await?;
        decode_json(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        access: Access,
    ) -> ClientResult<T> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.send("POST", path, request, access).await?;
        decode_json(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        access: Access,
    ) -> ClientResult<T> {
        let request = self.client.post(self.build_url(path)).multipart(form);
        let response = self.send("POST", path, request, access).await?;
        decode_json(response).await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        access: Access,
    ) -> ClientResult<T> {
        let request = self.client.put(self.build_url(path)).json(body);
        let response = self.send("PUT", path, request, access).await?;
        decode_json(response).await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str, access: Access) -> ClientResult<()> {
        let request = self.client.delete(self.build_url(path));
        self.send("DELETE", path, request, access).await?;
        Ok(())
    }

    /// POST without a body, for endpoints whose response is irrelevant.
    async fn post_empty(&self, path: &str, access: Access) -> ClientResult<()> {
        let request = self.client.post(self.build_url(path));
        self.send("POST", path, request, access).await?;
        Ok(())
    }
}

/// Non-success statuses become [`ClientError::Api`] carrying the body's `error`
/// field, or `HTTP {status}` when the body has none or is not JSON.
async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    tracing::debug!(status = status.as_u16(), %message, "API request failed");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

// Re-export domain types for convenience.
pub use incialert_core::models::{
    AuthResponse, CategoryStats, Incident, IncidentQuery, IncidentUpdate, LocationStats,
    NewIncident, OverviewStats, ProfileResponse, TimelinePeriod, TimelineStats, User,
};
