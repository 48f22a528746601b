//! Typed wrappers around the marketplace REST backend.
//!
//! Every call follows the same contract: build the URL, send it with the
//! session cookies, turn a non-2xx status into an [`ApiError`] carrying the
//! backend's message (or the operation's fallback text), and decode the
//! JSON body on success. Nothing retries or caches.

mod auth;
mod bids;
mod listings;
mod payments;
mod roles;
mod tours;

use std::{fmt, path::Path, sync::Arc, time::Duration};

use reqwest::{
    RequestBuilder, Response, Url,
    header::{COOKIE, HeaderMap, HeaderValue},
    multipart::Part,
};
use serde::{Serialize, de::DeserializeOwned};

pub use payments::PaymentRequest;

/// Tenant-side views of a single listing (availability, bid suggestions).
const TENANT_LISTINGS: &str = "/api/dashboard/tenant/listings";

use crate::{
    config::{AppConfig, NetworkConfig},
    error::{ApiError, ApiResult},
    traits::{MemoryStorage, SessionStorage},
};

/// A file picked for upload: title deed, Emirates ID, property photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    fn into_part(self) -> ApiResult<Part> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// API client for the marketplace backend. Cheap to clone; clones share the
/// connection pool, cookie jar and session storage.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    storage: Arc<dyn SessionStorage>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client with configurable timeouts.
    pub fn new(base_url: impl Into<String>, network_config: &NetworkConfig) -> ApiResult<Self> {
        Self::build(base_url.into(), network_config, None)
    }

    /// Create a client from the loaded configuration, attaching the
    /// configured session cookie to every request.
    pub fn from_config(config: &AppConfig) -> ApiResult<Self> {
        Self::build(
            config.api.base_url.clone(),
            &config.network,
            config.auth.session_cookie.as_deref(),
        )
    }

    fn build(
        base_url: String,
        network_config: &NetworkConfig,
        session_cookie: Option<&str>,
    ) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ApiError::InvalidRequest(format!("invalid session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            storage: Arc::new(MemoryStorage::new()),
        })
    }

    /// Replace the session storage cleared on logout.
    pub fn with_storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage(&self) -> &dyn SessionStorage {
        self.storage.as_ref()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `path` followed by `segments`, each percent-encoded as a single path
    /// segment, so an id can never point the request at another endpoint.
    pub(crate) fn endpoint(&self, path: &str, segments: &[&str]) -> ApiResult<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(ApiError::InvalidRequest(format!("invalid identifier {bad:?}")));
        }

        let mut url = Url::parse(&self.url(path))
            .map_err(|e| ApiError::InvalidRequest(format!("bad URL {path}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("bad URL {path}")))?
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send a request and decode its JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> ApiResult<T> {
        let response = request.send().await.map_err(ApiError::Transport)?;
        let response = check_status(response, fallback).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a request whose success body carries nothing the caller needs.
    pub(crate) async fn send_unit(&self, request: RequestBuilder, fallback: &str) -> ApiResult<()> {
        let response = request.send().await.map_err(ApiError::Transport)?;
        check_status(response, fallback).await?;
        Ok(())
    }
}

/// Append query parameters, encoded.
pub(crate) fn with_query(mut url: Url, query: &[(&str, &str)]) -> Url {
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    url
}

/// Pass 2xx responses through; turn anything else into [`ApiError::Status`].
pub(crate) async fn check_status(response: Response, fallback: &str) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let message = envelope_message(&body).unwrap_or_else(|| fallback.to_string());
    tracing::debug!(%status, %url, %message, "API request failed");

    Err(ApiError::Status { status, message })
}

/// Pull a human-readable message out of the backend's error envelope.
///
/// Accepts `{"message": "..."}`, `{"message": ["...", "..."]}`,
/// `{"error": "..."}` and `{"error": {"message": "..."}}`.
fn envelope_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let from = |v: &serde_json::Value| -> Option<String> {
        match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(|i| i.as_str()).collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
            _ => None,
        }
    };

    value
        .get("message")
        .and_then(from)
        .or_else(|| value.get("error").and_then(from))
        .or_else(|| value.pointer("/error/message").and_then(from))
}

/// Wire spelling of a serde enum value, for query parameters.
pub(crate) fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TourStatus;

    #[test]
    fn test_envelope_message_variants() {
        assert_eq!(
            envelope_message(r#"{"message": "Permit expired"}"#).as_deref(),
            Some("Permit expired")
        );
        assert_eq!(
            envelope_message(r#"{"message": ["price must be positive", "area is required"]}"#)
                .as_deref(),
            Some("price must be positive, area is required")
        );
        assert_eq!(
            envelope_message(r#"{"error": "Listing not found"}"#).as_deref(),
            Some("Listing not found")
        );
        assert_eq!(
            envelope_message(r#"{"error": {"message": "Slot taken"}}"#).as_deref(),
            Some("Slot taken")
        );
    }

    #[test]
    fn test_envelope_message_rejects_unusable_bodies() {
        assert!(envelope_message("").is_none());
        assert!(envelope_message("<html>Bad Gateway</html>").is_none());
        assert!(envelope_message(r#"{"message": ""}"#).is_none());
        assert!(envelope_message(r#"{"status": 500}"#).is_none());
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type_for("deed.PDF"), "application/pdf");
        assert_eq!(content_type_for("front.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("plan.png"), "image/png");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }

    #[test]
    fn test_wire_name_uses_serde_spelling() {
        assert_eq!(wire_name(&TourStatus::NoShow), "NO_SHOW");
    }

    #[test]
    fn test_api_client_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:3000/", &NetworkConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(
            client.url("/api/cognito/login"),
            "http://localhost:3000/api/cognito/login"
        );
    }

    #[test]
    fn test_query_values_are_encoded() {
        let client = ApiClient::new("http://localhost:3000", &NetworkConfig::default()).unwrap();
        let url = with_query(
            client.endpoint("/api/x", &[]).unwrap(),
            &[("date", "2026-02-14"), ("q", "a b")],
        );
        assert_eq!(url.as_str(), "http://localhost:3000/api/x?date=2026-02-14&q=a+b");
    }

    #[test]
    fn test_ids_stay_inside_one_path_segment() {
        let client = ApiClient::new("http://localhost:3000", &NetworkConfig::default()).unwrap();
        let url = client
            .endpoint("/api/dashboard/tenant/bids", &["88/../x", "history"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/dashboard/tenant/bids/88%2F..%2Fx/history"
        );
    }

    #[test]
    fn test_dot_segments_are_refused() {
        let client = ApiClient::new("http://localhost:3000", &NetworkConfig::default()).unwrap();
        for id in ["", ".", ".."] {
            assert!(matches!(
                client.endpoint("/api/dashboard/tenant/tours", &[id]),
                Err(ApiError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn test_rejects_unprintable_session_cookie() {
        let mut config = crate::config::AppConfig {
            api: Default::default(),
            network: Default::default(),
            auth: Default::default(),
            google: Default::default(),
            bidding: Default::default(),
            storage: Default::default(),
        };
        config.auth.session_cookie = Some("sid=abc\n".to_string());

        assert!(matches!(
            ApiClient::from_config(&config),
            Err(ApiError::InvalidRequest(_))
        ));
    }
}
