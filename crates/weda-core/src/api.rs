//! HTTP client for the Wedahamine backend.
//!
//! All requests go through [`ApiClient`], which owns the connection pool and
//! a process-wide default Authorization header. The header is set on login or
//! session restore and cleared on logout; individual call sites never manage
//! credentials themselves.

use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Standard User-Agent header for Wedahamine API requests.
pub const USER_AGENT: &str = concat!("weda/", env!("CARGO_PKG_VERSION"));

/// Categories of API errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection failure, DNS error, or request timeout
    Network,
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Response did not match the expected shape (missing field, bad JSON)
    Malformed,
    /// Rejected because another call to the same operation is in flight
    Busy,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Malformed => write!(f, "malformed"),
            ApiErrorKind::Busy => write!(f, "busy"),
        }
    }
}

/// Structured error from the API with kind and details.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates a network error from a transport failure.
    pub fn network(err: &reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Network, err.to_string())
    }

    /// Creates an HTTP status error.
    ///
    /// The backend reports failures as `{"message": "..."}`; when that shape
    /// is present the message is surfaced directly, otherwise the summary
    /// falls back to the bare status code and the raw body goes in details.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}");
        let details = if body.is_empty() {
            None
        } else {
            // Try to extract a cleaner error message from JSON
            if let Ok(json) = serde_json::from_str::<Value>(body)
                && let Some(msg) = json.get("message").and_then(|v| v.as_str())
            {
                return Self {
                    kind: ApiErrorKind::HttpStatus,
                    message: format!("HTTP {status}: {msg}"),
                    details: Some(body.to_string()),
                };
            }
            Some(body.to_string())
        };
        Self {
            kind: ApiErrorKind::HttpStatus,
            message,
            details,
        }
    }

    /// Creates a malformed-response error carrying the offending body.
    pub fn malformed(message: impl Into<String>, body: Option<&str>) -> Self {
        Self {
            kind: ApiErrorKind::Malformed,
            message: message.into(),
            details: body.map(ToString::to_string),
        }
    }

    /// Creates a busy error for a rejected concurrent call.
    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Busy, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Wedahamine API client.
///
/// Cheap to share behind an `Arc`; the underlying connection pool is reused
/// across all calls.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    auth_header: RwLock<Option<String>>,
}

impl ApiClient {
    /// Creates a new client for the given base URL.
    ///
    /// `base_url` must include the versioned API prefix and carry no trailing
    /// slash (see `Config::resolved_base_url`).
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            http,
            auth_header: RwLock::new(None),
        })
    }

    /// Returns the base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets the default Authorization header to `Bearer <token>`.
    ///
    /// Applies to every subsequent request until cleared.
    pub fn set_auth_header(&self, token: &str) {
        let mut guard = self
            .auth_header
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(format!("Bearer {token}"));
    }

    /// Clears the default Authorization header.
    pub fn clear_auth_header(&self) {
        let mut guard = self
            .auth_header
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// Returns the current default Authorization header value, if set.
    pub fn auth_header(&self) -> Option<String> {
        self.auth_header
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// GET a JSON resource.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or a body that
    /// does not parse as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.http.get(self.url(path));
        let response = self.send(request).await?;
        Self::parse_json(response).await
    }

    /// GET a JSON resource with query parameters.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or a body that
    /// does not parse as `T`.
    pub async fn get_json_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<T> {
        let request = self.http.get(self.url(path)).query(query);
        let response = self.send(request).await?;
        Self::parse_json(response).await
    }

    /// POST a JSON body and parse the JSON response.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or a body that
    /// does not parse as `T`.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.http.post(self.url(path)).json(body);
        let response = self.send(request).await?;
        Self::parse_json(response).await
    }

    /// POST a JSON body, discarding the response body.
    ///
    /// For endpoints whose success payload carries no information the client
    /// needs; only the status code is inspected.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-2xx status.
    pub async fn post_json_discard<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<()> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(request).await?;
        Ok(())
    }

    /// POST with query parameters and no body.
    ///
    /// Returns the response parsed as JSON when the body is valid JSON, or
    /// `None` when the server sent nothing useful back.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-2xx status.
    pub async fn post_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<Option<Value>> {
        let request = self.http.post(self.url(path)).query(query);
        let response = self.send(request).await?;
        let body = response.text().await.map_err(|err| ApiError::network(&err))?;
        Ok(serde_json::from_str(&body).ok())
    }

    /// PUT a JSON body and parse the JSON response.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or a body that
    /// does not parse as `T`.
    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.http.put(self.url(path)).json(body);
        let response = self.send(request).await?;
        Self::parse_json(response).await
    }

    /// DELETE a resource, discarding the response body.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-2xx status.
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let request = self.http.delete(self.url(path));
        self.send(request).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the default auth header (if set), sends, and maps non-2xx
    /// statuses to [`ApiError::http_status`].
    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let request = match self.auth_header() {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        };

        let response = request.send().await.map_err(|err| ApiError::network(&err))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("request failed with HTTP {}: {}", status.as_u16(), body);
            return Err(ApiError::http_status(status.as_u16(), &body));
        }

        Ok(response)
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let body = response.text().await.map_err(|err| ApiError::network(&err))?;
        serde_json::from_str(&body)
            .map_err(|err| ApiError::malformed(format!("Unexpected response: {err}"), Some(&body)))
    }
}
