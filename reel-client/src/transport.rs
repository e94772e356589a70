//! Request/response transport
//!
//! A [`Transport`] performs exactly one exchange against the queue and
//! returns the parsed JSON body or a typed [`ClientError`]. It never
//! retries; the worker's next poll cycle is the retry.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{ClientError, Result};

/// A single POST request against the queue
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// Path relative to the transport's base URL (e.g. "next-job")
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl Exchange {
    /// Creates a POST exchange without body
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Adds a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the JSON body
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }
}

/// One request/response exchange against the remote queue
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the exchange and returns the parsed JSON body
    ///
    /// # Errors
    /// - [`ClientError::RequestFailed`] when no response was received
    /// - [`ClientError::ApiError`] on a non-success status code
    /// - [`ClientError::ParseError`] when the body is not JSON
    async fn exchange(&self, exchange: Exchange) -> Result<JsonValue>;
}

/// reqwest-backed transport
///
/// Default headers (content type, authentication token) are supplied by
/// the caller and attached to every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL of the queue (e.g., "https://queue.example.com/exec")
    base_url: String,
    /// HTTP client instance
    client: Client,
    headers: HeaderMap,
}

impl HttpTransport {
    /// Create a new transport sending JSON to `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new transport with a custom HTTP client
    ///
    /// This allows configuring timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            headers,
        }
    }

    /// Adds a header sent with every exchange
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::InvalidRequest(format!("header name '{}': {}", name, e)))?;
        let mut value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::InvalidRequest(format!("header '{}': {}", name, e)))?;
        if name == AUTHORIZATION {
            value.set_sensitive(true);
        }
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds an `Authorization: Bearer` header sent with every exchange
    pub fn with_bearer_token(self, token: &str) -> Result<Self> {
        self.with_header(AUTHORIZATION.as_str(), &format!("Bearer {}", token))
    }

    /// Get the base URL of the queue
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the headers attached to every exchange
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Checks the status code and parses the body as JSON
    async fn handle_response(&self, response: reqwest::Response) -> Result<JsonValue> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, exchange: Exchange) -> Result<JsonValue> {
        let url = format!("{}/{}", self.base_url, exchange.path.trim_start_matches('/'));
        debug!(%url, "Sending request");

        let mut request = self.client.post(&url).headers(self.headers.clone());

        if !exchange.query.is_empty() {
            request = request.query(&exchange.query);
        }
        if let Some(body) = &exchange.body {
            request = request.body(body.to_string());
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }
}
