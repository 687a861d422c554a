//! PostgREST client for the PocketGear catalog store
//!
//! A small, builder-style client for the subset of the PostgREST wire
//! protocol the catalog needs.
//!
//! # Features
//!
//! - Reads (`select`, `eq`, `order`, `limit`)
//! - Inserts returning the stored representation
//! - Exact row counts through `Content-Range`
//! - Schema profiles (`Accept-Profile` / `Content-Profile`)
//! - Reachability probe for connection establishment

use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_RANGE};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use url::Url;

/// PostgreSQL error code reported for unique constraint violations.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Error body returned by PostgREST for failed requests
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostgrestApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for PostgrestApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum PostgrestError {
    #[error("API error: {details} (Status: {status})")]
    ApiError {
        details: PostgrestApiErrorDetails,
        status: StatusCode,
    },

    #[error("API error (unparsed): {message} (Status: {status})")]
    UnparsedApiError { message: String, status: StatusCode },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl PostgrestError {
    /// True when the server rejected a write because of a unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            PostgrestError::ApiError { details, .. } => {
                details.code.as_deref() == Some(UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// PostgREST client bound to one table
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: String,
    api_key: String,
    table: String,
    http_client: Client,
    headers: HashMap<String, String>,
    query_params: HashMap<String, String>,
}

impl PostgrestClient {
    /// Create a client for `table` under `{base_url}/rest/v1`
    pub fn new(base_url: &str, api_key: &str, table: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            http_client,
            headers: HashMap::new(),
            query_params: HashMap::new(),
        }
    }

    /// Add a header sent with every request of this client
    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self, PostgrestError> {
        HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header name: {}", key))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header value: {}", value))
        })?;
        self.headers.insert(key.to_string(), value.to_string());
        Ok(self)
    }

    /// Set the bearer token
    pub fn with_auth(self, token: &str) -> Result<Self, PostgrestError> {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    /// Target a schema other than the server default.
    ///
    /// Reads use `Accept-Profile`, writes use `Content-Profile`.
    pub fn schema(self, schema_name: &str) -> Result<Self, PostgrestError> {
        self.with_header("Accept-Profile", schema_name)?
            .with_header("Content-Profile", schema_name)
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.query_params
            .insert("select".to_string(), columns.to_string());
        self
    }

    /// Equality filter
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.query_params
            .insert(column.to_string(), format!("eq.{}", value));
        self
    }

    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.query_params.insert(
            "order".to_string(),
            format!("{}.{}", column, order.as_str()),
        );
        self
    }

    pub fn limit(mut self, count: u32) -> Self {
        self.query_params
            .insert("limit".to_string(), count.to_string());
        self
    }

    /// Fetch the matching rows
    pub async fn execute<T: for<'de> Deserialize<'de>>(&self) -> Result<Vec<T>, PostgrestError> {
        let url = self.build_url()?;
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .headers(self.request_headers(None)?)
            .send()
            .await?;

        let response = ensure_success(response).await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
    }

    /// Insert `values` and return the stored representation
    pub async fn insert<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        let url = self.build_url()?;
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .headers(self.request_headers(Some("return=representation"))?)
            .json(&values)
            .send()
            .await?;

        let response = ensure_success(response).await?;

        let body_text = response.text().await.map_err(|e| {
            PostgrestError::DeserializationError(format!("Failed to read response body: {}", e))
        })?;

        if body_text.trim().is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_str::<Value>(&body_text)
                .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
        }
    }

    /// Count the matching rows without transferring them
    pub async fn count_exact(&self) -> Result<u64, PostgrestError> {
        let url = self.build_url()?;
        debug!("HEAD {}", url);

        let response = self
            .http_client
            .head(&url)
            .headers(self.request_headers(Some("count=exact"))?)
            .send()
            .await?;

        let response = ensure_success(response).await?;

        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                PostgrestError::DeserializationError("Missing Content-Range header".to_string())
            })?;

        parse_content_range_total(range)
    }

    /// Check that the PostgREST root answers with a success status
    pub async fn ping(&self) -> Result<(), PostgrestError> {
        let url = format!("{}/rest/v1/", self.base_url);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .headers(self.request_headers(None)?)
            .send()
            .await?;

        ensure_success(response).await.map(|_| ())
    }

    fn build_url(&self) -> Result<String, PostgrestError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, self.table))?;

        for (key, value) in &self.query_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url.to_string())
    }

    fn request_headers(&self, prefer: Option<&str>) -> Result<HeaderMap, PostgrestError> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let api_key = HeaderValue::from_str(&self.api_key).map_err(|_| {
            PostgrestError::InvalidParameters("API key is not a valid header value".to_string())
        })?;
        headers.insert("apikey", api_key);

        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                PostgrestError::InvalidParameters(format!("Invalid header name: {}", key))
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                PostgrestError::InvalidParameters(format!("Invalid header value: {}", value))
            })?;
            headers.insert(name, value);
        }

        if let Some(prefer) = prefer {
            headers.insert(
                HeaderName::from_static("prefer"),
                HeaderValue::from_str(prefer).map_err(|_| {
                    PostgrestError::InvalidParameters(format!("Invalid Prefer value: {}", prefer))
                })?,
            );
        }

        Ok(headers)
    }
}

async fn ensure_success(response: Response) -> Result<Response, PostgrestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());

    match serde_json::from_str::<PostgrestApiErrorDetails>(&error_text) {
        Ok(details) => Err(PostgrestError::ApiError { details, status }),
        Err(_) => Err(PostgrestError::UnparsedApiError {
            message: error_text,
            status,
        }),
    }
}

// `0-24/25` or `*/0`
fn parse_content_range_total(range: &str) -> Result<u64, PostgrestError> {
    range
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            PostgrestError::DeserializationError(format!("Unexpected Content-Range: {}", range))
        })
}
