//! Request and response descriptors exchanged with the worker.

use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use senial_core::{CacheEntry, StoredResponse};

use crate::fetch::{FetchResponse, UrlError, resolve};

/// Body of the placeholder returned by cache-first style strategies.
pub const OFFLINE_RESOURCE: &str = "Offline - Resource not available";

/// Body of the placeholder returned by network-first.
pub const OFFLINE_CONTENT: &str = "Offline - Content not available";

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRequest {
    pub method: Method,
    pub url: Url,
}

impl WorkerRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Build a request from page input, resolving relative paths against the
    /// worker origin.
    ///
    /// URLs with schemes the worker cannot fetch are still accepted so the
    /// router can leave them to the network.
    pub fn parse(method: Method, input: &str, origin: &Url) -> Result<Self, UrlError> {
        match resolve(input, origin) {
            Ok(url) => Ok(Self::new(method, url)),
            Err(UrlError::UnsupportedScheme(_)) => {
                let url = Url::parse(input.trim()).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
                Ok(Self::new(method, url))
            }
            Err(e) => Err(e),
        }
    }

    /// Cache key for this request.
    pub fn cache_key(&self) -> &str {
        self.url.as_str()
    }
}

/// Where a response came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache { partition: String },
    /// Synthesized because neither cache nor network could answer.
    Offline,
}

/// A response handed back to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl WorkerResponse {
    /// Plain-text 503 placeholder.
    pub fn offline(message: &'static str) -> Self {
        Self {
            status: 503,
            content_type: Some("text/plain".to_string()),
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: Bytes::from_static(message.as_bytes()),
            source: ResponseSource::Offline,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl From<FetchResponse> for WorkerResponse {
    fn from(response: FetchResponse) -> Self {
        let headers = response.header_pairs();
        Self {
            status: response.status.as_u16(),
            content_type: response.content_type,
            headers,
            body: response.bytes,
            source: ResponseSource::Network,
        }
    }
}

impl From<CacheEntry> for WorkerResponse {
    fn from(entry: CacheEntry) -> Self {
        Self {
            status: entry.status,
            content_type: entry.content_type,
            headers: entry.headers,
            body: Bytes::from(entry.body),
            source: ResponseSource::Cache { partition: entry.partition },
        }
    }
}

/// Snapshot of a network response for storage under the request key.
pub fn to_stored(request: &WorkerRequest, response: &FetchResponse) -> StoredResponse {
    let stored = StoredResponse::new(request.cache_key(), response.status.as_u16(), response.bytes.to_vec())
        .with_headers(response.header_pairs());
    match &response.content_type {
        Some(content_type) => stored.with_content_type(content_type.clone()),
        None => stored,
    }
}
