//! cache_get tool implementation.
//!
//! Retrieves one cached response by partition and URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use senial_core::Error;
use senial_worker::ServiceWorker;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Partition name, e.g. "senial-static-v1.5.0".
    pub partition: String,

    /// Entry URL; paths resolve against the worker origin.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub partition: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_sha256: String,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &ServiceWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let request = worker.request("GET", &params.url)?;
    let db = worker.db();

    if !db.has_partition(&params.partition).await? {
        return Err(Error::PartitionNotFound(params.partition).into());
    }

    let entry = db
        .match_entry(&params.partition, request.cache_key())
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} {}", params.partition, request.url)))?;

    let output = CacheGetOutput {
        body: String::from_utf8_lossy(&entry.body).into_owned(),
        partition: entry.partition,
        url: entry.url,
        status: entry.status,
        content_type: entry.content_type,
        headers: entry.headers,
        body_sha256: entry.body_sha256,
        stored_at: entry.stored_at,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};
    use senial_core::StoredResponse;

    const PARTITION: &str = "senial-static-v1.5.0";

    #[tokio::test]
    async fn test_get_found_by_path() {
        let worker = worker("http://localhost:5000").await;
        let stored = StoredResponse::new("http://localhost:5000/static/app.css", 200, b"body{}".to_vec())
            .with_content_type("text/css");
        worker.db().put_entry(PARTITION, &stored).await.unwrap();

        let params = CacheGetParams { partition: PARTITION.into(), url: "/static/app.css".into() };
        let result: CacheGetOutput = output(&get_impl(&worker, params).await.unwrap());

        assert_eq!(result.url, "http://localhost:5000/static/app.css");
        assert_eq!(result.body, "body{}");
        assert_eq!(result.content_type.as_deref(), Some("text/css"));
        assert_eq!(result.body_sha256.len(), 64);
    }

    #[tokio::test]
    async fn test_get_missing_entry() {
        let worker = worker("http://localhost:5000").await;
        worker.db().open_partition(PARTITION).await.unwrap();

        let params = CacheGetParams { partition: PARTITION.into(), url: "/nope".into() };
        let err = get_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_missing_partition() {
        let worker = worker("http://localhost:5000").await;
        let params = CacheGetParams { partition: "senial-static-v0".into(), url: "/".into() };
        assert!(get_impl(&worker, params).await.is_err());
    }
}
