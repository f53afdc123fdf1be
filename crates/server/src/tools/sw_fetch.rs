//! sw_fetch tool implementation.
//!
//! Offers a request to the worker. Intercepted requests go through the
//! routed caching strategy; everything else is fetched from the network
//! without touching the cache.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use senial_worker::{FetchOutcome, ResponseSource, Route, ServiceWorker};
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the worker origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET requests are intercepted.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL (also the cache key).
    pub url: String,
    pub method: String,
    /// Whether the worker answered the request itself.
    pub intercepted: bool,
    /// Classification and strategy the router picked.
    pub route: Route,
    pub status: u16,
    pub content_type: Option<String>,
    pub source: ResponseSource,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub bytes: usize,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = worker.request(&params.method, &params.url)?;
    let route = worker.route(&request);

    let (intercepted, response) = match worker.handle_fetch(&request).await {
        FetchOutcome::Respond { response, .. } => (true, response),
        FetchOutcome::Passthrough => (false, worker.network_fetch(&request).await?),
    };

    tracing::debug!(url = %request.url, intercepted, status = response.status, "sw_fetch");

    let output = SwFetchOutput {
        url: request.url.to_string(),
        method: request.method.to_string(),
        intercepted,
        route,
        status: response.status,
        content_type: response.content_type.clone(),
        source: response.source.clone(),
        body: response.text(),
        bytes: response.body.len(),
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};
    use senial_core::{AppConfig, CacheDb};
    use senial_worker::{Classification, OFFLINE_CONTENT, Strategy};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_fetch_intercepted_api_call() {
        let server = server().await;
        Mock::given(method("GET"))
            .and(path("/api/signals"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[1,2]"))
            .mount(&server)
            .await;
        let worker = worker(&server.uri()).await;
        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        let params = SwFetchParams { url: "/api/signals".into(), method: default_method() };
        let result: SwFetchOutput = output(&fetch_impl(&worker, params).await.unwrap());

        assert!(result.intercepted);
        assert_eq!(
            result.route,
            Route::Handle { classification: Classification::ApiCall, strategy: Strategy::NetworkFirst }
        );
        assert_eq!(result.status, 200);
        assert_eq!(result.body, "[1,2]");
        assert_eq!(result.source, ResponseSource::Network);
    }

    #[tokio::test]
    async fn test_fetch_passthrough_post() {
        let server = server().await;
        Mock::given(method("POST"))
            .and(path("/api/signals"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .mount(&server)
            .await;
        let worker = worker(&server.uri()).await;
        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        let params = SwFetchParams { url: "/api/signals".into(), method: "post".into() };
        let result: SwFetchOutput = output(&fetch_impl(&worker, params).await.unwrap());

        assert!(!result.intercepted);
        assert_eq!(result.route, Route::Ignore);
        assert_eq!(result.status, 201);
        assert_eq!(worker.db().entry_count("senial-dynamic-v1.5.0").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_offline_placeholder() {
        // nothing listens on the discard port
        let config = AppConfig {
            origin: "http://127.0.0.1:9".into(),
            static_assets: Vec::new(),
            cdn_assets: Vec::new(),
            ..Default::default()
        };
        let worker = ServiceWorker::from_app_config(&config, CacheDb::open_in_memory().await.unwrap()).unwrap();
        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        let params = SwFetchParams { url: "/reports".into(), method: default_method() };
        let result: SwFetchOutput = output(&fetch_impl(&worker, params).await.unwrap());

        assert!(result.intercepted);
        assert_eq!(result.status, 503);
        assert_eq!(result.body, OFFLINE_CONTENT);
        assert_eq!(result.source, ResponseSource::Offline);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let worker = worker("http://localhost:5000").await;
        let params = SwFetchParams { url: "   ".into(), method: default_method() };
        assert!(fetch_impl(&worker, params).await.is_err());
    }
}
