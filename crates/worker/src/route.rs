//! Request classification.
//!
//! Every intercepted request is classified from its method and URL alone and
//! mapped to exactly one fetch strategy. Rules are checked in order and the
//! first match wins:
//!
//! | # | classification | matches | strategy |
//! |---|---|---|---|
//! | 1 | static asset | path under `/static/`, or `.css` `.js` `.ico` | cache-first |
//! | 2 | API call | path starts with `/api/`, contains `/ajax/`, or an `ajax` query parameter | network-first |
//! | 3 | image | `.png` `.jpg` `.jpeg` `.gif` `.svg` `.webp` | cache-first |
//! | 4 | CDN resource | host in the CDN allow-list | stale-while-revalidate |
//! | 5 | other | anything else | network-first |
//!
//! Non-GET requests and non-http(s) URLs are not intercepted.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use senial_core::AppConfig;

use crate::request::WorkerRequest;

static STATIC_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(css|js|ico)$").expect("static extension pattern"));

static IMAGE_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(png|jpe?g|gif|svg|webp)$").expect("image extension pattern"));

const STATIC_SEGMENT: &str = "/static/";
const API_PREFIX: &str = "/api/";
const AJAX_SEGMENT: &str = "/ajax/";
const AJAX_QUERY_KEY: &str = "ajax";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    StaticAsset,
    ApiCall,
    Image,
    CdnResource,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

/// Routing decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// Left to default network handling.
    Ignore,
    Handle { classification: Classification, strategy: Strategy },
}

impl Classification {
    pub fn strategy(self) -> Strategy {
        match self {
            Classification::StaticAsset | Classification::Image => Strategy::CacheFirst,
            Classification::CdnResource => Strategy::StaleWhileRevalidate,
            Classification::ApiCall | Classification::Other => Strategy::NetworkFirst,
        }
    }
}

/// Inputs to classification that depend on deployment.
#[derive(Debug, Clone)]
pub struct RouteRules {
    /// Lowercased CDN host names.
    pub cdn_hosts: Vec<String>,
}

impl RouteRules {
    pub fn new(cdn_hosts: impl IntoIterator<Item = String>) -> Self {
        Self { cdn_hosts: cdn_hosts.into_iter().map(|h| h.to_lowercase()).collect() }
    }

    /// Build rules from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.cdn_hosts.iter().cloned())
    }

    fn is_cdn_host(&self, url: &Url) -> bool {
        url.host_str()
            .map(|host| self.cdn_hosts.iter().any(|cdn| cdn.eq_ignore_ascii_case(host)))
            .unwrap_or(false)
    }
}

fn is_static_asset(url: &Url) -> bool {
    let path = url.path();
    path.contains(STATIC_SEGMENT) || STATIC_EXT.is_match(path)
}

fn is_api_call(url: &Url) -> bool {
    let path = url.path();
    path.starts_with(API_PREFIX)
        || path.contains(AJAX_SEGMENT)
        || url.query_pairs().any(|(key, _)| key == AJAX_QUERY_KEY)
}

fn is_image(url: &Url) -> bool {
    IMAGE_EXT.is_match(url.path())
}

/// Classify a URL that is known to be interceptable.
pub fn classify_url(url: &Url, rules: &RouteRules) -> Classification {
    if is_static_asset(url) {
        Classification::StaticAsset
    } else if is_api_call(url) {
        Classification::ApiCall
    } else if is_image(url) {
        Classification::Image
    } else if rules.is_cdn_host(url) {
        Classification::CdnResource
    } else {
        Classification::Other
    }
}

/// Decide how the worker handles a request.
pub fn classify(request: &WorkerRequest, rules: &RouteRules) -> Route {
    if request.method != Method::GET || !matches!(request.url.scheme(), "http" | "https") {
        return Route::Ignore;
    }
    let classification = classify_url(&request.url, rules);
    Route::Handle { classification, strategy: classification.strategy() }
}
