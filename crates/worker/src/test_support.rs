//! Scripted `Fetcher` for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, header};
use tokio::sync::Semaphore;

use senial_core::{CacheDb, CacheNames, Error};

use crate::fetch::{FetchResponse, Fetcher};
use crate::request::WorkerRequest;
use crate::strategy::StrategyContext;

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: Vec<u8>, content_type: Option<String> },
    Fail,
}

/// Answers fetches from a fixed table and records every call.
///
/// Unknown URLs fail like an unreachable network. An optional gate holds
/// each fetch until a permit is added.
#[derive(Debug, Default)]
pub struct StubFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.set(url, Reply::Respond { status, body: body.as_bytes().to_vec(), content_type: None });
        self
    }

    pub fn respond_typed(self, url: &str, status: u16, body: &str, content_type: &str) -> Self {
        self.set(
            url,
            Reply::Respond { status, body: body.as_bytes().to_vec(), content_type: Some(content_type.to_string()) },
        );
        self
    }

    pub fn fail(self, url: &str) -> Self {
        self.set(url, Reply::Fail);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn set(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &WorkerRequest) -> Result<FetchResponse, Error> {
        let key = request.cache_key().to_string();
        self.calls.lock().unwrap().push(key.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let reply = self.replies.lock().unwrap().get(&key).cloned().unwrap_or(Reply::Fail);
        match reply {
            Reply::Respond { status, body, content_type } => {
                let mut headers = header::HeaderMap::new();
                if let Some(ct) = &content_type {
                    headers.insert(header::CONTENT_TYPE, ct.parse().unwrap());
                }
                Ok(FetchResponse {
                    url: request.url.clone(),
                    final_url: request.url.clone(),
                    status: StatusCode::from_u16(status).unwrap(),
                    content_type,
                    bytes: Bytes::from(body),
                    headers,
                    fetch_ms: 0,
                })
            }
            Reply::Fail => Err(Error::Network(format!("{key}: connection refused"))),
        }
    }
}

pub fn names() -> CacheNames {
    CacheNames::new("senial", "1.5.0")
}

pub async fn context(fetcher: Arc<StubFetcher>) -> StrategyContext {
    let db = CacheDb::open_in_memory().await.unwrap();
    StrategyContext::new(db, fetcher, names())
}

/// Poll `check` until it holds or a two-second budget runs out.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}
