//! Network access for precaching and cache-miss passthrough
//!
//! The [`Fetcher`] trait is the only way the lifecycle touches the network,
//! so tests can substitute a recording fake. [`HttpFetcher`] is the real
//! implementation on top of the blocking `ureq` client, run on tokio's
//! blocking pool.

use crate::cache::{CachedResponse, Request};
use crate::error::{SiteCacheError, SiteCacheResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Default global timeout for a single request
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Issues requests to the network
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Send a request and return the response, whatever its status.
    ///
    /// Only transport failures are errors; a 404 is a normal response.
    async fn fetch(&self, request: &Request) -> SiteCacheResult<CachedResponse>;
}

/// HTTP fetcher backed by a shared `ureq` agent
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> SiteCacheResult<CachedResponse> {
        let agent = self.agent.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || send(&agent, &request))
            .await
            .map_err(|e| SiteCacheError::Internal(format!("fetch task failed: {}", e)))?
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(agent: &ureq::Agent, request: &Request) -> SiteCacheResult<CachedResponse> {
    let url = request.url.as_str();
    debug!("{} {}", request.method, url);

    let result = match request.method.as_str() {
        "GET" => with_headers(agent.get(url), &request.headers).call(),
        "HEAD" => with_headers(agent.head(url), &request.headers).call(),
        "DELETE" => with_headers(agent.delete(url), &request.headers).call(),
        "OPTIONS" => with_headers(agent.options(url), &request.headers).call(),
        "POST" => with_headers(agent.post(url), &request.headers).send(&request.body[..]),
        "PUT" => with_headers(agent.put(url), &request.headers).send(&request.body[..]),
        "PATCH" => with_headers(agent.patch(url), &request.headers).send(&request.body[..]),
        other => {
            return Err(SiteCacheError::network(
                url,
                format!("unsupported method {}", other),
            ))
        }
    };

    let mut response = result.map_err(|e| SiteCacheError::network(url, e))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| SiteCacheError::network(url, e))?;

    debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());
    Ok(CachedResponse {
        status,
        headers,
        body,
    })
}
