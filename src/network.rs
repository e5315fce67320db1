//! Network capability
//!
//! `Network` is what the cache manager falls back to on a cache miss.
//! Transport failures are errors; HTTP error statuses are ordinary
//! responses so the manager can decide whether to cache them.

use crate::config::schema::NetworkConfig;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::http::{Method, Origin, Request, Response, ResponseType};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use ureq::ResponseExt;

/// Issue a request and return the response; no retries, no caching
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> ShellCacheResult<Response>;
}

/// `Network` backed by a blocking `ureq` agent run on the blocking pool
#[derive(Clone)]
pub struct HttpNetwork {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpNetwork {
    pub fn new(config: &NetworkConfig) -> Self {
        let timeout = match config.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .into();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }

    fn send_blocking(
        agent: &ureq::Agent,
        user_agent: &str,
        request: &Request,
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = request.url.to_string();
        let url = url.as_str();
        let body = request.body.as_deref().unwrap_or_default();

        match request.method {
            Method::Get => with_headers(agent.get(url), user_agent, request).call(),
            Method::Head => with_headers(agent.head(url), user_agent, request).call(),
            Method::Options => with_headers(agent.options(url), user_agent, request).call(),
            Method::Delete => with_headers(agent.delete(url), user_agent, request).call(),
            Method::Post => with_headers(agent.post(url), user_agent, request).send(body),
            Method::Put => with_headers(agent.put(url), user_agent, request).send(body),
            Method::Patch => with_headers(agent.patch(url), user_agent, request).send(body),
        }
    }

    fn into_response(
        request: &Request,
        mut response: ureq::http::Response<ureq::Body>,
    ) -> ShellCacheResult<Response> {
        let requested = request.url.to_string();
        let final_uri = response.get_uri().clone();
        let final_url = final_uri.to_string();

        let same_origin = Origin::of(&request.url)
            .map(|origin| origin.contains(&final_uri))
            .unwrap_or(false);
        let kind = if same_origin {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        };

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let status = response.status().as_u16();
        let body = if request.method == Method::Head {
            Vec::new()
        } else {
            // Whole body; ureq otherwise stops at 10 MB
            response
                .body_mut()
                .with_config()
                .limit(u64::MAX)
                .read_to_vec()
                .map_err(|e| ShellCacheError::network(&requested, e.to_string()))?
        };

        Ok(Response {
            status,
            headers,
            body,
            kind,
            redirected: final_url != requested,
            url: final_url,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    user_agent: &str,
    request: &Request,
) -> ureq::RequestBuilder<B> {
    builder = builder.header("user-agent", user_agent);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> ShellCacheResult<Response> {
        debug!("Network fetch: {} {}", request.method, request.url);

        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || {
            let response = Self::send_blocking(&agent, &user_agent, &request)
                .map_err(|e| ShellCacheError::network(request.url.to_string(), e.to_string()))?;
            Self::into_response(&request, response)
        })
        .await
        .map_err(|e| ShellCacheError::Internal(format!("network task failed: {}", e)))?
    }
}
