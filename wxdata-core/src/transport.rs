use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::{fmt::Debug, time::Duration};

use crate::error::{Error, Result, UpstreamFailure};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A GET request: URL plus header and query pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Self::default() }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Issues a single GET and decodes the body as JSON.
///
/// Implementations must fail with [`Error::Upstream`] on transport errors or
/// a non-2xx status. They never retry.
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn get_json(&self, request: &HttpRequest) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, request: &HttpRequest) -> Result<Value> {
        let mut builder = self.http.get(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let upstream = |failure| Error::Upstream { url: request.url.clone(), failure };

        let res = builder
            .send()
            .await
            .map_err(|e| upstream(UpstreamFailure::Transport(e.to_string())))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| upstream(UpstreamFailure::Transport(e.to_string())))?;

        if !status.is_success() {
            return Err(upstream(UpstreamFailure::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            }));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::MalformedResponse(format!("Body from {} is not valid JSON: {e}", request.url))
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
