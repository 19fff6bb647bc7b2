// src/fetch.rs
//! Shared HTTP fetch helper: auth, timeout, TLS escape hatch and bounded retry.

use metrics::counter;
use reqwest::{Client, Method, Response};
use std::fmt;
use std::time::Duration;

use crate::config::HttpSettings;
use crate::error::{CollectError, Result};
use crate::sources::SourceId;

/// How a request authenticates against its upstream.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Basic { username: String, password: String },
    Bearer(String),
    /// Vendor-specific header, e.g. Tenable's `X-ApiKeys`.
    Header { name: String, value: String },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => write!(f, "Basic({username}:***)"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Header { name, .. } => write!(f, "Header({name}: ***)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Source key used to label errors; `"http"` until set.
    pub source: &'static str,
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub auth: Auth,
    pub headers: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            source: "http",
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            auth: Auth::None,
            headers: Vec::new(),
            json: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            json: Some(body),
            ..Self::get(url)
        }
    }

    pub fn for_source(mut self, id: SourceId) -> Self {
        self.source = id.key();
        self
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Basic auth only when both parts are present; otherwise unauthenticated.
    pub fn basic_auth_opt(self, creds: Option<(&str, &str)>) -> Self {
        match creds {
            Some((u, p)) => self.auth(Auth::Basic {
                username: u.to_string(),
                password: p.to_string(),
            }),
            None => self,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }
}

/// Attempt budget and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Sleep after failed attempt `attempt` (1-based): `base_delay * attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.max(1)
    }

    /// Every sleep a fully failing fetch performs, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts.max(1)).map(|a| self.delay_after(a)).collect()
    }
}

impl From<&HttpSettings> for RetryPolicy {
    fn from(s: &HttpSettings) -> Self {
        Self {
            max_attempts: s.max_attempts.max(1),
            base_delay: s.retry_delay(),
        }
    }
}

/// A 2xx whose body could not be read, labelled with the requesting source.
fn body_error(req: &FetchRequest, cause: impl fmt::Display) -> CollectError {
    CollectError::parse(req.source, format!("reading body of {}: {cause}", req.url))
}

/// One client per run; cheap to share by reference across adapters.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        if !settings.verify_tls {
            tracing::debug!("TLS certificate verification disabled (VERIFY_SSL != true)");
        }
        let client = Client::builder()
            .user_agent(concat!("occ-collector/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout())
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|e| CollectError::config("http", format!("building client: {e}")))?;
        Ok(Self {
            client,
            retry: RetryPolicy::from(settings),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Return the response body, retrying transport and HTTP status failures.
    ///
    /// A 2xx whose body cannot be read is not retried.
    pub async fn fetch(&self, req: &FetchRequest) -> Result<String> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.send_once(req).await {
                Ok(resp) => {
                    return resp.text().await.map_err(|e| body_error(req, e));
                }
                Err(e) => {
                    tracing::warn!(
                        source = req.source,
                        url = %req.url,
                        attempt,
                        attempts,
                        error = %e,
                        "fetch attempt failed"
                    );
                    if attempt >= attempts {
                        return Err(CollectError::fetch(req.url.as_str(), attempt, e.to_string()));
                    }
                    counter!("occ_http_retries_total").increment(1);
                    tokio::time::sleep(self.retry.delay_after(attempt)).await;
                }
            }
        }
    }

    async fn send_once(&self, req: &FetchRequest) -> reqwest::Result<Response> {
        let mut rb = self.client.request(req.method.clone(), &req.url);
        if !req.query.is_empty() {
            rb = rb.query(&req.query);
        }
        rb = match &req.auth {
            Auth::None => rb,
            Auth::Basic { username, password } => rb.basic_auth(username, Some(password)),
            Auth::Bearer(token) => rb.bearer_auth(token),
            Auth::Header { name, value } => rb.header(name.as_str(), value.as_str()),
        };
        for (name, value) in &req.headers {
            rb = rb.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &req.json {
            rb = rb.json(body);
        }
        rb.send().await?.error_for_status()
    }
}
