//! Transport seam for the typed dispatcher.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::message::{Headers, Method, Request, Response};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("transport failure: {0}")]
    Failed(String),
}

/// Executes one request and yields the raw response. Implementations must
/// not retry; retry policy belongs to callers, never to the dispatch path.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response, TransportError>;
}

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: format!("repohub/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// reqwest-backed transport rooted at one server base URL.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, config: HttpConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| TransportError::Failed(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(TransportError::InvalidUrl("empty base URL".to_string()));
        }

        Ok(Self { client, base_url })
    }

    fn url_for(&self, request: &Request) -> String {
        format!("{}/{}", self.base_url, request.path_and_query())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let url = self.url_for(&request);
        debug!(method = %request.method(), %url, "executing request");

        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.bytes.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else if e.is_connect() {
                TransportError::Connect(e.to_string())
            } else if e.is_builder() {
                TransportError::InvalidUrl(e.to_string())
            } else {
                TransportError::Failed(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.append(name.as_str(), value);
            }
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| TransportError::Failed(format!("failed to read body: {e}")))?;

        debug!(%url, status, size = body_text.len(), "response received");

        Ok(Response {
            status,
            headers,
            body_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let transport =
            HttpTransport::new("http://localhost:8081/service/", HttpConfig::default()).unwrap();
        let request = Request::get("repositories/").build();
        assert_eq!(
            transport.url_for(&request),
            "http://localhost:8081/service/repositories/"
        );
    }

    #[test]
    fn query_survives_url_join() {
        let transport =
            HttpTransport::new("http://localhost:8081", HttpConfig::default()).unwrap();
        let request = Request::get("repository_statuses?forceCheck").build();
        assert_eq!(
            transport.url_for(&request),
            "http://localhost:8081/repository_statuses?forceCheck"
        );
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            HttpTransport::new("", HttpConfig::default()),
            Err(TransportError::InvalidUrl(_))
        ));
    }
}
