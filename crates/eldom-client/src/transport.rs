//! HTTP transport seam
//!
//! The protocol layer only needs "GET/POST with headers, fail on non-2xx".
//! [`HttpTransport`] implements that over reqwest; tests substitute
//! [`crate::testing::RecordingTransport`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{EldomClientError, Result};
use crate::types::ErrorResponse;

/// Request headers in the order they are sent
pub type Headers = Vec<(&'static str, String)>;

/// Minimal HTTP client used by the token provider and the protocol layer
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`, returning the body of a successful response
    async fn get(&self, url: Url, headers: Headers) -> Result<String>;

    /// POST `body` to `url`, returning the body of a successful response
    async fn post(&self, url: Url, headers: Headers, body: String) -> Result<String>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client (shares its connection pool)
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if status.is_success() {
            Ok(response.text().await?)
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    async fn extract_error_from_status(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> EldomClientError {
        let message = match response.json::<ErrorResponse>().await {
            Ok(err) => err
                .into_message()
                .unwrap_or_else(|| format!("HTTP {}", status)),
            Err(_) => format!("HTTP {}", status),
        };

        match status {
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => EldomClientError::Timeout,
            _ => EldomClientError::server_error(status.as_u16(), message),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url, headers: Headers) -> Result<String> {
        debug!("GET {}", url);
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn post(&self, url: Url, headers: Headers, body: String) -> Result<String> {
        debug!("POST {} ({} bytes)", url, body.len());
        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.body(body).send().await?;
        self.handle_response(response).await
    }
}
