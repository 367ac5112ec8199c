//! Wire transport behind the API client

use async_trait::async_trait;
use std::time::Duration;

use super::request::PendingRequest;
use crate::error::{ClientError, ClientResult};

/// Status and raw body of a response, success or not
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as JSON; empty or non-JSON bodies become null or a string
    pub fn json(&self) -> serde_json::Value {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::Value::Null;
        }
        serde_json::from_slice(&self.body).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&self.body).into_owned())
        })
    }
}

/// Sends one request and reports what came back.
///
/// Only failures where no response arrived are errors here; HTTP error
/// statuses are returned as ordinary responses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &PendingRequest) -> ClientResult<RawResponse>;
}

/// Production transport over reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("library-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &PendingRequest) -> ClientResult<RawResponse> {
        let mut builder = self.client.request(request.method.clone(), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ClientError::from_transport)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(ClientError::from_transport)?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
