//! Outbound request description, kept around so it can be replayed

use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Where a request stands in the refresh-and-retry cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryState {
    /// Not yet rejected; a 401 may still trigger one refresh
    #[default]
    Fresh,
    /// Already replayed after a refresh; a 401 now goes to the caller
    Retried,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub method: Method,
    /// Absolute URL, base address included
    pub url: String,
    /// Path relative to the base address, as the caller gave it
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub retry: RetryState,
}

impl PendingRequest {
    pub fn new(method: Method, base_url: &str, path: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());

        Self {
            method,
            url: join_url(base_url, path),
            path: path.to_string(),
            headers,
            query: Vec::new(),
            body: None,
            retry: RetryState::Fresh,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn set_bearer(&mut self, token: &str) {
        self.headers
            .insert(AUTHORIZATION.to_string(), format!("Bearer {}", token));
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION).map(String::as_str)
    }

    /// Token carried in the bearer header, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.authorization().and_then(|h| h.strip_prefix("Bearer "))
    }

    pub fn is_retried(&self) -> bool {
        self.retry == RetryState::Retried
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Flatten a serializable struct or map into query pairs, dropping nulls
pub fn query_pairs(value: Value) -> Vec<(String, String)> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect(),
        _ => Vec::new(),
    }
}
