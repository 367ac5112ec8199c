//! Error types for the library client

use serde_json::Value;
use thiserror::Error;

/// Field names checked, in order, when pulling a display message out of an
/// error body.
const MESSAGE_KEYS: [&str; 4] = ["error", "detail", "non_field_errors", "message"];

/// Main client error type
#[derive(Error, Debug)]
pub enum ClientError {
    /// No response was received (DNS, connection refused, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Not authorized: {}", summarize(.0))]
    Unauthorized(Value),

    #[error("Forbidden: {}", summarize(.0))]
    Forbidden(Value),

    #[error("Not found: {}", summarize(.0))]
    NotFound(Value),

    /// Any other 4xx, usually carrying field-level messages
    #[error("Validation error ({status}): {}", summarize(.body))]
    Validation { status: u16, body: Value },

    #[error("Server error ({status}): {}", summarize(.body))]
    Server { status: u16, body: Value },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Session storage error: {0}")]
    Session(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ClientError {
    /// Categorize a non-success HTTP status with its decoded body
    pub fn from_status(status: u16, body: Value) -> Self {
        match status {
            401 => ClientError::Unauthorized(body),
            403 => ClientError::Forbidden(body),
            404 => ClientError::NotFound(body),
            400..=499 => ClientError::Validation { status, body },
            _ => ClientError::Server { status, body },
        }
    }

    /// Map a transport failure from reqwest
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// HTTP status for errors that carry one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Validation { status, .. } | ClientError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Decoded response body for errors that carry one
    pub fn body(&self) -> Option<&Value> {
        match self {
            ClientError::Unauthorized(body)
            | ClientError::Forbidden(body)
            | ClientError::NotFound(body)
            | ClientError::Validation { body, .. }
            | ClientError::Server { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Looks at `error`, `detail`, `non_field_errors` and `message` first,
    /// then the first field-level message as `field: message`. Array values
    /// contribute their first element.
    pub fn user_message(&self) -> String {
        self.body()
            .and_then(extract_message)
            .unwrap_or_else(|| self.to_string())
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

fn extract_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => MESSAGE_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(first_text))
            .or_else(|| {
                map.iter()
                    .find_map(|(field, value)| first_text(value).map(|msg| format!("{}: {}", field, msg)))
            }),
        _ => None,
    }
}

fn summarize(body: &Value) -> String {
    match body {
        Value::Null => "<empty body>".to_string(),
        other => extract_message(other).unwrap_or_else(|| other.to_string()),
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
