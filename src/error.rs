use thiserror::Error;

/// Network-level failure reaching the upstream API.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("failed reading body from {url}: {message}")]
    Body { url: String, message: String },
}

/// Payload that does not match the expected record shape.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty {what} payload")]
    Empty { what: &'static str },

    #[error("invalid {what} json: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },
}
