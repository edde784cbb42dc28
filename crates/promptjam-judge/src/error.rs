//! Error types for the judge adapter.
//!
//! Every variant here is absorbed by the fallback wrappers before it can
//! influence a room; nothing in this enum is ever shown to a client.

/// Errors that can occur while consulting the judge.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    /// The request body could not be serialized.
    #[error("failed to encode judge request: {0}")]
    Encode(#[from] serde_json::Error),

    /// The HTTP request failed outright (connect, timeout, TLS).
    #[error("judge request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("judge returned status {0}")]
    Status(reqwest::StatusCode),

    /// The response body didn't contain the structure we asked for:
    /// missing candidates, non-JSON ranking text, or an empty order.
    #[error("malformed judge response: {0}")]
    Malformed(String),
}
