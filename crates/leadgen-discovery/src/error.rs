use thiserror::Error;

/// Errors returned by discovery backends.
///
/// Only transport and configuration problems surface here. A response whose
/// text does not contain the expected payload is not an error; it degrades
/// to an empty or placeholder result instead.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {context}")]
    UnexpectedStatus { status: u16, context: String },

    /// The response envelope itself (not the model's text) could not be decoded.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}
