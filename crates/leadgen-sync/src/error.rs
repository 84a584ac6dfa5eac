use thiserror::Error;

/// Errors returned by session and document-store operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {context}")]
    UnexpectedStatus { status: u16, context: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored document exists but is not a JSON object.
    #[error("document for user '{0}' is not a JSON object")]
    NotAnObject(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid user id '{0}'")]
    InvalidUserId(String),
}

impl SyncError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
