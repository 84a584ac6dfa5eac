use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which remote document backend the sync engine talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStoreKind {
    /// JSON documents under `<data_dir>/users/`.
    File,
    /// A JSON document service at `document_url`.
    Http,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub request_timeout_secs: u64,
    pub data_dir: PathBuf,
    pub document_store: DocumentStoreKind,
    pub document_url: Option<String>,
    pub document_token: Option<String>,
    pub sync_poll_interval_ms: u64,
    pub default_niche: String,
    pub segments_path: PathBuf,
    pub sender_name: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("data_dir", &self.data_dir)
            .field("document_store", &self.document_store)
            .field("document_url", &self.document_url)
            .field(
                "document_token",
                &self.document_token.as_ref().map(|_| "[redacted]"),
            )
            .field("sync_poll_interval_ms", &self.sync_poll_interval_ms)
            .field("default_niche", &self.default_niche)
            .field("segments_path", &self.segments_path)
            .field("sender_name", &self.sender_name)
            .finish()
    }
}
