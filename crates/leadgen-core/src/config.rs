use crate::app_config::{AppConfig, DocumentStoreKind, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or a backend-specific
/// requirement is missing.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or a backend-specific
/// requirement is missing.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation live here, decoupled from the real environment, so
/// tests can feed a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    // Empty strings count as unset for optional secrets and URLs.
    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let env = parse_environment(&or_default("LEADGEN_ENV", "development"));
    let log_level = or_default("LEADGEN_LOG_LEVEL", "info");

    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("LEADGEN_GEMINI_MODEL", "gemini-3-flash-preview");
    let gemini_base_url = or_default(
        "LEADGEN_GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com/",
    );
    let request_timeout_secs = parse_u64("LEADGEN_REQUEST_TIMEOUT_SECS", "60")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "LEADGEN_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let data_dir = PathBuf::from(or_default("LEADGEN_DATA_DIR", "./.leadgen"));
    let document_store = parse_document_store(&or_default("LEADGEN_DOCUMENT_STORE", "file"))?;
    let document_url = optional("LEADGEN_DOCUMENT_URL");
    let document_token = optional("LEADGEN_DOCUMENT_TOKEN");
    if document_store == DocumentStoreKind::Http && document_url.is_none() {
        return Err(ConfigError::MissingEnvVar("LEADGEN_DOCUMENT_URL".to_string()));
    }

    let sync_poll_interval_ms = parse_u64("LEADGEN_SYNC_POLL_INTERVAL_MS", "2000")?;
    let default_niche = or_default("LEADGEN_DEFAULT_NICHE", "SaaS");
    let segments_path = PathBuf::from(or_default(
        "LEADGEN_SEGMENTS_PATH",
        "./config/segments.yaml",
    ));
    let sender_name = or_default("LEADGEN_SENDER_NAME", "Me");

    Ok(AppConfig {
        env,
        log_level,
        gemini_api_key,
        gemini_model,
        gemini_base_url,
        request_timeout_secs,
        data_dir,
        document_store,
        document_url,
        document_token,
        sync_poll_interval_ms,
        default_niche,
        segments_path,
        sender_name,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_document_store(s: &str) -> Result<DocumentStoreKind, ConfigError> {
    match s {
        "file" => Ok(DocumentStoreKind::File),
        "http" => Ok(DocumentStoreKind::Http),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LEADGEN_DOCUMENT_STORE".to_string(),
            reason: format!("expected 'file' or 'http', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
