use thiserror::Error;

use crate::lead::LeadStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read segments file at {path}: {source}")]
    SegmentsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse segments file: {0}")]
    SegmentsFileParse(#[source] serde_yaml::Error),

    #[error("segments validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("lead not found: {0}")]
    LeadNotFound(String),

    #[error("lead {id} cannot handle {event} while {from}")]
    Transition {
        id: String,
        from: LeadStatus,
        event: &'static str,
    },

    #[error("invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },
}
