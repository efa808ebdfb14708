use thiserror::Error;

use crate::domain::model::ResourceKind;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("Upstream unavailable for {kind}: {message}")]
    UpstreamUnavailable { kind: ResourceKind, message: String },

    #[error("Upstream {kind} response format is invalid: {message}")]
    UpstreamShapeInvalid { kind: ResourceKind, message: String },

    #[error("Cache store unavailable: {message}")]
    CacheUnavailable { message: String },

    #[error("Export failed: {message}")]
    ExportFailure { message: String },

    #[error("Insufficient data: expected {expected} characters, found {found}")]
    InsufficientData { expected: usize, found: usize },

    #[error("Worker task failed: {message}")]
    TaskFailed { message: String },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// Coarse grouping used for logging and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Upstream,
    Cache,
    Export,
    Data,
    Configuration,
    Internal,
}

pub const SERVICE_UNAVAILABLE: u16 = 503;
pub const INTERNAL_SERVER_ERROR: u16 = 500;

impl RankError {
    pub fn upstream(kind: ResourceKind, message: impl Into<String>) -> Self {
        RankError::UpstreamUnavailable {
            kind,
            message: message.into(),
        }
    }

    pub fn shape(kind: ResourceKind, message: impl Into<String>) -> Self {
        RankError::UpstreamShapeInvalid {
            kind,
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        RankError::CacheUnavailable {
            message: message.into(),
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        RankError::ExportFailure {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RankError::UpstreamUnavailable { .. } | RankError::UpstreamShapeInvalid { .. } => {
                ErrorCategory::Upstream
            }
            RankError::CacheUnavailable { .. } => ErrorCategory::Cache,
            RankError::ExportFailure { .. } => ErrorCategory::Export,
            RankError::InsufficientData { .. } => ErrorCategory::Data,
            RankError::ConfigError { .. }
            | RankError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            _ => ErrorCategory::Internal,
        }
    }

    /// Stable status surfaced to API callers.
    ///
    /// A malformed film list is an internal error while malformed character
    /// or species payloads are reported as service-unavailable.
    pub fn status_code(&self) -> u16 {
        match self {
            RankError::UpstreamShapeInvalid {
                kind: ResourceKind::FilmList,
                ..
            } => INTERNAL_SERVER_ERROR,
            RankError::UpstreamUnavailable { .. }
            | RankError::UpstreamShapeInvalid { .. }
            | RankError::CacheUnavailable { .. }
            | RankError::ExportFailure { .. }
            | RankError::HttpError(_) => SERVICE_UNAVAILABLE,
            _ => INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_service_unavailable(&self) -> bool {
        self.status_code() == SERVICE_UNAVAILABLE
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RankError::UpstreamUnavailable { kind, .. } => {
                format!("Unable to fetch {} data", kind)
            }
            RankError::UpstreamShapeInvalid { kind, .. } => {
                format!("Unable to fetch {} data. API response format is invalid", kind)
            }
            RankError::CacheUnavailable { .. } => "Cache store is not reachable".to_string(),
            RankError::ExportFailure { .. } => "Unable to export the CSV file".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RankError>;
