//! Application error types for the enrichment step.

use std::path::PathBuf;

use thiserror::Error;

/// Application-level errors for alto-geonames.
///
/// Every variant aborts the current run. The fallback retry inside the
/// resolver is not an error and never surfaces here.
#[derive(Error, Debug)]
pub enum AppError {
    // Document store errors
    #[error("Document unavailable: {}: {source}", path.display())]
    DocumentUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {}: {message}", path.display())]
    MalformedDocument { path: PathBuf, message: String },

    // Lookup errors
    #[error("GeoNames lookup for '{label}' failed: {source}")]
    LookupTransportFailure {
        label: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("GeoNames response for '{label}' is malformed: {message}")]
    LookupResponseMalformed { label: String, message: String },

    #[error("GeoNames rejected lookup for '{label}' (status {code}): {message}")]
    LookupServiceError {
        label: String,
        code: i64,
        message: String,
    },

    // Rewrite errors
    #[error("Cannot rewrite {}: {message}", path.display())]
    RewriteFailure { path: PathBuf, message: String },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Short machine-readable code for log fields.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DocumentUnavailable { .. } => "DOCUMENT_UNAVAILABLE",
            AppError::MalformedDocument { .. } => "MALFORMED_DOCUMENT",
            AppError::LookupTransportFailure { .. } => "LOOKUP_TRANSPORT_FAILURE",
            AppError::HttpClient(_) => "HTTP_CLIENT_ERROR",
            AppError::LookupResponseMalformed { .. } => "LOOKUP_RESPONSE_MALFORMED",
            AppError::LookupServiceError { .. } => "LOOKUP_SERVICE_ERROR",
            AppError::RewriteFailure { .. } => "REWRITE_FAILURE",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the error came from the GeoNames lookup path.
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            AppError::LookupTransportFailure { .. }
                | AppError::LookupResponseMalformed { .. }
                | AppError::LookupServiceError { .. }
        )
    }
}
