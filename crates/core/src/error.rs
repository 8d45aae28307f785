//! Error types for the agromie domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context (provider, store, tool) has its own error enum.
//!
//! Business failures (a missing head count, an unknown pasture) are *not*
//! errors: they travel as [`OperationOutcome`](crate::outcome::OperationOutcome)
//! values. The types here cover infrastructure faults only.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Server-side (5xx) failures, rate limits, timeouts and network faults are
    /// transient; client errors and authentication failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::ApiError { status_code, .. } => *status_code >= 500,
            ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_)
            | ProviderError::Network(_) => true,
            ProviderError::AuthenticationFailed(_)
            | ProviderError::EmptyResponse
            | ProviderError::NotConfigured(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt collection '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
