//! Error types for the LeadChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    /// The account behind the API key has run out of quota or credit.
    #[error("Provider quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether the provider reported that it cannot serve requests right now
    /// because of quota or capacity limits (as opposed to a generic failure).
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_) | Self::RateLimited { .. })
    }
}

/// Problems with an inbound chat request, detected before assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Message is required")]
    MissingMessage,

    #[error("Malformed chat request: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum LeadError {
    #[error("Name, email, and phone are required")]
    MissingFields,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Email delivery failed (status {status_code}): {message}")]
    DeliveryFailed { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}
