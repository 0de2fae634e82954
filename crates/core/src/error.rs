//! Error types for the chat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; the top-level [`Error`]
//! is what the chat pipeline returns to its caller.
//!
//! Classification and formatting never fail, so they have no variant here.
//! A safety block is a normal outcome and is not an error either.

use thiserror::Error;

/// The top-level error type for chat operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The inbound request was missing or empty.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading the canned answers failed.
    #[error("Answer store unavailable: {0}")]
    AnswerStoreUnavailable(#[from] StoreError),

    /// The language-model call failed.
    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] ProviderError),
}

impl Error {
    /// Whether the caller is at fault (maps to a 4xx at the HTTP boundary).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidRequest(_))
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Store not configured: {0}")]
    NotConfigured(String),
}
