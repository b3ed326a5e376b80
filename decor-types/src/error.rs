//! Error types for the booking marketplace.

use crate::domain::DeliveryStatus;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid delivery status transition: {from} -> {to}")]
    InvalidTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by the hosted checkout provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure; the caller may retry
    #[error("Checkout provider unavailable: {0}")]
    Unavailable(String),

    #[error("Checkout session not found: {0}")]
    SessionNotFound(String),

    /// The provider answered with something we cannot interpret
    #[error("Checkout provider protocol error: {0}")]
    Protocol(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failure: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment provider failure: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(DomainError::ValidationError(msg)) => AppError::Validation(msg),
            RepoError::Domain(e @ DomainError::InvalidTransition { .. }) => {
                AppError::Validation(e.to_string())
            }
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Conflict(msg) => AppError::Conflict(msg),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(msg) => AppError::Provider(msg),
            ProviderError::SessionNotFound(id) => {
                AppError::NotFound(format!("Checkout session not found: {}", id))
            }
            ProviderError::Protocol(msg) => AppError::Provider(msg),
        }
    }
}
