//! # AppError
//!
//! Centralized error handling for the Rusty-Gallery ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all rg-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Image, Comment, Rating)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., two star buckets selected, file is not an image)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Authentication failure (e.g., bad password, expired token)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Role or ownership check failed
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure (e.g., DB down, migration failed)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate tag name, duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Failure reported by an external collaborator (CDN upload, QR rendering).
    /// Carried through untouched.
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str, id: impl ToString) -> Self {
        AppError::NotFound(what.to_string(), id.to_string())
    }

    pub fn forbidden(reason: &str) -> Self {
        AppError::Forbidden(reason.to_string())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        AppError::ValidationError(reason.into())
    }
}

/// A specialized Result type for Rusty-Gallery logic.
pub type Result<T> = std::result::Result<T, AppError>;
