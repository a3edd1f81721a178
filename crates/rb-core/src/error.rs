//! # AppError
//!
//! Centralized error handling for the Rusty-Board ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all rb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., a Post or a parent Post)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., post too long, invalid file type)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn post_not_found(id: crate::models::PostId) -> Self {
        AppError::NotFound("post".into(), id.to_string())
    }
}

/// A specialized Result type for Rusty-Board logic.
pub type Result<T> = std::result::Result<T, AppError>;
