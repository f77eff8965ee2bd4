//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    MissingUsername,

    // Not found errors
    UnknownClass,
    NotEnrolled,
    NoActiveSession,
    NoOpenRound,

    // State errors
    InvalidStateTransition,

    // Infrastructure errors
    StoreError,
    TransportError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::MissingUsername => "MISSING_USERNAME",
            ErrorCode::UnknownClass => "UNKNOWN_CLASS",
            ErrorCode::NotEnrolled => "NOT_ENROLLED",
            ErrorCode::NoActiveSession => "NO_ACTIVE_SESSION",
            ErrorCode::NoOpenRound => "NO_OPEN_ROUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::StoreError => "STORE_ERROR",
            ErrorCode::TransportError => "TRANSPORT_ERROR",
        };
        write!(f, "{}", s)
    }
}

impl ErrorCode {
    /// Returns true for errors caused by infrastructure rather than the user.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, ErrorCode::StoreError | ErrorCode::TransportError)
    }
}
