//! Attendance-specific error types.
//!
//! Every variant except `Store` and `Transport` is an expected outcome of a
//! user action and is answered in chat with [`AttendanceError::user_message`].

use crate::domain::foundation::{ClassName, ErrorCode, Username, ValidationError};
use crate::ports::{StoreError, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    /// The chat user has no username, so the roster cannot identify them.
    #[error("User has no username")]
    MissingUsername,

    /// A teacher picked a class that is not in the roster.
    #[error("Unknown class: {requested}")]
    UnknownClass {
        requested: String,
        offered: Vec<ClassName>,
    },

    /// The student is not enrolled in any class.
    #[error("Student {0} is not enrolled in any class")]
    NotEnrolled(Username),

    /// The student's class has no round to acknowledge.
    #[error("No active attendance session for {0}")]
    NoActiveSession(ClassName),

    /// The teacher has no open round to close.
    #[error("Teacher has no open attendance round")]
    NoOpenRound,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl AttendanceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AttendanceError::MissingUsername => ErrorCode::MissingUsername,
            AttendanceError::UnknownClass { .. } => ErrorCode::UnknownClass,
            AttendanceError::NotEnrolled(_) => ErrorCode::NotEnrolled,
            AttendanceError::NoActiveSession(_) => ErrorCode::NoActiveSession,
            AttendanceError::NoOpenRound => ErrorCode::NoOpenRound,
            AttendanceError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            AttendanceError::Store(_) => ErrorCode::StoreError,
            AttendanceError::Transport(_) => ErrorCode::TransportError,
        }
    }

    /// Text sent back to the chat participant who caused the error.
    pub fn user_message(&self) -> String {
        match self {
            AttendanceError::MissingUsername => {
                "Please set a username in your chat settings, then send /start again.".to_string()
            }
            AttendanceError::UnknownClass { requested, offered } => {
                let names: Vec<&str> = offered.iter().map(ClassName::as_str).collect();
                format!(
                    "There is no class called '{}'. Choose one of: {} (or /cancel).",
                    requested,
                    names.join(", ")
                )
            }
            AttendanceError::NotEnrolled(username) => {
                format!("@{} is not enrolled in any class.", username)
            }
            AttendanceError::NoActiveSession(class) => {
                format!("There is no active attendance session for {}.", class)
            }
            AttendanceError::NoOpenRound => {
                "You have no open attendance session to close.".to_string()
            }
            AttendanceError::InvalidState(_)
            | AttendanceError::Store(_)
            | AttendanceError::Transport(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
        }
    }
}

impl From<ValidationError> for AttendanceError {
    fn from(err: ValidationError) -> Self {
        AttendanceError::InvalidState(err.to_string())
    }
}
