//! Roster loading errors. All of them are fatal at startup.

use thiserror::Error;

use crate::domain::foundation::{ClassName, Username, ValidationError};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Roster is not a class -> {{label -> username}} mapping: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid roster entry: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Student '{username}' is enrolled in both '{first}' and '{second}'")]
    DuplicateEnrollment {
        username: Username,
        first: ClassName,
        second: ClassName,
    },

    #[error("Roster contains no classes")]
    Empty,
}
