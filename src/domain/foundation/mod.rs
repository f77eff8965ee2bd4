//! Foundation module - Shared domain primitives.
//!
//! Contains the identifiers, the state machine trait and the error types
//! that form the vocabulary of the attendance domain.

mod errors;
mod ids;
mod state_machine;

pub use errors::{ErrorCode, ValidationError};
pub use ids::{ChatHandle, ClassName, MessageRef, Username};
pub use state_machine::StateMachine;
