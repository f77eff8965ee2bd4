//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (identifiers, state machine, errors)
//! - `roster` - The immutable class/student snapshot imported at startup
//! - `attendance` - Teacher dialog and attendance round lifecycle

pub mod attendance;
pub mod foundation;
pub mod roster;
