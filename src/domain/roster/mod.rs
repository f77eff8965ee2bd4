//! Roster domain module.
//!
//! The class -> student import feed, validated into an immutable snapshot.

mod errors;
#[allow(clippy::module_inception)]
mod roster;

pub use errors::RosterError;
pub use roster::{ClassRoster, Roster, Student};
