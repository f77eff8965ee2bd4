//! Roster ingestion.

mod load_roster;

pub use load_roster::{RosterLoadError, RosterLoadResult, RosterLoader};
