//! Application handlers.
//!
//! Command handlers that orchestrate domain operations over the ports.

pub mod attendance;
pub mod identity;
pub mod roster;

pub use attendance::{
    AcknowledgeHandler, Acknowledged, AttendanceSessionHandler, CloseAttendanceHandler,
    CloseReport, FanOutDispatcher, FanOutReport, ReplyOutcome,
};
pub use identity::RegisterUserHandler;
pub use roster::{RosterLoadError, RosterLoadResult, RosterLoader};
