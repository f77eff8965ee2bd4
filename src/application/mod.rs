//! Application layer - Handlers and event dispatch.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! [`AttendanceBot`] is the single entry point for inbound events.

mod bot;
mod dialog_registry;
mod event_tasks;
pub mod handlers;
mod keyed_locks;

pub use bot::{
    AttendanceBot, DispatchOutcome, CANCELLED_TEXT, FALLBACK_TEXT, NOTHING_TO_CANCEL_TEXT,
};
pub use dialog_registry::DialogRegistry;
pub use event_tasks::EventTasks;
pub use handlers::{
    AcknowledgeHandler, Acknowledged, AttendanceSessionHandler, CloseAttendanceHandler,
    CloseReport, FanOutDispatcher, FanOutReport, RegisterUserHandler, ReplyOutcome,
    RosterLoadError, RosterLoadResult, RosterLoader,
};
pub use keyed_locks::KeyedLocks;
