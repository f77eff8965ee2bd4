//! Attendance domain module.
//!
//! The per-teacher dialog (`Idle` -> `ChoosingClass` -> `Idle`) and the
//! attendance round (`Open` -> `Closed`) that students acknowledge against.

mod dialog;
mod errors;
mod round;

pub use dialog::{DialogAction, DialogEvent, DialogPhase, TeacherDialog};
pub use errors::AttendanceError;
pub use round::{AttendanceRound, RoundStatus};
