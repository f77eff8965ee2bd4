//! Attendance round handlers.

mod acknowledge;
mod attendance_session;
mod close_attendance;
mod fan_out;

pub use acknowledge::{AcknowledgeHandler, Acknowledged, ALREADY_MARKED_TEXT, MARKED_TEXT};
pub use attendance_session::{
    AttendanceSessionHandler, ReplyOutcome, CHOOSE_CLASS_TEXT, SENDING_TEXT,
};
pub use close_attendance::{CloseAttendanceHandler, CloseReport};
pub use fan_out::{prompt_text, Delivery, FanOutDispatcher, FanOutReport};
