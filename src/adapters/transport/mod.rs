//! Chat transport test double.

mod recording;

pub use recording::{EditedMessage, RecordingTransport, SentMessage};
