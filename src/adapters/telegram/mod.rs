//! Telegram Bot API adapter.
//!
//! - `TelegramTransport` - outbound messages and edits, plus `getUpdates`
//! - `UpdatePoller` - long-polling loop that turns updates into events

mod client;
mod poller;
mod types;

pub use client::TelegramTransport;
pub use poller::{UpdatePoller, UpdatePollerConfig, UpdateSource};
pub use types::Update;
