//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `store` - identity store backends (in-memory, Redis)
//! - `telegram` - Telegram Bot API transport and update poller
//! - `transport` - recording transport for tests

pub mod store;
pub mod telegram;
pub mod transport;

pub use store::{InMemoryIdentityStore, RedisIdentityStore};
pub use telegram::{TelegramTransport, UpdatePoller, UpdatePollerConfig};
pub use transport::RecordingTransport;
