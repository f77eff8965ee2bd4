//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `IdentityStore` - durable username/class/teacher/session mappings
//! - `ChatTransport` - sending and editing chat messages, plus the
//!   `InboundEvent` vocabulary transports produce

mod chat_transport;
mod identity_store;

pub use chat_transport::{ChatTransport, ChatUser, InboundEvent, TransportError};
pub use identity_store::{IdentityStore, StoreError};
