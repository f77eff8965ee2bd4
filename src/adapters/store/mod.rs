//! Identity store adapters.
//!
//! - `InMemoryIdentityStore` - for tests and single-process runs
//! - `RedisIdentityStore` - durable hashes in Redis

mod in_memory;
mod redis;

pub use self::redis::{
    RedisIdentityStore, CLASS_TO_MESSAGE_ID, CLASS_TO_TEACHER, STUDENTS_TO_CLASS,
    TEACHER_TO_CLASS, USERNAME_TO_IDS,
};
pub use in_memory::InMemoryIdentityStore;
