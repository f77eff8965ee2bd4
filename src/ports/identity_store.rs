//! Identity Store Port - durable mappings between users, classes and rounds.
//!
//! Five logical maps plus one acknowledgement set per class:
//!
//! | Map | Key | Value |
//! |-----|-----|-------|
//! | `USERNAME_TO_IDS` | username | chat handle |
//! | `STUDENTS_TO_CLASS` | student username | class |
//! | `TEACHER_TO_CLASS` | teacher chat handle | active class |
//! | `CLASS_TO_TEACHER` | class | active teacher chat handle |
//! | `CLASS_TO_MESSAGE_ID` | class | session message reference |
//! | `SESSION_ACKS:<class>` | - | usernames that acknowledged |
//!
//! A round is opened with [`IdentityStore::open_session`] and ended with
//! [`IdentityStore::close_session`]; both touch every round key at once.
//!
//! A missing key is `Ok(None)`, never an error: callers must branch on it.
//! Writes that touch more than one key are atomic from every caller's point of
//! view, so no reader ever sees one direction of the teacher/class mapping
//! without the other.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::foundation::{ChatHandle, ClassName, MessageRef, Username};

/// Errors raised by identity store implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable, closed, or failed the command.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be decoded.
    #[error("Corrupt value under {key}: '{value}'")]
    Corrupt { key: String, value: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable(message.into())
    }

    pub fn corrupt(key: impl Into<String>, value: impl Into<String>) -> Self {
        StoreError::Corrupt {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Port for the shared identity/relationship store.
///
/// Injected into every component as `Arc<dyn IdentityStore>`; there is no
/// process-wide instance. Call [`IdentityStore::close`] once on shutdown.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Records (or refreshes) the chat handle of a user.
    async fn register(&self, username: &Username, handle: ChatHandle) -> Result<(), StoreError>;

    /// Chat handle of a user, `None` if they never started the bot.
    async fn lookup_chat_handle(&self, username: &Username)
        -> Result<Option<ChatHandle>, StoreError>;

    /// Writes student -> class for every enrollment in one atomic batch.
    ///
    /// Re-writing identical enrollments leaves the store unchanged.
    async fn set_student_classes(
        &self,
        enrollments: &[(Username, ClassName)],
    ) -> Result<(), StoreError>;

    async fn get_student_class(&self, username: &Username)
        -> Result<Option<ClassName>, StoreError>;

    /// Sets teacher -> class and class -> teacher in one atomic write.
    ///
    /// Last writer wins: a previous class of this teacher keeps its own
    /// class -> teacher entry until it is overwritten or closed.
    async fn set_active_class(&self, teacher: ChatHandle, class: &ClassName)
        -> Result<(), StoreError>;

    async fn get_active_class(&self, teacher: ChatHandle) -> Result<Option<ClassName>, StoreError>;

    async fn get_active_teacher(&self, class: &ClassName) -> Result<Option<ChatHandle>, StoreError>;

    /// Replaces the class's session message and clears its acknowledgements,
    /// atomically.
    async fn set_session_message(
        &self,
        class: &ClassName,
        message: MessageRef,
    ) -> Result<(), StoreError>;

    async fn get_session_message(&self, class: &ClassName)
        -> Result<Option<MessageRef>, StoreError>;

    /// Opens a round in one atomic write: teacher -> class, class -> teacher,
    /// the session message, and an empty acknowledgement set.
    ///
    /// Called only after the session message exists, so no reader ever sees
    /// a class pointing at a teacher whose message was never sent.
    async fn open_session(
        &self,
        teacher: ChatHandle,
        class: &ClassName,
        message: MessageRef,
    ) -> Result<(), StoreError>;

    /// Adds a student to the class's acknowledgement set.
    ///
    /// Returns `true` only for the call that actually inserted the student.
    async fn record_acknowledgement(
        &self,
        class: &ClassName,
        username: &Username,
    ) -> Result<bool, StoreError>;

    async fn acknowledged_students(&self, class: &ClassName)
        -> Result<BTreeSet<Username>, StoreError>;

    /// Removes both teacher/class directions, the session message and the
    /// acknowledgement set of a round, atomically.
    async fn close_session(&self, teacher: ChatHandle, class: &ClassName)
        -> Result<(), StoreError>;

    /// Releases the backend. Every later call fails with `Unavailable`.
    async fn close(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn IdentityStore) {}
    }

    #[test]
    fn corrupt_error_names_key_and_value() {
        let err = StoreError::corrupt("USERNAME_TO_IDS/alice_u", "abc");
        assert_eq!(
            err.to_string(),
            "Corrupt value under USERNAME_TO_IDS/alice_u: 'abc'"
        );
    }
}
