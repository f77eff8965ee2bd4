//! Recording chat transport for testing.
//!
//! Captures every sent and edited message instead of delivering it, hands out
//! increasing message references, and can be told to fail for given chats.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.
//!
//! # Example
//!
//! ```ignore
//! let transport = Arc::new(RecordingTransport::new().failing_for(ChatHandle::new(13)));
//! transport.send_message(ChatHandle::new(1), "hello", None).await?;
//! assert_eq!(transport.sent_to(ChatHandle::new(1)).len(), 1);
//! ```

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use crate::domain::foundation::{ChatHandle, MessageRef};
use crate::ports::{ChatTransport, TransportError};

/// A message captured by [`RecordingTransport::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat: ChatHandle,
    pub message: MessageRef,
    pub text: String,
    pub choices: Option<Vec<String>>,
}

/// An edit captured by [`RecordingTransport::edit_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedMessage {
    pub chat: ChatHandle,
    pub message: MessageRef,
    pub text: String,
}

/// In-memory transport that records instead of delivering.
#[derive(Debug)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<EditedMessage>>,
    failing: Mutex<HashSet<ChatHandle>>,
    next_message: AtomicI64,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            next_message: AtomicI64::new(1),
        }
    }

    /// Makes every send or edit addressed to `chat` fail with an API error.
    pub fn failing_for(self, chat: ChatHandle) -> Self {
        self.failing
            .lock()
            .expect("RecordingTransport: failing lock poisoned")
            .insert(chat);
        self
    }

    // === Test Helpers ===

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .expect("RecordingTransport: sent lock poisoned")
            .clone()
    }

    pub fn sent_to(&self, chat: ChatHandle) -> Vec<SentMessage> {
        self.sent().into_iter().filter(|m| m.chat == chat).collect()
    }

    /// Text of the most recent message sent to `chat`.
    pub fn last_text_to(&self, chat: ChatHandle) -> Option<String> {
        self.sent_to(chat).pop().map(|m| m.text)
    }

    pub fn edits(&self) -> Vec<EditedMessage> {
        self.edits
            .lock()
            .expect("RecordingTransport: edits lock poisoned")
            .clone()
    }

    pub fn edits_of(&self, message: MessageRef) -> Vec<EditedMessage> {
        self.edits()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }

    fn check_failing(&self, chat: ChatHandle) -> Result<(), TransportError> {
        let failing = self
            .failing
            .lock()
            .expect("RecordingTransport: failing lock poisoned");
        if failing.contains(&chat) {
            return Err(TransportError::api(403, "Forbidden: bot was blocked by the user"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat: ChatHandle,
        text: &str,
        choices: Option<&[String]>,
    ) -> Result<MessageRef, TransportError> {
        self.check_failing(chat)?;
        let message = MessageRef::new(self.next_message.fetch_add(1, Ordering::SeqCst));
        self.sent
            .lock()
            .expect("RecordingTransport: sent lock poisoned")
            .push(SentMessage {
                chat,
                message,
                text: text.to_string(),
                choices: choices.map(<[String]>::to_vec),
            });
        Ok(message)
    }

    async fn edit_message(
        &self,
        chat: ChatHandle,
        message: MessageRef,
        text: &str,
    ) -> Result<(), TransportError> {
        self.check_failing(chat)?;
        self.edits
            .lock()
            .expect("RecordingTransport: edits lock poisoned")
            .push(EditedMessage {
                chat,
                message,
                text: text.to_string(),
            });
        Ok(())
    }
}
