//! Chat Transport Port - the notification channel the bot talks through.
//!
//! Outbound: send a message (optionally with one-tap choices) and edit a
//! previously sent message. Inbound: transports turn whatever they receive
//! into [`InboundEvent`]s, which the application dispatches.

use async_trait::async_trait;

use crate::domain::foundation::{ChatHandle, MessageRef, Username};

/// Errors that can occur while talking to the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request never completed (connect failure, timeout, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The platform answered but refused the request.
    #[error("API error {status}: {description}")]
    Api { status: u16, description: String },

    /// The response could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        TransportError::Network(message.into())
    }

    pub fn api(status: u16, description: impl Into<String>) -> Self {
        TransportError::Api {
            status,
            description: description.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        TransportError::Parse(message.into())
    }
}

/// Port for sending and editing chat messages.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends `text` to `chat`, offering `choices` as one-tap replies if given.
    async fn send_message(
        &self,
        chat: ChatHandle,
        text: &str,
        choices: Option<&[String]>,
    ) -> Result<MessageRef, TransportError>;

    /// Replaces the text of a message previously sent to `chat`.
    async fn edit_message(
        &self,
        chat: ChatHandle,
        message: MessageRef,
        text: &str,
    ) -> Result<(), TransportError>;
}

/// The sender of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    /// Where replies to this user go.
    pub handle: ChatHandle,
    /// `None` if the user has not set a username on the platform.
    pub username: Option<Username>,
}

impl ChatUser {
    pub fn new(handle: ChatHandle, username: Option<Username>) -> Self {
        Self { handle, username }
    }
}

/// Inbound interactions the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/start` - register the sender's chat handle.
    Start(ChatUser),
    /// `/start_attendance` - teacher begins choosing a class.
    StartAttendance(ChatUser),
    /// Any text that is not a known command.
    TextReply { user: ChatUser, text: String },
    /// `/cancel` - abort class selection.
    Cancel(ChatUser),
    /// `/mark_attendance` - student acknowledges the active round.
    MarkAttendance(ChatUser),
    /// `/close_attendance` - teacher closes their open round.
    CloseAttendance(ChatUser),
}

impl InboundEvent {
    /// Classifies a text message by its leading command.
    ///
    /// Commands may carry a `@botname` suffix and trailing arguments, both
    /// ignored. Unknown commands are treated as plain text.
    pub fn from_text(user: ChatUser, text: &str) -> Self {
        let trimmed = text.trim();
        let command = trimmed
            .split_whitespace()
            .next()
            .filter(|word| word.starts_with('/'))
            .map(|word| word.split('@').next().unwrap_or(word));

        match command {
            Some("/start") => InboundEvent::Start(user),
            Some("/start_attendance") => InboundEvent::StartAttendance(user),
            Some("/cancel") => InboundEvent::Cancel(user),
            Some("/mark_attendance") => InboundEvent::MarkAttendance(user),
            Some("/close_attendance") => InboundEvent::CloseAttendance(user),
            _ => InboundEvent::TextReply {
                user,
                text: trimmed.to_string(),
            },
        }
    }

    pub fn user(&self) -> &ChatUser {
        match self {
            InboundEvent::Start(user)
            | InboundEvent::StartAttendance(user)
            | InboundEvent::Cancel(user)
            | InboundEvent::MarkAttendance(user)
            | InboundEvent::CloseAttendance(user) => user,
            InboundEvent::TextReply { user, .. } => user,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Start(_) => "start",
            InboundEvent::StartAttendance(_) => "start_attendance",
            InboundEvent::TextReply { .. } => "text_reply",
            InboundEvent::Cancel(_) => "cancel",
            InboundEvent::MarkAttendance(_) => "mark_attendance",
            InboundEvent::CloseAttendance(_) => "close_attendance",
        }
    }
}
