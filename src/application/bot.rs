//! AttendanceBot - routes inbound events to their handlers.
//!
//! Every event gets exactly one reply to its sender unless a handler already
//! answered in-band (class choices, session message). Recoverable errors are
//! answered with their user message; infrastructure errors are logged and
//! answered with a generic apology. Nothing here terminates the process.

use std::sync::Arc;
use tokio::task::JoinHandle;

use super::handlers::{
    AcknowledgeHandler, AttendanceSessionHandler, CloseAttendanceHandler, FanOutReport,
    RegisterUserHandler, ReplyOutcome,
};
use super::{DialogRegistry, KeyedLocks};
use crate::domain::attendance::AttendanceError;
use crate::domain::foundation::ChatHandle;
use crate::domain::roster::Roster;
use crate::ports::{ChatTransport, IdentityStore, InboundEvent};

pub const CANCELLED_TEXT: &str = "Attendance session creation has been canceled.";
pub const NOTHING_TO_CANCEL_TEXT: &str = "There is nothing to cancel.";
pub const FALLBACK_TEXT: &str =
    "Send /start_attendance to take attendance, or /mark_attendance to mark yourself present.";

/// Side effects of a dispatch that outlive it.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Set when the event opened a round.
    pub fan_out: Option<JoinHandle<FanOutReport>>,
}

impl DispatchOutcome {
    /// Waits for a spawned fan-out, if any.
    pub async fn finish(self) -> Option<FanOutReport> {
        match self.fan_out {
            Some(handle) => match handle.await {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::error!(error = %e, "Fan-out task failed");
                    None
                }
            },
            None => None,
        }
    }
}

/// What the sender should be told.
enum Reply {
    Text(String),
    /// The handler already talked to the sender.
    Handled,
}

pub struct AttendanceBot {
    transport: Arc<dyn ChatTransport>,
    register: RegisterUserHandler,
    sessions: AttendanceSessionHandler,
    acknowledge: AcknowledgeHandler,
    close: CloseAttendanceHandler,
}

impl AttendanceBot {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        transport: Arc<dyn ChatTransport>,
        roster: Arc<Roster>,
    ) -> Self {
        let locks = Arc::new(KeyedLocks::new());
        let dialogs = Arc::new(DialogRegistry::new());

        Self {
            register: RegisterUserHandler::new(store.clone()),
            sessions: AttendanceSessionHandler::new(
                store.clone(),
                transport.clone(),
                roster.clone(),
                dialogs,
                locks.clone(),
            ),
            acknowledge: AcknowledgeHandler::new(
                store.clone(),
                transport.clone(),
                roster.clone(),
                locks.clone(),
            ),
            close: CloseAttendanceHandler::new(store, transport.clone(), roster, locks),
            transport,
        }
    }

    /// Handles one inbound event to completion, except for a fan-out it may
    /// have spawned.
    #[tracing::instrument(skip(self, event), fields(kind = event.kind(), chat = %event.user().handle))]
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        let chat = event.user().handle;
        let mut outcome = DispatchOutcome::default();

        let reply = match self.route(event, &mut outcome).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.code().is_infrastructure() {
                    tracing::error!(code = %e.code(), error = %e, "Event handling failed");
                } else {
                    tracing::info!(code = %e.code(), "Event rejected");
                }
                Reply::Text(e.user_message())
            }
        };

        if let Reply::Text(text) = reply {
            self.send_reply(chat, &text).await;
        }
        outcome
    }

    async fn route(
        &self,
        event: InboundEvent,
        outcome: &mut DispatchOutcome,
    ) -> Result<Reply, AttendanceError> {
        match event {
            InboundEvent::Start(user) => {
                let username = self.register.handle(&user).await?;
                Ok(Reply::Text(format!(
                    "Welcome! You are registered as @{}.",
                    username
                )))
            }
            InboundEvent::StartAttendance(user) => {
                self.sessions.start(user.handle).await?;
                Ok(Reply::Handled)
            }
            InboundEvent::TextReply { user, text } => {
                match self.sessions.reply(user.handle, &text).await? {
                    ReplyOutcome::Opened { fan_out, .. } => {
                        outcome.fan_out = Some(fan_out);
                        Ok(Reply::Handled)
                    }
                    ReplyOutcome::NotChoosing => Ok(Reply::Text(FALLBACK_TEXT.to_string())),
                }
            }
            InboundEvent::Cancel(user) => {
                let text = if self.sessions.cancel(user.handle).await? {
                    CANCELLED_TEXT
                } else {
                    NOTHING_TO_CANCEL_TEXT
                };
                Ok(Reply::Text(text.to_string()))
            }
            InboundEvent::MarkAttendance(user) => {
                let ack = self.acknowledge.handle(&user).await?;
                Ok(Reply::Text(ack.reply_text().to_string()))
            }
            InboundEvent::CloseAttendance(user) => {
                let report = self.close.handle(user.handle).await?;
                Ok(Reply::Text(report.reply_text()))
            }
        }
    }

    async fn send_reply(&self, chat: ChatHandle, text: &str) {
        if let Err(e) = self.transport.send_message(chat, text, None).await {
            tracing::warn!(%chat, error = %e, "Failed to send reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryIdentityStore, RecordingTransport};
    use crate::domain::foundation::Username;
    use crate::ports::ChatUser;

    fn bot() -> (Arc<InMemoryIdentityStore>, Arc<RecordingTransport>, AttendanceBot) {
        let store = Arc::new(InMemoryIdentityStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let roster = Arc::new(Roster::from_json(r#"{"10A": {"Alice": "alice_u"}}"#).unwrap());
        let bot = AttendanceBot::new(store.clone(), transport.clone(), roster);
        (store, transport, bot)
    }

    fn user(chat: i64, name: Option<&str>) -> ChatUser {
        ChatUser::new(
            ChatHandle::new(chat),
            name.map(|n| Username::new(n).unwrap()),
        )
    }

    #[tokio::test]
    async fn start_without_username_asks_for_one() {
        let (_, transport, bot) = bot();

        bot.dispatch(InboundEvent::Start(user(1, None))).await;

        assert_eq!(
            transport.last_text_to(ChatHandle::new(1)),
            Some(AttendanceError::MissingUsername.user_message())
        );
    }

    #[tokio::test]
    async fn text_outside_a_dialog_gets_usage_hint() {
        let (_, transport, bot) = bot();

        let outcome = bot
            .dispatch(InboundEvent::TextReply {
                user: user(1, Some("t1")),
                text: "hello".to_string(),
            })
            .await;

        assert!(outcome.fan_out.is_none());
        assert_eq!(
            transport.last_text_to(ChatHandle::new(1)),
            Some(FALLBACK_TEXT.to_string())
        );
    }

    #[tokio::test]
    async fn cancel_without_dialog_says_so() {
        let (_, transport, bot) = bot();

        bot.dispatch(InboundEvent::Cancel(user(1, Some("t1")))).await;

        assert_eq!(
            transport.last_text_to(ChatHandle::new(1)),
            Some(NOTHING_TO_CANCEL_TEXT.to_string())
        );
    }

    #[tokio::test]
    async fn infrastructure_errors_get_generic_apology() {
        let (store, transport, bot) = bot();
        store.close().await.unwrap();

        bot.dispatch(InboundEvent::MarkAttendance(user(1, Some("alice_u"))))
            .await;

        assert_eq!(
            transport.last_text_to(ChatHandle::new(1)),
            Some("Something went wrong on our side. Please try again.".to_string())
        );
    }

    #[tokio::test]
    async fn close_without_round_is_reported() {
        let (_, transport, bot) = bot();

        bot.dispatch(InboundEvent::CloseAttendance(user(9, Some("t1"))))
            .await;

        assert_eq!(
            transport.last_text_to(ChatHandle::new(9)),
            Some(AttendanceError::NoOpenRound.user_message())
        );
    }
}
