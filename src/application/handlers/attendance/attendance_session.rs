//! AttendanceSessionHandler - the teacher side of a round.
//!
//! `/start_attendance` offers the roster's classes, a class reply opens the
//! round and starts the fan-out, `/cancel` abandons the choice. Opening a
//! round runs in this order, under the class lock:
//!
//! 1. session message sent to the teacher
//! 2. `teacher <-> class`, the message reference and an empty
//!    acknowledgement set written in one store operation
//!
//! If the message cannot be sent nothing is written, and any previous round
//! of the class stays intact. Prompts go out only after step 2, so an early
//! acknowledgement always finds the new message.

use std::sync::Arc;
use tokio::task::JoinHandle;

use super::fan_out::{FanOutDispatcher, FanOutReport};
use crate::application::{DialogRegistry, KeyedLocks};
use crate::domain::attendance::{AttendanceError, AttendanceRound, DialogAction, DialogEvent};
use crate::domain::foundation::{ChatHandle, ClassName};
use crate::domain::roster::Roster;
use crate::ports::{ChatTransport, IdentityStore};

pub const CHOOSE_CLASS_TEXT: &str = "Choose class:";
pub const SENDING_TEXT: &str = "Sending attendance messages...";

/// Result of a teacher's free-text reply.
#[derive(Debug)]
pub enum ReplyOutcome {
    /// A round was opened; the handle resolves when the fan-out finishes.
    Opened {
        class: ClassName,
        fan_out: JoinHandle<FanOutReport>,
    },
    /// The teacher was not choosing a class.
    NotChoosing,
}

pub struct AttendanceSessionHandler {
    store: Arc<dyn IdentityStore>,
    transport: Arc<dyn ChatTransport>,
    roster: Arc<Roster>,
    dialogs: Arc<DialogRegistry>,
    locks: Arc<KeyedLocks<ClassName>>,
    fan_out: FanOutDispatcher,
}

impl AttendanceSessionHandler {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        transport: Arc<dyn ChatTransport>,
        roster: Arc<Roster>,
        dialogs: Arc<DialogRegistry>,
        locks: Arc<KeyedLocks<ClassName>>,
    ) -> Self {
        let fan_out = FanOutDispatcher::new(store.clone(), transport.clone(), roster.clone());
        Self {
            store,
            transport,
            roster,
            dialogs,
            locks,
            fan_out,
        }
    }

    /// Puts the teacher in `ChoosingClass` and offers every roster class.
    /// A repeated start restarts the choice.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, teacher: ChatHandle) -> Result<(), AttendanceError> {
        let classes: Vec<ClassName> = self.roster.class_names().cloned().collect();
        let action = self
            .dialogs
            .apply(teacher, DialogEvent::Start { classes })
            .await;

        match action {
            DialogAction::OfferClasses(offered) => {
                let choices: Vec<String> = offered.iter().map(|c| c.to_string()).collect();
                self.transport
                    .send_message(teacher, CHOOSE_CLASS_TEXT, Some(&choices))
                    .await?;
                Ok(())
            }
            other => Err(unexpected(other)),
        }
    }

    /// Handles free text from a teacher.
    ///
    /// # Errors
    ///
    /// - `UnknownClass` if the teacher is choosing and the text names no
    ///   offered class; the teacher stays in `ChoosingClass`
    #[tracing::instrument(skip(self, text))]
    pub async fn reply(
        &self,
        teacher: ChatHandle,
        text: &str,
    ) -> Result<ReplyOutcome, AttendanceError> {
        let action = self
            .dialogs
            .apply(
                teacher,
                DialogEvent::Reply {
                    text: text.to_string(),
                },
            )
            .await;

        match action {
            DialogAction::OpenRound(class) => {
                let fan_out = self.open_round(teacher, class.clone()).await?;
                Ok(ReplyOutcome::Opened { class, fan_out })
            }
            DialogAction::RejectClass { requested, offered } => {
                tracing::info!(%requested, "Teacher chose an unknown class");
                Err(AttendanceError::UnknownClass { requested, offered })
            }
            DialogAction::Fallback => Ok(ReplyOutcome::NotChoosing),
            other => Err(unexpected(other)),
        }
    }

    /// Abandons class selection. Returns `false` if there was nothing to cancel.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, teacher: ChatHandle) -> Result<bool, AttendanceError> {
        match self.dialogs.apply(teacher, DialogEvent::Cancel).await {
            DialogAction::Cancelled => Ok(true),
            DialogAction::NothingToCancel => Ok(false),
            other => Err(unexpected(other)),
        }
    }

    async fn open_round(
        &self,
        teacher: ChatHandle,
        class: ClassName,
    ) -> Result<JoinHandle<FanOutReport>, AttendanceError> {
        let class_roster = self.roster.class(&class).ok_or_else(|| {
            AttendanceError::InvalidState(format!("class {} is not in the roster", class))
        })?;

        {
            let _guard = self.locks.lock(&class).await;
            let message = self
                .transport
                .send_message(teacher, &AttendanceRound::opening_text(class_roster), None)
                .await?;
            if let Err(e) = self.store.open_session(teacher, &class, message).await {
                tracing::warn!(%class, message_id = %message, error = %e, "Session message sent but round not stored");
                return Err(e.into());
            }
            tracing::info!(%class, message_id = %message, "Attendance round opened");
        }

        if let Err(e) = self.transport.send_message(teacher, SENDING_TEXT, None).await {
            tracing::warn!(%class, error = %e, "Failed to tell teacher the fan-out started");
        }

        Ok(self.fan_out.dispatch(class, teacher))
    }
}

fn unexpected(action: DialogAction) -> AttendanceError {
    AttendanceError::InvalidState(format!("unexpected dialog action {:?}", action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryIdentityStore, RecordingTransport};
    use crate::domain::attendance::DialogPhase;
    use crate::domain::foundation::{MessageRef, Username};

    const TEACHER: ChatHandle = ChatHandle::new(100);

    struct Fixture {
        store: Arc<InMemoryIdentityStore>,
        transport: Arc<RecordingTransport>,
        dialogs: Arc<DialogRegistry>,
        handler: AttendanceSessionHandler,
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingTransport::new())
    }

    fn fixture_with(transport: RecordingTransport) -> Fixture {
        let store = Arc::new(InMemoryIdentityStore::new());
        let transport = Arc::new(transport);
        let dialogs = Arc::new(DialogRegistry::new());
        let roster = Arc::new(
            Roster::from_json(r#"{"10A": {"Alice": "alice_u"}, "11B": {"Carol": "carol_u"}}"#)
                .unwrap(),
        );
        let handler = AttendanceSessionHandler::new(
            store.clone(),
            transport.clone(),
            roster,
            dialogs.clone(),
            Arc::new(KeyedLocks::new()),
        );
        Fixture {
            store,
            transport,
            dialogs,
            handler,
        }
    }

    fn ten_a() -> ClassName {
        ClassName::new("10A").unwrap()
    }

    #[tokio::test]
    async fn start_offers_roster_classes() {
        let f = fixture();

        f.handler.start(TEACHER).await.unwrap();

        let sent = f.transport.sent_to(TEACHER);
        assert_eq!(sent[0].text, CHOOSE_CLASS_TEXT);
        assert_eq!(
            sent[0].choices,
            Some(vec!["10A".to_string(), "11B".to_string()])
        );
        assert_eq!(f.dialogs.phase(TEACHER).await, DialogPhase::ChoosingClass);
    }

    #[tokio::test]
    async fn choosing_a_class_opens_the_round() {
        let f = fixture();
        f.store
            .register(&Username::new("alice_u").unwrap(), ChatHandle::new(1))
            .await
            .unwrap();
        f.handler.start(TEACHER).await.unwrap();

        let outcome = f.handler.reply(TEACHER, "10A").await.unwrap();
        let ReplyOutcome::Opened { class, fan_out } = outcome else {
            panic!("expected an opened round");
        };
        let report = fan_out.await.unwrap();

        assert_eq!(class, ten_a());
        assert_eq!(report.delivered.len(), 1);
        assert_eq!(f.store.get_active_class(TEACHER).await.unwrap(), Some(ten_a()));
        assert_eq!(f.store.get_active_teacher(&ten_a()).await.unwrap(), Some(TEACHER));

        let session = f.transport.sent_to(TEACHER)[1].clone();
        assert_eq!(session.text, "Attendance session for 10A:\n0/1 present");
        assert_eq!(
            f.store.get_session_message(&ten_a()).await.unwrap(),
            Some(session.message)
        );
        assert_eq!(f.transport.sent_to(TEACHER)[2].text, SENDING_TEXT);
        assert_eq!(f.dialogs.phase(TEACHER).await, DialogPhase::Idle);
    }

    #[tokio::test]
    async fn unknown_class_is_rejected_without_mapping() {
        let f = fixture();
        f.handler.start(TEACHER).await.unwrap();

        let result = f.handler.reply(TEACHER, "99Z").await;

        assert!(matches!(
            result,
            Err(AttendanceError::UnknownClass { ref requested, .. }) if requested == "99Z"
        ));
        assert_eq!(f.store.get_active_class(TEACHER).await.unwrap(), None);
        assert_eq!(
            f.store
                .get_active_teacher(&ClassName::new("99Z").unwrap())
                .await
                .unwrap(),
            None
        );
        assert_eq!(f.dialogs.phase(TEACHER).await, DialogPhase::ChoosingClass);
    }

    #[tokio::test]
    async fn text_while_idle_is_not_a_selection() {
        let f = fixture();
        let outcome = f.handler.reply(TEACHER, "10A").await.unwrap();
        assert!(matches!(outcome, ReplyOutcome::NotChoosing));
        assert_eq!(f.store.get_active_class(TEACHER).await.unwrap(), None);
    }

    #[tokio::test]
    async fn cancel_returns_to_idle_without_side_effects() {
        let f = fixture();
        f.handler.start(TEACHER).await.unwrap();

        assert!(f.handler.cancel(TEACHER).await.unwrap());
        assert!(!f.handler.cancel(TEACHER).await.unwrap());

        assert_eq!(f.store.get_active_class(TEACHER).await.unwrap(), None);
        let outcome = f.handler.reply(TEACHER, "10A").await.unwrap();
        assert!(matches!(outcome, ReplyOutcome::NotChoosing));
    }

    #[tokio::test]
    async fn second_session_moves_teacher_and_leaves_stale_pointer() {
        let f = fixture();
        let eleven_b = ClassName::new("11B").unwrap();

        f.handler.start(TEACHER).await.unwrap();
        f.handler.reply(TEACHER, "10A").await.unwrap();
        f.handler.start(TEACHER).await.unwrap();
        f.handler.reply(TEACHER, "11B").await.unwrap();

        assert_eq!(f.store.get_active_class(TEACHER).await.unwrap(), Some(eleven_b));
        assert_eq!(f.store.get_active_teacher(&ten_a()).await.unwrap(), Some(TEACHER));
    }

    #[tokio::test]
    async fn new_round_replaces_session_message() {
        let f = fixture();
        f.store
            .set_session_message(&ten_a(), MessageRef::new(999))
            .await
            .unwrap();

        f.handler.start(TEACHER).await.unwrap();
        f.handler.reply(TEACHER, "10A").await.unwrap();

        assert_ne!(
            f.store.get_session_message(&ten_a()).await.unwrap(),
            Some(MessageRef::new(999))
        );
    }

    #[tokio::test]
    async fn failed_session_message_leaves_previous_round_untouched() {
        let previous = ChatHandle::new(200);
        let f = fixture_with(RecordingTransport::new().failing_for(TEACHER));
        f.store
            .open_session(previous, &ten_a(), MessageRef::new(2))
            .await
            .unwrap();
        f.store
            .record_acknowledgement(&ten_a(), &Username::new("alice_u").unwrap())
            .await
            .unwrap();

        // The class offer itself fails to send, but the dialog is already choosing.
        assert!(f.handler.start(TEACHER).await.is_err());
        let result = f.handler.reply(TEACHER, "10A").await;

        assert!(matches!(result, Err(AttendanceError::Transport(_))));
        assert_eq!(f.store.get_active_class(TEACHER).await.unwrap(), None);
        assert_eq!(f.store.get_active_teacher(&ten_a()).await.unwrap(), Some(previous));
        assert_eq!(
            f.store.get_session_message(&ten_a()).await.unwrap(),
            Some(MessageRef::new(2))
        );
        assert_eq!(f.store.acknowledged_students(&ten_a()).await.unwrap().len(), 1);
    }
}
