//! AcknowledgeHandler - a student marks themselves present.
//!
//! The acknowledgement is recorded in the store first; the session message is
//! edited only when the student was newly added, so repeated acknowledgements
//! never touch the message. Edits of one class are serialized by the class
//! lock and always render the full stored set, so a slower edit can never
//! overwrite a newer one.
//!
//! The edit goes to the chat stored as the class's active teacher. If that
//! teacher has since moved on to another class the pointer is stale and the
//! edit lands on the old session message (last writer wins).

use std::sync::Arc;

use crate::application::KeyedLocks;
use crate::domain::attendance::{AttendanceError, AttendanceRound};
use crate::domain::foundation::{ClassName, Username};
use crate::domain::roster::Roster;
use crate::ports::{ChatTransport, ChatUser, IdentityStore};

pub const MARKED_TEXT: &str = "Attendance marked!";
pub const ALREADY_MARKED_TEXT: &str = "Your attendance is already marked.";

/// Result of a successful acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledged {
    pub username: Username,
    pub class: ClassName,
    /// `false` if the student had already acknowledged this round.
    pub newly_recorded: bool,
}

impl Acknowledged {
    /// Confirmation sent back to the student.
    pub fn reply_text(&self) -> &'static str {
        if self.newly_recorded {
            MARKED_TEXT
        } else {
            ALREADY_MARKED_TEXT
        }
    }
}

pub struct AcknowledgeHandler {
    store: Arc<dyn IdentityStore>,
    transport: Arc<dyn ChatTransport>,
    roster: Arc<Roster>,
    locks: Arc<KeyedLocks<ClassName>>,
}

impl AcknowledgeHandler {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        transport: Arc<dyn ChatTransport>,
        roster: Arc<Roster>,
        locks: Arc<KeyedLocks<ClassName>>,
    ) -> Self {
        Self {
            store,
            transport,
            roster,
            locks,
        }
    }

    /// Records the student's acknowledgement against their class's round.
    ///
    /// # Errors
    ///
    /// - `MissingUsername` if the student has no username
    /// - `NotEnrolled` if the username belongs to no class
    /// - `NoActiveSession` if the class has no open round
    #[tracing::instrument(skip(self, student), fields(chat = %student.handle))]
    pub async fn handle(&self, student: &ChatUser) -> Result<Acknowledged, AttendanceError> {
        let username = student
            .username
            .clone()
            .ok_or(AttendanceError::MissingUsername)?;

        let class = self
            .store
            .get_student_class(&username)
            .await?
            .ok_or_else(|| AttendanceError::NotEnrolled(username.clone()))?;
        let class_roster = self
            .roster
            .class(&class)
            .ok_or_else(|| AttendanceError::NotEnrolled(username.clone()))?;

        let _guard = self.locks.lock(&class).await;

        let message = self.store.get_session_message(&class).await?;
        let teacher = self.store.get_active_teacher(&class).await?;
        let (Some(message), Some(teacher)) = (message, teacher) else {
            return Err(AttendanceError::NoActiveSession(class));
        };

        let newly_recorded = self.store.record_acknowledgement(&class, &username).await?;
        if newly_recorded {
            let acknowledged = self.store.acknowledged_students(&class).await?;
            let round =
                AttendanceRound::reconstitute(class.clone(), teacher, message, acknowledged);
            // The acknowledgement is durable even if the edit fails.
            if let Err(e) = self
                .transport
                .edit_message(teacher, message, &round.render(class_roster))
                .await
            {
                tracing::warn!(%class, %teacher, message_id = %message, error = %e, "Failed to edit session message");
            }
            tracing::info!(%username, %class, "Attendance recorded");
        } else {
            tracing::debug!(%username, %class, "Duplicate acknowledgement ignored");
        }

        Ok(Acknowledged {
            username,
            class,
            newly_recorded,
        })
    }
}
