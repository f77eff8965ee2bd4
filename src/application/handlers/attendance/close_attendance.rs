//! CloseAttendanceHandler - the teacher ends their open round.
//!
//! The session message is edited one last time to list who was present and
//! who never acknowledged, then every active mapping of the round is removed
//! in one store operation. Later acknowledgements for the class get "no
//! active session".

use std::sync::Arc;

use crate::application::KeyedLocks;
use crate::domain::attendance::{AttendanceError, AttendanceRound};
use crate::domain::foundation::{ChatHandle, ClassName};
use crate::domain::roster::{Roster, Student};
use crate::ports::{ChatTransport, IdentityStore};

/// Final tally of a closed round, by student label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReport {
    pub class: ClassName,
    pub present: Vec<String>,
    pub absent: Vec<String>,
}

impl CloseReport {
    /// Reply sent to the teacher.
    pub fn reply_text(&self) -> String {
        let mut text = format!(
            "Attendance for {} closed: {}/{} present.",
            self.class,
            self.present.len(),
            self.present.len() + self.absent.len()
        );
        if !self.absent.is_empty() {
            text.push_str(&format!("\nAbsent: {}", self.absent.join(", ")));
        }
        text
    }
}

pub struct CloseAttendanceHandler {
    store: Arc<dyn IdentityStore>,
    transport: Arc<dyn ChatTransport>,
    roster: Arc<Roster>,
    locks: Arc<KeyedLocks<ClassName>>,
}

impl CloseAttendanceHandler {
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

    /// Closes the round the teacher currently owns.
    ///
    /// # Errors
    ///
    /// - `NoOpenRound` if the teacher has no active class, or another teacher
    ///   has since taken the class over
    #[tracing::instrument(skip(self))]
    pub async fn handle(&self, teacher: ChatHandle) -> Result<CloseReport, AttendanceError> {
        let class = self
            .store
            .get_active_class(teacher)
            .await?
            .ok_or(AttendanceError::NoOpenRound)?;

        let _guard = self.locks.lock(&class).await;

        if self.store.get_active_teacher(&class).await? != Some(teacher) {
            tracing::info!(%class, "Class was taken over by another teacher, not closing");
            return Err(AttendanceError::NoOpenRound);
        }
        let message = self
            .store
            .get_session_message(&class)
            .await?
            .ok_or(AttendanceError::NoOpenRound)?;
        let class_roster = self.roster.class(&class).ok_or_else(|| {
            AttendanceError::InvalidState(format!("class {} is not in the roster", class))
        })?;

        let acknowledged = self.store.acknowledged_students(&class).await?;
        let mut round =
            AttendanceRound::reconstitute(class.clone(), teacher, message, acknowledged);
        round.close()?;

        if let Err(e) = self
            .transport
            .edit_message(teacher, message, &round.render(class_roster))
            .await
        {
            tracing::warn!(%class, message_id = %message, error = %e, "Failed to edit closed session message");
        }

        self.store.close_session(teacher, &class).await?;

        let report = CloseReport {
            present: labels(round.present(class_roster)),
            absent: labels(round.absent(class_roster)),
            class,
        };
        tracing::info!(
            class = %report.class,
            present = report.present.len(),
            absent = report.absent.len(),
            "Attendance round closed"
        );
        Ok(report)
    }
}

fn labels(students: Vec<&Student>) -> Vec<String> {
    students.iter().map(|s| s.label().to_string()).collect()
}
