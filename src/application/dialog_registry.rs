//! Per-teacher dialog state.
//!
//! Holds the [`TeacherDialog`] of every teacher that is not idle. Transitions
//! run under one async mutex, so a teacher's events apply one at a time and a
//! class reply is consumed by exactly one event.

use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::attendance::{DialogAction, DialogEvent, DialogPhase, TeacherDialog};
use crate::domain::foundation::ChatHandle;

#[derive(Debug, Default)]
pub struct DialogRegistry {
    dialogs: Mutex<HashMap<ChatHandle, TeacherDialog>>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `event` to the teacher's dialog and returns the action to run.
    pub async fn apply(&self, teacher: ChatHandle, event: DialogEvent) -> DialogAction {
        let mut dialogs = self.dialogs.lock().await;
        let current = dialogs.remove(&teacher).unwrap_or_default();
        let from = current.phase();
        let (next, action) = current.handle(event);

        if next.phase() != from {
            tracing::debug!(%teacher, from = %from, to = %next.phase(), "Dialog transition");
        }
        if next.phase() != DialogPhase::Idle {
            dialogs.insert(teacher, next);
        }
        action
    }

    pub async fn phase(&self, teacher: ChatHandle) -> DialogPhase {
        self.dialogs
            .lock()
            .await
            .get(&teacher)
            .map(TeacherDialog::phase)
            .unwrap_or_default()
    }
}
