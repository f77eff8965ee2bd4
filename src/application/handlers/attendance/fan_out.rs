//! FanOutDispatcher - sends the attendance prompt to every student of a class.
//!
//! The scatter runs in its own task so the teacher's handler returns
//! immediately. Students who never sent `/start` have no chat handle and are
//! reported as unreachable; failed deliveries are logged and reported. Nothing
//! is retried.

use futures::future::join_all;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::domain::foundation::{ChatHandle, ClassName, Username};
use crate::domain::roster::{Roster, Student};
use crate::ports::{ChatTransport, IdentityStore};

/// Per-student result of one fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No chat handle is known for the student.
    Unreachable,
    Failed(String),
}

/// What happened to each student of the class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: Vec<Username>,
    pub unreachable: Vec<Username>,
    pub failed: Vec<Username>,
}

impl FanOutReport {
    pub fn total(&self) -> usize {
        self.delivered.len() + self.unreachable.len() + self.failed.len()
    }

    fn record(&mut self, username: Username, delivery: Delivery) {
        match delivery {
            Delivery::Delivered => self.delivered.push(username),
            Delivery::Unreachable => self.unreachable.push(username),
            Delivery::Failed(_) => self.failed.push(username),
        }
    }

    /// Message sent to the teacher once the fan-out finishes.
    pub fn summary(&self, class: &ClassName) -> String {
        let mut text = format!(
            "Attendance prompt for {} sent to {}/{} students.",
            class,
            self.delivered.len(),
            self.total()
        );
        if !self.unreachable.is_empty() {
            let _ = write!(
                text,
                "\nNot reachable (never sent /start): {}",
                mentions(&self.unreachable)
            );
        }
        if !self.failed.is_empty() {
            let _ = write!(text, "\nDelivery failed: {}", mentions(&self.failed));
        }
        text
    }
}

fn mentions(usernames: &[Username]) -> String {
    usernames
        .iter()
        .map(|u| format!("@{}", u))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Text of the prompt each student receives.
pub fn prompt_text(class: &ClassName) -> String {
    format!(
        "Attendance for {} has started. Send /mark_attendance to mark yourself present.",
        class
    )
}

#[derive(Clone)]
pub struct FanOutDispatcher {
    store: Arc<dyn IdentityStore>,
    transport: Arc<dyn ChatTransport>,
    roster: Arc<Roster>,
}

impl FanOutDispatcher {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        transport: Arc<dyn ChatTransport>,
        roster: Arc<Roster>,
    ) -> Self {
        Self {
            store,
            transport,
            roster,
        }
    }

    /// Spawns the fan-out for `class` and reports the result to `teacher`
    /// when it completes.
    pub fn dispatch(&self, class: ClassName, teacher: ChatHandle) -> JoinHandle<FanOutReport> {
        let this = self.clone();
        tokio::spawn(async move {
            let report = this.fan_out(&class).await;
            if let Err(e) = this
                .transport
                .send_message(teacher, &report.summary(&class), None)
                .await
            {
                tracing::warn!(%class, %teacher, error = %e, "Failed to send fan-out summary");
            }
            report
        })
    }

    /// Sends the prompt to every student of `class` concurrently.
    #[tracing::instrument(skip(self, class), fields(class = %class))]
    pub async fn fan_out(&self, class: &ClassName) -> FanOutReport {
        let Some(class_roster) = self.roster.class(class) else {
            tracing::warn!("Fan-out requested for a class outside the roster");
            return FanOutReport::default();
        };

        let prompt = prompt_text(class);
        let deliveries = join_all(
            class_roster
                .students()
                .iter()
                .map(|student| self.notify(student, &prompt)),
        )
        .await;

        let mut report = FanOutReport::default();
        for (student, delivery) in class_roster.students().iter().zip(deliveries) {
            report.record(student.username().clone(), delivery);
        }

        tracing::info!(
            delivered = report.delivered.len(),
            unreachable = report.unreachable.len(),
            failed = report.failed.len(),
            "Fan-out finished"
        );
        report
    }

    async fn notify(&self, student: &Student, prompt: &str) -> Delivery {
        let username = student.username();
        let handle = match self.store.lookup_chat_handle(username).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                tracing::warn!(%username, "Student has never started the bot, skipping");
                return Delivery::Unreachable;
            }
            Err(e) => {
                tracing::warn!(%username, error = %e, "Chat handle lookup failed");
                return Delivery::Failed(e.to_string());
            }
        };

        match self.transport.send_message(handle, prompt, None).await {
            Ok(_) => Delivery::Delivered,
            Err(e) => {
                tracing::warn!(%username, chat = %handle, error = %e, "Attendance prompt not delivered");
                Delivery::Failed(e.to_string())
            }
        }
    }
}
