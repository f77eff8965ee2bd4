//! EventTasks - in-flight event handling, tracked so shutdown can drain it.
//!
//! Each inbound event runs in its own task on a `JoinSet`. A task only ends
//! once the event's fan-out (if it opened a round) has finished too, so
//! draining the set before closing the store leaves no round half-written and
//! no prompt unsent.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use super::AttendanceBot;
use crate::ports::InboundEvent;

pub struct EventTasks {
    bot: Arc<AttendanceBot>,
    tasks: JoinSet<()>,
}

impl EventTasks {
    pub fn new(bot: Arc<AttendanceBot>) -> Self {
        Self {
            bot,
            tasks: JoinSet::new(),
        }
    }

    /// Handles `event` in a new task.
    pub fn spawn(&mut self, event: InboundEvent) {
        let bot = self.bot.clone();
        self.tasks.spawn(async move {
            bot.dispatch(event).await.finish().await;
        });
    }

    /// Number of events still being handled.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for the next task to finish. Returns `None` when none are left.
    pub async fn join_next(&mut self) -> Option<()> {
        let result = self.tasks.join_next().await?;
        if let Err(e) = result {
            if e.is_panic() {
                tracing::error!(error = %e, "Event task panicked");
            }
        }
        Some(())
    }

    /// Waits up to `grace` for every in-flight event, then aborts the rest.
    ///
    /// Returns how many tasks had to be aborted.
    pub async fn drain(&mut self, grace: Duration) -> usize {
        let pending = self.tasks.len();
        if pending > 0 {
            tracing::info!(pending, "Waiting for in-flight events");
        }

        let finished = tokio::time::timeout(grace, async {
            while self.join_next().await.is_some() {}
        })
        .await;
        if finished.is_ok() {
            return 0;
        }

        let aborted = self.tasks.len();
        tracing::warn!(aborted, grace_secs = grace.as_secs(), "Aborting events still in flight");
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        aborted
    }
}
