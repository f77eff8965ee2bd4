//! UpdatePoller - Background service that long-polls for inbound messages.
//!
//! Each cycle asks the [`UpdateSource`] for updates past the last seen
//! `update_id`, converts the text messages into [`InboundEvent`]s and pushes
//! them onto a channel. Failed polls back off exponentially up to a cap.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_timeout` | 30s | Long-poll timeout passed to the source |
//! | `retry_delay` | 1s | First back-off after a failed poll |
//! | `max_retry_delay` | 60s | Back-off ceiling |
//!
//! ## Graceful Shutdown
//!
//! The poller stops when the shutdown signal flips to `true` or when the
//! event receiver is dropped. An in-flight long poll is abandoned.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use super::types::Update;
use crate::ports::{InboundEvent, TransportError};

/// Anything that can be long-polled for updates.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Returns updates with `update_id >= offset`, waiting up to `timeout`.
    async fn fetch_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TransportError>;
}

/// Configuration for the UpdatePoller service.
#[derive(Debug, Clone)]
pub struct UpdatePollerConfig {
    pub poll_timeout: Duration,
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
}

impl Default for UpdatePollerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(30),
            retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(60),
        }
    }
}

impl UpdatePollerConfig {
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }
}

/// Long-polling loop feeding inbound events to the dispatcher.
pub struct UpdatePoller {
    source: Arc<dyn UpdateSource>,
    config: UpdatePollerConfig,
    offset: i64,
}

impl UpdatePoller {
    pub fn new(source: Arc<dyn UpdateSource>) -> Self {
        Self::with_config(source, UpdatePollerConfig::default())
    }

    pub fn with_config(source: Arc<dyn UpdateSource>, config: UpdatePollerConfig) -> Self {
        Self {
            source,
            config,
            offset: 0,
        }
    }

    /// Next `update_id` the poller will ask for.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Run the polling loop until shutdown or until `events` is closed.
    pub async fn run(
        &mut self,
        events: mpsc::Sender<InboundEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut delay = self.config.retry_delay;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                outcome = self.poll_once() => outcome,
            };

            match outcome {
                Ok(batch) => {
                    delay = self.config.retry_delay;
                    for event in batch {
                        if events.send(event).await.is_err() {
                            tracing::info!("Event receiver dropped, stopping update poller");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, retry_in_ms = delay.as_millis() as u64, "Polling for updates failed");
                    tokio::select! {
                        _ = shutdown.changed() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                    delay = (delay * 2).min(self.config.max_retry_delay);
                }
            }
        }

        tracing::info!(offset = self.offset, "Update poller stopped");
    }

    /// Runs exactly one poll cycle and advances the offset past every update
    /// received, including ones that produce no event.
    pub async fn poll_once(&mut self) -> Result<Vec<InboundEvent>, TransportError> {
        let updates = self
            .source
            .fetch_updates(self.offset, self.config.poll_timeout)
            .await?;

        let mut events = Vec::with_capacity(updates.len());
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            if let Some(event) = update.into_event() {
                tracing::debug!(kind = event.kind(), chat = %event.user().handle, "Received update");
                events.push(event);
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Source that replays scripted poll results, then blocks forever.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<Update>, TransportError>>>,
        offsets: Mutex<Vec<i64>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<Update>, TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                offsets: Mutex::new(Vec::new()),
            }
        }

        fn offsets(&self) -> Vec<i64> {
            self.offsets.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UpdateSource for ScriptedSource {
        async fn fetch_updates(
            &self,
            offset: i64,
            _timeout: Duration,
        ) -> Result<Vec<Update>, TransportError> {
            self.offsets.lock().unwrap().push(offset);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }
    }

    fn text_update(id: i64, chat: i64, text: &str) -> Update {
        serde_json::from_value(json!({
            "update_id": id,
            "message": {
                "message_id": id,
                "from": { "id": chat, "username": format!("user{}", chat) },
                "chat": { "id": chat },
                "text": text
            }
        }))
        .unwrap()
    }

    fn bare_update(id: i64) -> Update {
        serde_json::from_value(json!({ "update_id": id })).unwrap()
    }

    fn fast_config() -> UpdatePollerConfig {
        UpdatePollerConfig::default()
            .with_retry_delay(Duration::from_millis(1))
            .with_max_retry_delay(Duration::from_millis(4))
    }

    #[tokio::test]
    async fn poll_once_advances_offset_past_skipped_updates() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![
            text_update(7, 1, "/start"),
            bare_update(8),
        ])]));
        let mut poller = UpdatePoller::new(source.clone());

        let events = poller.poll_once().await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "start");
        assert_eq!(poller.offset(), 9);
    }

    #[tokio::test]
    async fn run_forwards_events_and_recovers_from_errors() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(TransportError::network("connection reset")),
            Ok(vec![text_update(1, 10, "/start_attendance")]),
            Ok(vec![text_update(2, 11, "/mark_attendance")]),
        ]));
        let (tx, mut rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut poller = UpdatePoller::with_config(source.clone(), fast_config());
        let handle = tokio::spawn(async move {
            poller.run(tx, shutdown_rx).await;
            poller.offset()
        });

        assert_eq!(rx.recv().await.unwrap().kind(), "start_attendance");
        assert_eq!(rx.recv().await.unwrap().kind(), "mark_attendance");

        shutdown_tx.send(true).unwrap();
        let offset = handle.await.unwrap();

        assert_eq!(offset, 3);
        assert_eq!(&source.offsets()[..3], &[0, 0, 2]);
    }

    #[tokio::test]
    async fn run_stops_when_receiver_is_dropped() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![text_update(1, 10, "hi")])]));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut poller = UpdatePoller::new(source);
        poller.run(tx, shutdown_rx).await;

        assert_eq!(poller.offset(), 2);
    }
}
