//! # LogWriter: events as `tracing` records
//!
//! Installed by default by [`SupervisorBuilder`](crate::SupervisorBuilder).
//! Per-message failures are logged at `warn`, faults at `error`, and
//! successful dispatches at `debug`.

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let channel = e.channel.as_deref().unwrap_or("-");
        let category = e.category.map(|c| c.as_str()).unwrap_or("-");
        let record = e.record_id.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::ListenerSubscribing => {
                tracing::debug!(channel, category, "subscribing");
            }
            EventKind::ListenerActive => {
                tracing::info!(channel, category, "listening");
            }
            EventKind::ListenerClosed => {
                tracing::info!(channel, category, "subscription closed");
            }
            EventKind::ListenerFaulted => {
                tracing::error!(channel, category, reason, "listener faulted");
            }
            EventKind::RecordDispatched => {
                tracing::debug!(channel, category, record, "record written");
            }
            EventKind::DecodeFailed => {
                tracing::warn!(channel, category, reason, "payload skipped");
            }
            EventKind::WriteFailed => {
                tracing::warn!(channel, category, record, reason, "write failed");
            }
            EventKind::ListenerPanicked => {
                tracing::error!(channel, category, reason, "message handling panicked");
            }
            EventKind::ShutdownRequested => {
                tracing::info!("shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!("all listeners stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::error!("grace exceeded; aborting listeners");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = e.subscriber, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(subscriber = e.subscriber, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
