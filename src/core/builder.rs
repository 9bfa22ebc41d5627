use std::sync::Arc;

use crate::{
    core::{Config, supervisor::Supervisor},
    events::Bus,
    sink::SinkRef,
    source::SourceRef,
    subscribers::{LogWriter, Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: Config,
    source: SourceRef,
    sink: SinkRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
    log_writer: bool,
}

impl SupervisorBuilder {
    /// Creates a new builder around the shared source and sink.
    pub fn new(cfg: Config, source: SourceRef, sink: SinkRef) -> Self {
        Self {
            cfg,
            source,
            sink,
            subscribers: Vec::new(),
            log_writer: true,
        }
    }

    /// Sets additional event subscribers.
    ///
    /// Subscribers receive runtime events (listener lifecycle, per-message
    /// outcomes, shutdown) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Does not install the default [`LogWriter`].
    pub fn without_log_writer(mut self) -> Self {
        self.log_writer = false;
        self
    }

    /// Builds the supervisor and spawns the subscriber workers.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Supervisor {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let mut subscribers = self.subscribers;
        if self.log_writer {
            subscribers.push(Arc::new(LogWriter::new()));
        }
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));

        Supervisor::new_internal(self.cfg, bus, subs, self.source, self.sink)
    }
}
