//! # Supervisor: runs one listener per binding and aggregates the outcome.
//!
//! The [`Supervisor`] owns the event bus, the [`SubscriberSet`], the
//! [`StateTracker`] and the shared [`Source`](crate::Source) /
//! [`Sink`](crate::Sink) handles. It does no decoding or sink I/O itself.
//!
//! ## High-level architecture
//! ```text
//! run(bindings, ctx):
//!   validate_bindings() ── Err ──► RelayError::Configuration   (nothing spawned)
//!         │
//!         ▼
//!   ChannelBinding[0]  ChannelBinding[1]  ...  ChannelBinding[N-1]
//!         │                  │                        │
//!         └──► ListenerTask::new(binding, source, sink, bus)
//!                  └──► JoinSet::spawn(catch_unwind(task.run(token)))
//!
//! Event flow:
//!   ListenerTask ── publish(Event) ──► Bus ──► subscriber_listener ──► StateTracker::update
//!                                                              └────► SubscriberSet::emit
//!
//! Join loop:
//!   join_next_with_id() → task id → channel, removed from pending
//!     outcome Err / escaped panic → AggregatedFault::push (termination order)
//!   all joined → AggregatedFault::into_result()
//!
//! Shutdown path (ctx cancelled):
//!   Bus.publish(ShutdownRequested)
//!   wait_all_with_grace(cfg.grace):
//!     ├─ all joined    → Bus.publish(AllStoppedWithin) → faults so far
//!     └─ timeout       → Bus.publish(GraceExceeded), abort rest
//!                        → RelayError::GraceExceeded { stuck, faults }
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use logrelay::{
//!     Category, ChannelBinding, Config, LogRecord, MemorySource, Sink, Supervisor,
//!     WriteFault,
//! };
//!
//! struct Discard;
//!
//! #[async_trait]
//! impl Sink for Discard {
//!     async fn write(&self, _ctx: CancellationToken, _record: LogRecord) -> Result<(), WriteFault> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(MemorySource::new());
//!     let sup = Supervisor::builder(Config::default(), source.clone(), Arc::new(Discard))
//!         .without_log_writer()
//!         .build();
//!
//!     let bindings = vec![ChannelBinding::new("logs:error", Category::Error)];
//!     let ctx = CancellationToken::new();
//!     ctx.cancel();
//!     sup.run(bindings, ctx).await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        Config, SupervisorBuilder,
        listener::ListenerTask,
        shutdown,
        tracker::{ListenerState, StateTracker},
    },
    error::{AggregatedFault, RelayError, SubscriptionFault, panic_message},
    events::{Bus, Event, EventKind},
    records::{ChannelBinding, validate_bindings},
    sink::SinkRef,
    source::SourceRef,
    subscribers::SubscriberSet,
};

type Joined = Result<(), SubscriptionFault>;

/// Coordinates listeners, event delivery and graceful shutdown.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    tracker: Arc<StateTracker>,
    source: SourceRef,
    sink: SinkRef,
    lifetime: CancellationToken,
}

impl Supervisor {
    /// Starts building a supervisor around the shared source and sink.
    pub fn builder(cfg: Config, source: SourceRef, sink: SinkRef) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg, source, sink)
    }

    /// Wires the supervisor and starts forwarding bus events to `subs`.
    ///
    /// Must be called inside a tokio runtime.
    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        source: SourceRef,
        sink: SinkRef,
    ) -> Self {
        let sup = Self {
            cfg,
            bus,
            subs,
            tracker: Arc::new(StateTracker::new()),
            source,
            sink,
            lifetime: CancellationToken::new(),
        };
        sup.subscriber_listener();
        sup
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus shared with all listeners.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Last known state of every listener, sorted by channel.
    ///
    /// Eventually consistent with the listeners.
    pub async fn states(&self) -> Vec<(String, ListenerState)> {
        self.tracker.snapshot().await
    }

    /// Runs one listener per binding until all of them end or `ctx` is cancelled.
    ///
    /// # Errors
    /// - [`RelayError::Configuration`] if `bindings` is empty or invalid; nothing is spawned.
    /// - [`RelayError::Listeners`] if any listener faulted, in termination order.
    /// - [`RelayError::GraceExceeded`] if listeners outlived [`Config::grace`] after cancellation.
    pub async fn run(
        &self,
        bindings: Vec<ChannelBinding>,
        ctx: CancellationToken,
    ) -> Result<(), RelayError> {
        validate_bindings(&bindings)?;

        let token = ctx.child_token();
        let mut set = JoinSet::new();
        let mut pending = HashMap::new();
        for binding in bindings {
            self.tracker.register(binding.channel()).await;
            let channel = binding.channel_arc();
            let id = self.spawn_listener(&mut set, binding, token.child_token());
            pending.insert(id, channel);
        }

        let mut faults = AggregatedFault::new();
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.bus.publish(Event::new(EventKind::ShutdownRequested));
                    return self.wait_all_with_grace(&mut set, pending, faults).await;
                }
                joined = set.join_next_with_id() => match joined {
                    Some(joined) => absorb(&self.bus, joined, &mut pending, &mut faults),
                    None => break,
                },
            }
        }
        faults.into_result()
    }

    /// Like [`run`](Self::run), cancelled by SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere).
    pub async fn run_until_signal(&self, bindings: Vec<ChannelBinding>) -> Result<(), RelayError> {
        let token = CancellationToken::new();
        let run = self.run(bindings, token.clone());
        tokio::pin!(run);

        tokio::select! {
            res = &mut run => res,
            sig = shutdown::wait_for_shutdown_signal() => {
                match sig {
                    Ok(()) => token.cancel(),
                    Err(err) => tracing::warn!(error = %err, "signal handlers unavailable; running until listeners stop"),
                }
                run.await
            }
        }
    }

    /// Forwards bus events to the state tracker and the subscriber set.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        let tracker = Arc::clone(&self.tracker);
        let lifetime = self.lifetime.clone();

        tokio::spawn(async move {
            loop {
                let ev = tokio::select! {
                    _ = lifetime.cancelled() => break,
                    ev = rx.recv() => ev,
                };
                match ev {
                    Ok(ev) => {
                        tracker.update(&ev).await;
                        subs.emit(ev);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "event listener lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Spawns `binding`'s listener with a panic boundary around the whole task.
    fn spawn_listener(
        &self,
        set: &mut JoinSet<Joined>,
        binding: ChannelBinding,
        token: CancellationToken,
    ) -> Id {
        let channel = binding.channel_arc();
        let category = binding.category();
        let bus = self.bus.clone();
        let task = ListenerTask::new(
            binding,
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            bus.clone(),
        );

        set.spawn(async move {
            match AssertUnwindSafe(task.run(token)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let fault = SubscriptionFault::Panicked {
                        channel,
                        info: panic_message(&*panic),
                    };
                    bus.publish(faulted(&fault).with_category(category));
                    Err(fault)
                }
            }
        })
        .id()
    }

    /// Waits for remaining listeners up to [`Config::grace`].
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] on timeout and aborts the stragglers.
    async fn wait_all_with_grace(
        &self,
        set: &mut JoinSet<Joined>,
        mut pending: HashMap<Id, Arc<str>>,
        mut faults: AggregatedFault,
    ) -> Result<(), RelayError> {
        let grace = self.cfg.grace;
        let done = async {
            while let Some(joined) = set.join_next_with_id().await {
                absorb(&self.bus, joined, &mut pending, &mut faults);
            }
        };

        match tokio::time::timeout(grace, done).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                faults.into_result()
            }
            Err(_) => {
                let mut stuck: Vec<String> = pending.values().map(|c| c.to_string()).collect();
                stuck.sort_unstable();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")),
                );
                set.abort_all();
                Err(RelayError::GraceExceeded {
                    grace,
                    stuck,
                    faults,
                })
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

/// Records one joined listener, removing it from `pending`.
///
/// A panic that escaped the listener's own boundary is still reported as
/// [`SubscriptionFault::Panicked`] for its channel.
fn absorb(
    bus: &Bus,
    joined: Result<(Id, Joined), JoinError>,
    pending: &mut HashMap<Id, Arc<str>>,
    faults: &mut AggregatedFault,
) {
    match joined {
        Ok((id, outcome)) => {
            pending.remove(&id);
            if let Err(fault) = outcome {
                faults.push(fault);
            }
        }
        Err(err) => {
            let Some(channel) = pending.remove(&err.id()) else {
                tracing::error!(error = %err, "unknown listener task did not complete");
                return;
            };
            if !err.is_panic() {
                tracing::error!(channel = %channel, error = %err, "listener task cancelled");
                return;
            }
            let fault = SubscriptionFault::Panicked {
                channel,
                info: panic_message(&*err.into_panic()),
            };
            bus.publish(faulted(&fault));
            faults.push(fault);
        }
    }
}

fn faulted(fault: &SubscriptionFault) -> Event {
    Event::new(EventKind::ListenerFaulted)
        .with_channel(fault.channel())
        .with_reason(fault.to_string())
}
