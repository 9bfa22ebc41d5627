//! # ListenerTask: one subscription, one channel.
//!
//! Owns a single subscription for the lifetime of a run and feeds every
//! message through [`dispatch_once`].
//!
//! ## Lifecycle
//! ```text
//! ListenerSubscribing ──► source.subscribe(channel)
//!        │                    ├─ Err ─────────────► ListenerFaulted  (returns SubscriptionFault)
//!        │                    └─ Ok(stream)
//!        ▼
//! ListenerActive
//!   loop {
//!     select (biased) {
//!       token.cancelled()  → break
//!       stream.recv()      → None: break
//!                          → Some(payload): dispatch_once (panic → ListenerPanicked)
//!     }
//!   }
//! stream.close() ──► ListenerClosed                 (returns Ok)
//! ```
//!
//! ## Rules
//! - Messages from one channel are handled **one at a time**, in delivery order
//! - Decode/write failures and panics in the message body never end the loop
//! - The sink call is awaited to completion; it receives a child of the run token
//! - Cancellation is observed between messages and while subscribing

use std::panic::AssertUnwindSafe;

use bytes::Bytes;
use futures::FutureExt;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    core::dispatch::dispatch_once,
    error::{SubscriptionFault, panic_message},
    events::{Bus, Event, EventKind},
    records::ChannelBinding,
    sink::SinkRef,
    source::{MessageStream, SourceRef},
};

/// Per-channel unit of concurrent execution.
pub struct ListenerTask {
    binding: ChannelBinding,
    source: SourceRef,
    sink: SinkRef,
    bus: Bus,
}

impl ListenerTask {
    /// Creates a listener for `binding`.
    pub fn new(binding: ChannelBinding, source: SourceRef, sink: SinkRef, bus: Bus) -> Self {
        Self {
            binding,
            source,
            sink,
            bus,
        }
    }

    /// Binding this listener serves.
    pub fn binding(&self) -> &ChannelBinding {
        &self.binding
    }

    /// Runs until the subscription closes, `token` is cancelled, or subscribing fails.
    ///
    /// # Errors
    /// Returns [`SubscriptionFault`] if the subscription cannot be established.
    pub async fn run(self, token: CancellationToken) -> Result<(), SubscriptionFault> {
        self.publish(EventKind::ListenerSubscribing);

        let subscribed = select! {
            biased;
            _ = token.cancelled() => None,
            res = self.source.subscribe(self.binding.channel()) => Some(res),
        };
        let stream = match subscribed {
            None => {
                self.publish(EventKind::ListenerClosed);
                return Ok(());
            }
            Some(Err(fault)) => {
                self.bus
                    .publish(self.event(EventKind::ListenerFaulted).with_reason(fault.to_string()));
                return Err(fault);
            }
            Some(Ok(stream)) => stream,
        };

        self.publish(EventKind::ListenerActive);
        self.pump(stream, &token).await;
        self.publish(EventKind::ListenerClosed);
        Ok(())
    }

    async fn pump(&self, mut stream: MessageStream, token: &CancellationToken) {
        loop {
            let payload = select! {
                biased;
                _ = token.cancelled() => break,
                next = stream.recv() => match next {
                    Some(payload) => payload,
                    None => break,
                },
            };
            self.handle(payload, token).await;
        }
        stream.close();
    }

    async fn handle(&self, payload: Bytes, token: &CancellationToken) {
        let fut = dispatch_once(
            self.sink.as_ref(),
            &self.binding,
            payload,
            token.child_token(),
            &self.bus,
        );
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            self.bus.publish(
                self.event(EventKind::ListenerPanicked)
                    .with_reason(panic_message(&*panic)),
            );
        }
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_channel(self.binding.channel_arc())
            .with_category(self.binding.category())
    }

    fn publish(&self, kind: EventKind) {
        self.bus.publish(self.event(kind));
    }
}
