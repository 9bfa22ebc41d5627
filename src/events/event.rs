//! # Runtime events emitted by the supervisor and listeners.
//!
//! The [`EventKind`] enum classifies event types across four groups:
//! - **Listener lifecycle**: subscribing, active, closed, faulted
//! - **Per-message**: dispatched, decode failed, write failed, panicked
//! - **Shutdown**: requested, all stopped within grace, grace exceeded
//! - **Subscriber health**: overflow, panic
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use logrelay::{Category, Event, EventKind};
//!
//! let ev = Event::new(EventKind::WriteFailed)
//!     .with_channel("logs:warning")
//!     .with_category(Category::Warning)
//!     .with_record_id("42")
//!     .with_reason("status 503");
//!
//! assert_eq!(ev.kind, EventKind::WriteFailed);
//! assert_eq!(ev.channel.as_deref(), Some("logs:warning"));
//! assert_eq!(ev.reason.as_deref(), Some("status 503"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::records::Category;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `subscriber`, `reason`.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `subscriber`, `reason`.
    SubscriberOverflow,

    // === Shutdown events ===
    /// Run context was cancelled.
    ShutdownRequested,

    /// All listeners stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; remaining listeners were aborted.
    GraceExceeded,

    // === Listener lifecycle ===
    /// Listener is opening its subscription.
    ///
    /// Sets `channel`, `category`.
    ListenerSubscribing,

    /// Subscription established; listener is receiving.
    ///
    /// Sets `channel`, `category`.
    ListenerActive,

    /// Subscription closed (upstream end or cancellation). Terminal.
    ///
    /// Sets `channel`, `category`.
    ListenerClosed,

    /// Subscription failed unrecoverably. Terminal.
    ///
    /// Sets `channel`, `category`, `reason`.
    ListenerFaulted,

    // === Per-message ===
    /// Record was written by the sink.
    ///
    /// Sets `channel`, `category`, `record_id`.
    RecordDispatched,

    /// Payload could not be decoded; skipped.
    ///
    /// Sets `channel`, `category`, `reason`.
    DecodeFailed,

    /// Sink rejected the record; skipped.
    ///
    /// Sets `channel`, `category`, `record_id`, `reason`.
    WriteFailed,

    /// Message processing panicked; listener keeps receiving.
    ///
    /// Sets `channel`, `category`, `reason`.
    ListenerPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Channel of the listener, if applicable.
    pub channel: Option<Arc<str>>,
    /// Category of the listener, if applicable.
    pub category: Option<Category>,
    /// Identifier of the record involved.
    pub record_id: Option<Arc<str>>,
    /// Subscriber name (subscriber events only).
    pub subscriber: Option<&'static str>,
    /// Human-readable reason (errors, panic info, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            channel: None,
            category: None,
            record_id: None,
            subscriber: None,
            reason: None,
        }
    }

    /// Attaches a channel name.
    #[inline]
    pub fn with_channel(mut self, channel: impl Into<Arc<str>>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Attaches a category.
    #[inline]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Attaches a record identifier.
    #[inline]
    pub fn with_record_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.record_id = Some(id.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }
}
