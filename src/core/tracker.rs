//! # Listener state tracker with sequence-based ordering.
//!
//! Follows each listener through
//! `Idle → Subscribing → Active → {Closed | Faulted}` from the event stream.
//!
//! ## Architecture
//! ```text
//! Listener ──► Bus ──► subscriber_listener() ──► StateTracker::update()
//!                                                       │
//!                                                       ▼
//!                                          HashMap<channel, {seq, state}>
//! ```
//!
//! ## Rules
//! - Only lifecycle events change state; other events only advance `seq`
//! - Events with `seq <= last_seq` are **rejected** (stale)
//! - Terminal states are never left
//! - Reads are **eventually consistent** with the listeners

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

/// Lifecycle state of one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Registered, not started.
    Idle,
    /// Opening the subscription.
    Subscribing,
    /// Receiving messages.
    Active,
    /// Subscription closed. Terminal.
    Closed,
    /// Subscription failed. Terminal.
    Faulted,
}

impl ListenerState {
    /// True for `Closed` and `Faulted`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ListenerState::Closed | ListenerState::Faulted)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    last_seq: u64,
    state: ListenerState,
}

/// Thread-safe tracker of listener states keyed by channel.
pub struct StateTracker {
    state: RwLock<HashMap<String, Entry>>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `channel` as `Idle`, resetting any previous entry.
    pub async fn register(&self, channel: &str) {
        self.state.write().await.insert(
            channel.to_string(),
            Entry {
                last_seq: 0,
                state: ListenerState::Idle,
            },
        );
    }

    /// Applies `ev` if it is newer than the last event seen for its channel.
    ///
    /// Returns `true` when the state changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let Some(channel) = ev.channel.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(channel.to_string()).or_insert(Entry {
            last_seq: 0,
            state: ListenerState::Idle,
        });

        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;

        let next = match ev.kind {
            EventKind::ListenerSubscribing => ListenerState::Subscribing,
            EventKind::ListenerActive => ListenerState::Active,
            EventKind::ListenerClosed => ListenerState::Closed,
            EventKind::ListenerFaulted => ListenerState::Faulted,
            _ => return false,
        };
        if entry.state.is_terminal() || entry.state == next {
            return false;
        }
        entry.state = next;
        true
    }

    /// All channels with their state, sorted by channel.
    pub async fn snapshot(&self) -> Vec<(String, ListenerState)> {
        let state = self.state.read().await;
        let mut all: Vec<_> = state
            .iter()
            .map(|(name, e)| (name.clone(), e.state))
            .collect();
        all.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        all
    }
}
