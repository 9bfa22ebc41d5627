//! # In-memory subscription source.
//!
//! Reference implementation of [`Source`] semantics with no broker:
//! - subscriptions are registered immediately;
//! - a publish reaches every live stream of that exact channel name;
//! - closing a channel ends its streams, like an upstream disconnect;
//! - subscribe failures can be injected per channel.
//!
//! Used by tests and for running the relay without Redis.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::SubscriptionFault;
use crate::source::{MessageStream, Source};

const DEFAULT_INBOX: usize = 64;

/// In-process pub/sub source.
pub struct MemorySource {
    inbox_capacity: usize,
    channels: RwLock<HashMap<Arc<str>, Vec<mpsc::Sender<Bytes>>>>,
    failing: RwLock<HashMap<Arc<str>, String>>,
    subscribe_calls: AtomicUsize,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::with_inbox_capacity(DEFAULT_INBOX)
    }

    /// Creates an empty source whose streams buffer up to `capacity` payloads.
    pub fn with_inbox_capacity(capacity: usize) -> Self {
        Self {
            inbox_capacity: capacity.max(1),
            channels: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashMap::new()),
            subscribe_calls: AtomicUsize::new(0),
        }
    }

    /// Delivers `payload` to every live stream on `channel`.
    ///
    /// Waits for queue space. Returns the number of streams reached.
    pub async fn publish(&self, channel: &str, payload: impl Into<Bytes>) -> usize {
        let payload = payload.into();
        let senders = {
            let map = self.channels.read().await;
            map.get(channel).cloned().unwrap_or_default()
        };

        let mut delivered = 0;
        for tx in senders {
            if tx.send(payload.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Ends every stream on `channel`.
    pub async fn close_channel(&self, channel: &str) {
        self.channels.write().await.remove(channel);
    }

    /// Ends every stream on every channel.
    pub async fn close_all(&self) {
        self.channels.write().await.clear();
    }

    /// Makes future subscribe calls for `channel` fail with `reason`.
    pub async fn fail_subscriptions(&self, channel: &str, reason: impl Into<String>) {
        self.failing
            .write()
            .await
            .insert(Arc::from(channel), reason.into());
    }

    /// Number of subscribe calls seen so far, failed ones included.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Number of open streams on `channel`.
    pub async fn live_subscribers(&self, channel: &str) -> usize {
        let map = self.channels.read().await;
        map.get(channel)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn subscribe(&self, channel: &str) -> Result<MessageStream, SubscriptionFault> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.failing.read().await.get(channel) {
            return Err(SubscriptionFault::Subscribe {
                channel: Arc::from(channel),
                error: reason.clone(),
            });
        }

        let (tx, rx) = mpsc::channel(self.inbox_capacity);

        let mut map = self.channels.write().await;
        let senders = map.entry(Arc::from(channel)).or_default();
        senders.retain(|s| !s.is_closed());
        senders.push(tx);

        Ok(MessageStream::new(rx, CancellationToken::new()))
    }
}
