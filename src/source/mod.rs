//! # Subscription sources.
//!
//! A [`Source`] opens one independent [`MessageStream`] per channel name. The
//! supervisor shares a single source between all listeners; each listener owns
//! its stream exclusively.
//!
//! ## Implementations
//! - [`MemorySource`] in-process reference semantics (always available)
//! - [`RedisSource`] Redis pub/sub (feature `redis`)

mod memory;
#[cfg(feature = "redis")]
mod redis;
mod stream;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SubscriptionFault;

pub use memory::MemorySource;
#[cfg(feature = "redis")]
pub use redis::RedisSource;
pub use stream::MessageStream;

/// Provider of per-channel subscriptions.
///
/// Implementations must allow concurrent `subscribe` calls for distinct channels.
#[async_trait]
pub trait Source: Send + Sync + 'static {
    /// Opens a subscription to `channel`.
    ///
    /// Once this returns `Ok`, payloads published afterwards on `channel` are
    /// deliverable through the stream.
    async fn subscribe(&self, channel: &str) -> Result<MessageStream, SubscriptionFault>;
}

/// Shared source handle.
pub type SourceRef = Arc<dyn Source>;
