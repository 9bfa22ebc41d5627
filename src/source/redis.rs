//! Redis pub/sub subscription source.
//!
//! ## Connections
//! A single [`redis::Client`](::redis::Client) is shared by all listeners. Redis
//! dedicates a connection to pub/sub mode, so every `subscribe` opens its own
//! pub/sub connection from the shared client; channels never share a socket and
//! a stalled channel cannot hold up another.
//!
//! ## Pump
//! Each subscription spawns a pump task:
//! ```text
//! PubSub::into_on_message() ──► pump ──► mpsc (inbox_capacity) ──► MessageStream
//!                                 ▲
//!            stop token (stream close / drop) ─┘
//! ```
//! The pump exits when the stream is closed or dropped (the pub/sub connection is
//! dropped with it, which unsubscribes), or when the broker ends the stream.
//! A broker-side end closes the `MessageStream`, which the listener treats as an
//! upstream disconnect.
//!
//! Delivery is best-effort and non-durable: no replay, no acknowledgement.

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::RedisSettings;
use crate::error::SubscriptionFault;
use crate::source::{MessageStream, Source};

/// Subscription source backed by Redis pub/sub.
pub struct RedisSource {
    client: ::redis::Client,
    inbox_capacity: usize,
}

impl RedisSource {
    /// Opens a client for `settings` and checks the broker answers `PING`.
    ///
    /// # Errors
    /// Fails if the URL is invalid or the broker cannot be reached.
    pub async fn connect(
        settings: &RedisSettings,
        inbox_capacity: usize,
    ) -> Result<Self, ::redis::RedisError> {
        let url = settings.url();
        let client = ::redis::Client::open(url.as_str())?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        ::redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await?;

        tracing::info!(host = %settings.host, port = settings.port, db = settings.db, "connected to redis");
        Ok(Self {
            client,
            inbox_capacity: inbox_capacity.max(1),
        })
    }
}

#[async_trait::async_trait]
impl Source for RedisSource {
    async fn subscribe(&self, channel: &str) -> Result<MessageStream, SubscriptionFault> {
        let channel: Arc<str> = Arc::from(channel);
        let fault = |err: ::redis::RedisError| SubscriptionFault::Subscribe {
            channel: Arc::clone(&channel),
            error: err.to_string(),
        };

        let mut pubsub = self.client.get_async_pubsub().await.map_err(fault)?;
        pubsub.subscribe(&*channel).await.map_err(fault)?;

        let (tx, rx) = mpsc::channel(self.inbox_capacity);
        let stop = CancellationToken::new();
        let pump_stop = stop.clone();
        let pump_channel = Arc::clone(&channel);

        tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            loop {
                tokio::select! {
                    biased;
                    _ = pump_stop.cancelled() => break,
                    next = messages.next() => match next {
                        Some(msg) => {
                            let payload = Bytes::copy_from_slice(msg.get_payload_bytes());
                            if tx.send(payload).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            tracing::warn!(channel = %pump_channel, "redis pubsub stream ended");
                            break;
                        }
                    }
                }
            }
        });

        Ok(MessageStream::new(rx, stop))
    }
}
