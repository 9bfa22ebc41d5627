//! # logrelay
//!
//! **logrelay** forwards structured log records from per-severity pub/sub
//! channels into a persistent index store.
//!
//! One [`ListenerTask`] runs per [`ChannelBinding`]. Each decodes the
//! payloads of its channel into [`LogRecord`]s, tags them with the binding's
//! [`Category`] and hands them to the shared [`Sink`]. The [`Supervisor`]
//! runs the listeners concurrently, isolates their failures and reports
//! subscription faults as one aggregated [`RelayError`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Source (Redis pub/sub / in-memory)
//!     │ subscribe(channel)   one MessageStream per binding
//!     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - validates bindings (ConfigurationFault before any spawn)       │
//! │  - Bus (broadcast events)                                         │
//! │  - StateTracker (listener state with sequence numbers)            │
//! │  - SubscriberSet (fans out to subscribers, LogWriter by default)  │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌────────────┐     ┌────────────┐     ┌────────────┐
//!   │ Listener   │     │ Listener   │     │ Listener   │
//!   │ logs:info  │     │ logs:error │ ... │ logs:debug │
//!   └─────┬──────┘     └─────┬──────┘     └─────┬──────┘
//!         │ decode → tag → Sink::write (one message at a time)
//!         ▼                  ▼                  ▼
//!   ┌───────────────────────────────────────────────────┐
//!   │  Sink (Elasticsearch: one index per category)     │
//!   └───────────────────────────────────────────────────┘
//! ```
//!
//! ### Listener lifecycle
//! ```text
//! Idle ──► Subscribing ──► Active (loop) ──► Closed   (stream ended / cancelled)
//!              │
//!              └─────────────────────────────► Faulted (subscribe failed)
//! ```
//!
//! ## Failure containment
//! | Failure              | Scope         | Effect                                      |
//! |----------------------|---------------|---------------------------------------------|
//! | [`DecodeError`]      | one message   | `DecodeFailed` event, listener continues    |
//! | [`WriteFault`]       | one message   | `WriteFailed` event, listener continues     |
//! | panic in message body| one message   | `ListenerPanicked` event, listener continues|
//! | [`SubscriptionFault`]| one listener  | listener `Faulted`, reported in aggregate   |
//! | [`ConfigurationFault`]| whole run    | run fails before any listener starts        |
//!
//! ## Optional features
//! - `redis` (default): [`RedisSource`].
//! - `elastic` (default): [`ElasticSink`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use bytes::Bytes;
//! use tokio_util::sync::CancellationToken;
//! use logrelay::{Category, ChannelBinding, Config, LogRecord, MemorySource, Sink, Supervisor, WriteFault};
//!
//! struct Print;
//!
//! #[async_trait]
//! impl Sink for Print {
//!     async fn write(&self, _ctx: CancellationToken, record: LogRecord) -> Result<(), WriteFault> {
//!         println!("{:?}: {}", record.category(), record.message);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(MemorySource::new());
//!     let sup = Supervisor::builder(Config::default(), source.clone(), Arc::new(Print)).build();
//!
//!     let bindings = vec![
//!         ChannelBinding::new("logs:info", Category::Info),
//!         ChannelBinding::new("logs:error", Category::Error),
//!     ];
//!
//!     let feeder = source.clone();
//!     tokio::spawn(async move {
//!         while feeder.live_subscribers("logs:info").await == 0
//!             || feeder.live_subscribers("logs:error").await == 0
//!         {
//!             tokio::task::yield_now().await;
//!         }
//!         feeder.publish("logs:error", Bytes::from_static(br#"{"id":"1","message":"disk full"}"#)).await;
//!         feeder.close_all().await;
//!     });
//!
//!     sup.run(bindings, CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod records;
mod sink;
mod source;
mod subscribers;

pub mod config;

// ---- Public re-exports ----

pub use config::Settings;
pub use core::{
    Config, ListenerState, ListenerTask, StateTracker, Supervisor, SupervisorBuilder, dispatch_once,
};
pub use error::{
    AggregatedFault, ConfigurationFault, DecodeError, MessageError, RelayError, SinkSetupError,
    SubscriptionFault, WriteFault,
};
pub use events::{Bus, Event, EventKind};
pub use records::{Category, ChannelBinding, LogRecord, decode, validate_bindings};
pub use sink::{Sink, SinkRef};
pub use source::{MemorySource, MessageStream, Source, SourceRef};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};

#[cfg(feature = "elastic")]
pub use sink::ElasticSink;
#[cfg(feature = "redis")]
pub use source::RedisSource;
