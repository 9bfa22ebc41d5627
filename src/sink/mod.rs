//! # Persistence boundary.
//!
//! A [`Sink`] durably stores tagged [`LogRecord`]s. Up to one listener per
//! category calls it at the same time, so implementations must be safe for
//! concurrent use. The record's [`Category`](crate::Category) tag selects the
//! destination.
//!
//! Implementations:
//! - [`ElasticSink`] one Elasticsearch index per category (feature `elastic`)

#[cfg(feature = "elastic")]
mod elastic;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WriteFault;
use crate::records::LogRecord;

#[cfg(feature = "elastic")]
pub use elastic::ElasticSink;

/// Point-write persistence for tagged records.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Writes one record to the destination of its category.
    ///
    /// `ctx` is cancelled when the run shuts down; long writes should honor it
    /// and return [`WriteFault::Canceled`].
    async fn write(&self, ctx: CancellationToken, record: LogRecord) -> Result<(), WriteFault>;
}

/// Shared sink handle.
pub type SinkRef = Arc<dyn Sink>;
