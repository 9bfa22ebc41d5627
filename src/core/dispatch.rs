//! # Handle a single message.
//!
//! Decodes one payload, tags the record with the listener's category and hands
//! it to the sink. Publishes exactly one outcome event per message:
//!
//! ```text
//! decode ─ Err ──────────────────────────────► DecodeFailed
//!    └──── Ok ─► tag ─► sink.write ─ Ok ─────► RecordDispatched
//!                                   └ Err ────► WriteFailed
//! ```
//!
//! Errors are returned for callers that care; the listener ignores them since
//! the event already recorded the failure.

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::{
    error::MessageError,
    events::{Bus, Event, EventKind},
    records::{ChannelBinding, decode},
    sink::Sink,
};

/// Decodes `payload` and writes it through `sink` under `binding`'s category.
pub async fn dispatch_once<S: Sink + ?Sized>(
    sink: &S,
    binding: &ChannelBinding,
    payload: Bytes,
    ctx: CancellationToken,
    bus: &Bus,
) -> Result<(), MessageError> {
    let record = match decode(&payload) {
        Ok(rec) => rec.with_category(binding.category()),
        Err(err) => {
            bus.publish(outcome(binding, EventKind::DecodeFailed).with_reason(err.to_string()));
            return Err(err.into());
        }
    };

    let id = record.id.clone();
    match sink.write(ctx, record).await {
        Ok(()) => {
            bus.publish(outcome(binding, EventKind::RecordDispatched).with_record_id(id));
            Ok(())
        }
        Err(err) => {
            bus.publish(
                outcome(binding, EventKind::WriteFailed)
                    .with_record_id(id)
                    .with_reason(err.to_string()),
            );
            Err(err.into())
        }
    }
}

fn outcome(binding: &ChannelBinding, kind: EventKind) -> Event {
    Event::new(kind)
        .with_channel(binding.channel_arc())
        .with_category(binding.category())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriteFault;
    use crate::records::{Category, LogRecord};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<LogRecord>>);

    #[async_trait]
    impl Sink for Recorder {
        async fn write(&self, _ctx: CancellationToken, record: LogRecord) -> Result<(), WriteFault> {
            if record.id == "reject" {
                return Err(WriteFault::Rejected {
                    status: 400,
                    body: "bad".into(),
                });
            }
            self.0.lock().await.push(record);
            Ok(())
        }
    }

    fn warning() -> ChannelBinding {
        ChannelBinding::new("logs:warning", Category::Warning)
    }

    #[tokio::test]
    async fn tags_and_writes_record() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let sink = Recorder::default();

        let payload = Bytes::from_static(br#"{"id":"1","timestamp":"t","level":"warning","message":"m"}"#);
        dispatch_once(&sink, &warning(), payload, CancellationToken::new(), &bus)
            .await
            .unwrap();

        let written = sink.0.lock().await;
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].category(), Some(Category::Warning));
        assert_eq!(written[0].message, "m");

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::RecordDispatched);
        assert_eq!(ev.record_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn decode_failure_skips_sink() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let sink = Recorder::default();

        let err = dispatch_once(&sink, &warning(), Bytes::from_static(b"{oops"), CancellationToken::new(), &bus)
            .await
            .unwrap_err();
        assert!(matches!(err, MessageError::Decode(_)));
        assert!(sink.0.lock().await.is_empty());
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::DecodeFailed);
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let sink = Recorder::default();

        let payload = Bytes::from_static(br#"{"id":"reject"}"#);
        let err = dispatch_once(&sink, &warning(), payload, CancellationToken::new(), &bus)
            .await
            .unwrap_err();
        assert!(matches!(err, MessageError::Write(WriteFault::Rejected { status: 400, .. })));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::WriteFailed);
        assert_eq!(ev.category, Some(Category::Warning));
    }
}
