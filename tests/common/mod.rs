// tests/common/mod.rs

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use tokio::time::{Duration, sleep, timeout};
use tokio_util::sync::CancellationToken;

use logrelay::{
    // ---
    Category,
    ChannelBinding,
    Event,
    LogRecord,
    MemorySource,
    MessageStream,
    Sink,
    Source,
    SubscriptionFault,
    WriteFault,
};

pub const CHANNELS: [(&str, Category); 5] = [
    ("logs", Category::General),
    ("logs:info", Category::Info),
    ("logs:warning", Category::Warning),
    ("logs:error", Category::Error),
    ("logs:debug", Category::Debug),
];

pub fn all_bindings() -> Vec<ChannelBinding> {
    CHANNELS
        .iter()
        .map(|(channel, category)| ChannelBinding::new(*channel, *category))
        .collect()
}

pub fn channel_names() -> Vec<&'static str> {
    CHANNELS.iter().map(|(channel, _)| *channel).collect()
}

pub fn payload(id: &str, level: &str, message: &str) -> String {
    format!(r#"{{"id":"{id}","timestamp":"t","level":"{level}","message":"{message}"}}"#)
}

/// Records every write.
///
/// Record ids select special behavior:
/// - `boom` panics inside the sink
/// - `reject` fails with [`WriteFault::Rejected`]
/// - `hang` never returns, ignoring cancellation
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingSink {
    pub async fn records(&self) -> Vec<LogRecord> {
        self.records.lock().await.clone()
    }

    pub async fn ids(&self) -> Vec<String> {
        self.records
            .lock()
            .await
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn write(&self, _ctx: CancellationToken, record: LogRecord) -> Result<(), WriteFault> {
        match record.id.as_str() {
            "boom" => panic!("sink exploded"),
            "reject" => Err(WriteFault::Rejected {
                status: 400,
                body: "mapper_parsing_exception".into(),
            }),
            "hang" => std::future::pending().await,
            _ => {
                self.records.lock().await.push(record);
                Ok(())
            }
        }
    }
}

/// Delegates to a [`MemorySource`] but panics when subscribing to one channel.
pub struct PanickingSource {
    pub inner: Arc<MemorySource>,
    pub channel: &'static str,
}

#[async_trait]
impl Source for PanickingSource {
    async fn subscribe(&self, channel: &str) -> Result<MessageStream, SubscriptionFault> {
        if channel == self.channel {
            panic!("connection handle missing");
        }
        self.inner.subscribe(channel).await
    }
}

/// Polls `check` until it returns true, failing the test after one second.
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    timeout(Duration::from_secs(1), async {
        while !check().await {
            sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Waits until every channel in `channels` has a live subscriber.
pub async fn wait_live(source: &MemorySource, channels: &[&str]) {
    wait_until(move || async move {
        for channel in channels {
            if source.live_subscribers(channel).await == 0 {
                return false;
            }
        }
        true
    })
    .await;
}

/// Drains the events buffered in `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}
