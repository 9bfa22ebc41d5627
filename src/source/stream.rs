//! # Message stream returned by a subscription.
//!
//! Payloads arrive through a bounded queue. `stop` is cancelled on close or drop,
//! which tells a pumping source to unsubscribe and release its connection.

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Ordered stream of raw payloads from one channel.
///
/// Ends (`recv` → `None`) once the source stops delivering. Dropping the stream
/// unsubscribes.
#[derive(Debug)]
pub struct MessageStream {
    inbox: mpsc::Receiver<Bytes>,
    stop: CancellationToken,
}

impl MessageStream {
    /// Wraps a receiver fed by a source.
    pub fn new(inbox: mpsc::Receiver<Bytes>, stop: CancellationToken) -> Self {
        Self { inbox, stop }
    }

    /// Waits for the next payload; `None` once the stream is closed and drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.inbox.recv().await
    }

    /// Closes the stream. Idempotent.
    ///
    /// Payloads already buffered can still be drained with [`recv`](Self::recv).
    pub fn close(&mut self) {
        self.stop.cancel();
        self.inbox.close();
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_is_idempotent_and_drains_buffer() {
        let (tx, rx) = mpsc::channel(4);
        let stop = CancellationToken::new();
        let mut stream = MessageStream::new(rx, stop.clone());

        tx.send(Bytes::from_static(b"a")).await.unwrap();
        stream.close();
        stream.close();

        assert!(stop.is_cancelled());
        assert!(tx.send(Bytes::from_static(b"b")).await.is_err());
        assert_eq!(stream.recv().await, Some(Bytes::from_static(b"a")));
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn drop_cancels_stop_token() {
        let (_tx, rx) = mpsc::channel(1);
        let stop = CancellationToken::new();
        drop(MessageStream::new(rx, stop.clone()));
        assert!(stop.is_cancelled());
    }
}
