//! Outbound transport abstraction.

use crate::error::{ExchangeError, ExchangeResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tessera_protocol::Message;
use tokio::sync::mpsc;

/// Sends frames towards the backend.
///
/// Sending must not block: implementations queue the frame and return.
pub trait Outbound: Send + Sync {
    /// Queues one frame.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Closed`] if the channel is gone.
    fn send(&self, message: Message) -> ExchangeResult<()>;
}

/// An outbound queue drained by [`tessera_protocol::write_frames`].
#[derive(Debug, Clone)]
pub struct ChannelOutbound {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelOutbound {
    /// Creates the queue and its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Outbound for ChannelOutbound {
    fn send(&self, message: Message) -> ExchangeResult<()> {
        self.tx.send(message).map_err(|_| ExchangeError::Closed)
    }
}

/// An outbound that records frames, for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutbound {
    sent: Arc<Mutex<Vec<Message>>>,
    closed: Arc<Mutex<bool>>,
}

impl RecordingOutbound {
    /// Creates an open recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the frames sent so far.
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }

    /// Makes further sends fail.
    pub fn close(&self) {
        *self.closed.lock() = true;
    }
}

impl Outbound for RecordingOutbound {
    fn send(&self, message: Message) -> ExchangeResult<()> {
        if *self.closed.lock() {
            return Err(ExchangeError::Closed);
        }
        self.sent.lock().push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_protocol::{decode_line, write_frames, ExchangeId, OpType};

    #[tokio::test]
    async fn frames_are_written_as_lines() {
        let (outbound, rx) = ChannelOutbound::channel();
        let first = Message::request(OpType::TestPath, ExchangeId::new("a"), json!("/tmp"));
        let second =
            Message::request(OpType::LoadApplicationData, ExchangeId::new("b"), json!(null));
        outbound.send(first.clone()).unwrap();
        outbound.send(second.clone()).unwrap();
        drop(outbound);

        let mut buffer = Vec::new();
        write_frames(rx, &mut buffer).await.unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let frames: Vec<_> = text.lines().map(|l| decode_line(l).unwrap()).collect();
        assert_eq!(frames, [first, second]);
    }

    #[test]
    fn closed_channel_reports_closed() {
        let (outbound, rx) = ChannelOutbound::channel();
        drop(rx);
        let result = outbound.send(Message::request(
            OpType::TestPath,
            ExchangeId::new("a"),
            json!(null),
        ));
        assert!(matches!(result, Err(ExchangeError::Closed)));
    }

    #[test]
    fn recorder_can_be_closed() {
        let outbound = RecordingOutbound::new();
        let message = Message::request(OpType::TestPath, ExchangeId::new("a"), json!(null));
        outbound.send(message.clone()).unwrap();
        outbound.close();
        assert!(outbound.send(message).is_err());
        assert_eq!(outbound.sent().len(), 1);
    }
}
