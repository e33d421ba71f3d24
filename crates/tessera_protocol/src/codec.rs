//! Newline-delimited JSON framing.
//!
//! Each message is one line of compact JSON terminated by `\n`. Pretty
//! printing is never used on the wire, so a frame never contains a raw
//! newline.

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::Message;
use crate::operation::{ExchangeId, OpName, OpType};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Encodes a message as one line, including the trailing newline.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if the message cannot be serialized.
pub fn encode_line(message: &Message) -> ProtocolResult<String> {
    let mut line = serde_json::to_string(message).map_err(ProtocolError::Encode)?;
    line.push('\n');
    Ok(line)
}

/// Decodes one line. Surrounding whitespace is ignored.
///
/// # Errors
///
/// - [`ProtocolError::EmptyFrame`] for a blank line
/// - [`ProtocolError::Decode`] for anything that is not a known message
pub fn decode_line(line: &str) -> ProtocolResult<Message> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ProtocolError::EmptyFrame);
    }
    serde_json::from_str(line).map_err(ProtocolError::Decode)
}

/// Recovers the correlation of a request line that [`decode_line`] rejected.
///
/// Returns the `opType` and `exchangeId` when the line is a `request` object
/// carrying a string `exchangeId`, so the sender can still be answered.
/// A missing or non-string `opType` is returned as an empty name.
#[must_use]
pub fn peek_request(line: &str) -> Option<(OpName, ExchangeId)> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    if value.get("event").and_then(Value::as_str) != Some("request") {
        return None;
    }
    let exchange_id = value.get("exchangeId")?.as_str()?;
    let op = value
        .get("opType")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some((OpName::parse(op), ExchangeId::new(exchange_id)))
}

/// Decodes an operation's payload or result.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidPayload`] naming `op` on a shape mismatch.
pub fn decode_payload<T: DeserializeOwned>(op: OpType, payload: Value) -> ProtocolResult<T> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::InvalidPayload {
        op: op.to_string(),
        source,
    })
}

/// Encodes an operation's payload or result.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if the value cannot be serialized.
pub fn encode_payload<T: Serialize>(value: &T) -> ProtocolResult<Value> {
    serde_json::to_value(value).map_err(ProtocolError::Encode)
}

/// Writes queued frames as lines until every sender is dropped.
///
/// Each frame is flushed on its own so the peer never waits on a buffer.
///
/// # Errors
///
/// Returns the first encoding or write error.
pub async fn write_frames<W>(
    mut rx: mpsc::UnboundedReceiver<Message>,
    mut writer: W,
) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let line = encode_line(&message)?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
