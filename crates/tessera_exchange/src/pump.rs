//! Inbound line pump.

use crate::client::ExchangeClient;
use crate::error::ExchangeResult;
use crate::transport::Outbound;
use tessera_protocol::{decode_line, MenuSignal, ProtocolError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Reads frames from the backend and routes them through `client`.
///
/// Menu signals go to `menu` when given and are logged otherwise. Lines that
/// do not decode are logged and skipped. When the stream ends every pending
/// exchange fails with [`crate::ExchangeError::Closed`].
///
/// # Errors
///
/// Returns an error if reading the stream fails.
pub async fn run_inbound<T, R>(
    client: &ExchangeClient<T>,
    reader: R,
    menu: Option<mpsc::UnboundedSender<MenuSignal>>,
) -> ExchangeResult<()>
where
    T: Outbound,
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let result = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e.into()),
        };
        let message = match decode_line(&line) {
            Ok(message) => message,
            Err(ProtocolError::EmptyFrame) => continue,
            Err(e) => {
                warn!(error = %e, "skipping undecodable frame");
                continue;
            }
        };
        if let Some(signal) = client.handle_message(message) {
            match &menu {
                Some(tx) if tx.send(signal).is_ok() => {}
                _ => debug!(%signal, "menu signal without listener"),
            }
        }
    };
    debug!("inbound stream ended");
    client.close_all();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ExchangeError;
    use crate::transport::RecordingOutbound;
    use serde_json::json;
    use std::sync::Arc;
    use tessera_protocol::{encode_line, ExchangeId, Message, OpType};
    use tokio::io::{AsyncWriteExt, BufReader};

    fn client() -> Arc<ExchangeClient<RecordingOutbound>> {
        Arc::new(ExchangeClient::new(
            RecordingOutbound::new(),
            ClientConfig::default(),
        ))
    }

    #[tokio::test]
    async fn routes_replies_and_menu_signals() {
        let client = client();
        let (mut backend, frontend) = tokio::io::duplex(4096);
        let (menu_tx, mut menu_rx) = mpsc::unbounded_channel();

        let pump = {
            let client = client.clone();
            tokio::spawn(async move {
                run_inbound(&client, BufReader::new(frontend), Some(menu_tx)).await
            })
        };

        let caller = client.clone();
        let exchange = tokio::spawn(async move {
            caller.exchange(OpType::TestPath, json!("/tmp")).await
        });
        let id = loop {
            let sent = client.outbound().sent();
            if let Some(id) = sent.first().and_then(Message::exchange_id).cloned() {
                break id;
            }
            tokio::task::yield_now().await;
        };

        let stale = Message::reply(OpType::TestPath, ExchangeId::new("stale"), json!(1));
        let mut frames = String::from("\n{broken\n");
        for message in [
            Message::menu(MenuSignal::SaveProject),
            stale,
            Message::reply(OpType::TestPath, id, json!(null)),
        ] {
            frames.push_str(&encode_line(&message).unwrap());
        }
        backend.write_all(frames.as_bytes()).await.unwrap();

        assert_eq!(exchange.await.unwrap().unwrap(), json!(null));
        assert_eq!(menu_rx.recv().await, Some(MenuSignal::SaveProject));

        drop(backend);
        pump.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn end_of_stream_fails_pending() {
        let client = client();
        let (backend, frontend) = tokio::io::duplex(64);

        let caller = client.clone();
        let exchange = tokio::spawn(async move {
            caller.exchange(OpType::TestPath, json!(null)).await
        });
        while client.pending_count() == 0 {
            tokio::task::yield_now().await;
        }

        drop(backend);
        run_inbound(&client, BufReader::new(frontend), None)
            .await
            .unwrap();
        assert!(matches!(exchange.await.unwrap(), Err(ExchangeError::Closed)));
    }
}
