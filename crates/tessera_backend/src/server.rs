//! Operation table and the line-based serve loop.

use crate::config::BackendConfig;
use crate::dialog::DialogProvider;
use crate::error::{BackendError, BackendResult};
use crate::handler::{HandlerContext, RequestHandler};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tessera_protocol::{
    decode_line, decode_payload, encode_payload, peek_request, write_frames, ErrorKind,
    ErrorPayload, ExchangeId, MenuSignal, Message, OpType, ProtocolError, Request,
};
use tessera_storage::AtomicFileStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Turns the outcome of one operation into its `reply` or `error` frame.
///
/// The frame echoes `op` and `exchange_id` so the client can correlate it.
pub async fn operation_wrapper<F, T>(op: OpType, exchange_id: ExchangeId, operation: F) -> Message
where
    F: Future<Output = BackendResult<T>>,
    T: Serialize,
{
    let outcome = match operation.await {
        Ok(value) => encode_payload(&value).map_err(BackendError::from),
        Err(e) => Err(e),
    };
    match outcome {
        Ok(data) => {
            debug!(exchange_id = %exchange_id, op = %op, "operation succeeded");
            Message::reply(op, exchange_id, data)
        }
        Err(e) => {
            error!(exchange_id = %exchange_id, op = %op, error = %e, "operation failed");
            Message::error(op, exchange_id, e.to_payload())
        }
    }
}

fn decode<T: DeserializeOwned>(op: OpType, payload: Value) -> BackendResult<T> {
    Ok(decode_payload(op, payload)?)
}

/// Queue of frames waiting to be written to the client.
#[derive(Debug, Clone)]
pub struct FrameSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl FrameSink {
    /// Creates the queue and its receiving end, to be drained by [`write_frames`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues one frame. Returns false if the writer is gone.
    pub fn send(&self, message: Message) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// Sends fire-and-forget menu signals to the client.
///
/// The emitter does not keep the channel open: once the serve loop and its
/// tasks are done, [`emit`](Self::emit) returns false.
#[derive(Debug, Clone)]
pub struct MenuEmitter {
    tx: mpsc::WeakUnboundedSender<Message>,
}

impl MenuEmitter {
    /// Creates an emitter writing to `sink`.
    pub fn new(sink: &FrameSink) -> Self {
        Self {
            tx: sink.tx.downgrade(),
        }
    }

    /// Emits one signal. Returns false if the channel is closed.
    pub fn emit(&self, signal: MenuSignal) -> bool {
        match self.tx.upgrade() {
            Some(tx) => {
                debug!(%signal, "emitting menu signal");
                tx.send(Message::menu(signal)).is_ok()
            }
            None => {
                debug!(%signal, "menu signal dropped, channel closed");
                false
            }
        }
    }
}

/// The backend: dispatches requests to their handlers.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tessera_backend::{BackendConfig, BackendServer, Headless};
///
/// let server = BackendServer::new(BackendConfig::new("/tmp/tessera"), Arc::new(Headless));
/// assert_eq!(server.config().settings_file, "settings.json");
/// ```
pub struct BackendServer {
    handler: RequestHandler,
}

impl BackendServer {
    /// Creates a backend with a default file store.
    pub fn new(config: BackendConfig, dialogs: Arc<dyn DialogProvider>) -> Self {
        Self::with_store(config, AtomicFileStore::with_defaults(), dialogs)
    }

    /// Creates a backend with an explicit file store.
    pub fn with_store(
        config: BackendConfig,
        store: AtomicFileStore,
        dialogs: Arc<dyn DialogProvider>,
    ) -> Self {
        let context = Arc::new(HandlerContext::new(config, store, dialogs));
        Self {
            handler: RequestHandler::new(context),
        }
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.handler.context().config
    }

    /// Returns the operation handlers.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Runs one request and returns its `reply` or `error` frame.
    pub async fn handle_request(&self, request: Request) -> Message {
        let Request {
            op_type: op,
            exchange_id: id,
            payload,
        } = request;
        let h = &self.handler;
        debug!(exchange_id = %id, %op, "dispatching request");

        match op {
            OpType::LoadApplicationData => {
                operation_wrapper(op, id, h.load_application_data()).await
            }
            OpType::UpdateApplicationData => {
                operation_wrapper(op, id, async {
                    h.update_application_data(decode(op, payload)?).await
                })
                .await
            }
            OpType::FetchProject => {
                operation_wrapper(op, id, async { h.fetch_project(decode(op, payload)?).await })
                    .await
            }
            OpType::SaveProject => {
                operation_wrapper(op, id, async { h.save_project(decode(op, payload)?).await })
                    .await
            }
            OpType::SaveProjectAs => {
                operation_wrapper(op, id, async { h.save_project_as(decode(op, payload)?).await })
                    .await
            }
            OpType::BackupProject => {
                operation_wrapper(op, id, async { h.backup_project(decode(op, payload)?).await })
                    .await
            }
            OpType::TestPath => {
                operation_wrapper(op, id, async { h.test_path(decode(op, payload)?).await }).await
            }
            OpType::SelectDirectoryDialog => {
                operation_wrapper(op, id, async {
                    h.select_directory_dialog(decode(op, payload)?).await
                })
                .await
            }
            OpType::SelectFileDialog => {
                operation_wrapper(op, id, async {
                    h.select_file_dialog(decode(op, payload)?).await
                })
                .await
            }
        }
    }

    /// Reads requests from `reader` until it ends, answering through `sink`.
    ///
    /// Each request runs as its own task, so replies are queued in completion
    /// order rather than request order. A line that fails to decode but still
    /// carries an `exchangeId` is answered with an `error` frame; other lines
    /// that are not requests are logged and dropped. Returns once every
    /// started request has answered.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from `reader` fails.
    pub async fn serve<R>(self: Arc<Self>, reader: R, sink: FrameSink) -> BackendResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut tasks = JoinSet::new();

        let result = loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break Ok(()),
                Err(e) => break Err(BackendError::from(e)),
            };
            match decode_line(&line) {
                Ok(Message::Request(request)) => {
                    let server = Arc::clone(&self);
                    let sink = sink.clone();
                    tasks.spawn(async move {
                        let reply = server.handle_request(request).await;
                        if !sink.send(reply) {
                            warn!("reply dropped, writer closed");
                        }
                    });
                }
                Ok(other) => {
                    warn!(event = other.event(), "ignoring frame that is not a request");
                }
                Err(ProtocolError::EmptyFrame) => {}
                Err(e) => match peek_request(&line) {
                    Some((op, exchange_id)) => {
                        warn!(
                            exchange_id = %exchange_id,
                            %op,
                            error = %e,
                            "rejecting undecodable request"
                        );
                        let payload =
                            ErrorPayload::new(ErrorKind::ProtocolMismatch, e.to_string());
                        if !sink.send(Message::error(op, exchange_id, payload)) {
                            warn!("reply dropped, writer closed");
                        }
                    }
                    None => error!(error = %e, "dropping undecodable frame"),
                },
            }
        };

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "request task failed");
            }
        }
        debug!("serve loop finished");
        result
    }

    /// Serves `reader` and writes frames to `writer` until the input ends.
    ///
    /// `menu` receives an emitter on the same channel before serving starts.
    ///
    /// # Errors
    ///
    /// Returns the first read or write error.
    pub async fn run<R, W>(
        self: Arc<Self>,
        reader: R,
        writer: W,
        menu: impl FnOnce(MenuEmitter),
    ) -> BackendResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, rx) = FrameSink::channel();
        menu(MenuEmitter::new(&sink));
        let writer = tokio::spawn(write_frames(rx, writer));

        let served = self.serve(reader, sink).await;
        let written = match writer.await {
            Ok(result) => result.map_err(|e| match e {
                ProtocolError::Io(e) => BackendError::Io(e),
                other => BackendError::from(other),
            }),
            Err(e) => {
                error!(error = %e, "writer task failed");
                Ok(())
            }
        };
        served.and(written)
    }
}
