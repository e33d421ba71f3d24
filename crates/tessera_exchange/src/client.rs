//! The exchange client: pending table, timeouts and reply routing.

use crate::config::ClientConfig;
use crate::error::{ExchangeError, ExchangeResult};
use crate::transport::Outbound;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tessera_protocol::{
    Envelope, ErrorKind, ErrorPayload, ExchangeId, ExchangeIdGen, MenuSignal, Message, OpName,
    OpType,
};
use tokio::sync::oneshot;
use tracing::{debug, warn};

type Outcome = Result<Value, ErrorPayload>;
type PendingTable = Mutex<HashMap<ExchangeId, oneshot::Sender<Outcome>>>;

/// Issues correlated requests and matches replies to them.
///
/// Each call to [`exchange`](Self::exchange) registers a pending entry keyed
/// by a fresh [`ExchangeId`], sends the request and waits. Replies are fed
/// in through [`handle_message`](Self::handle_message), usually by
/// [`crate::run_inbound`]. Replies are matched by ID only, so the backend
/// may answer in any order.
///
/// ## Timeouts
///
/// An exchange that times out removes exactly its own entry and fails with
/// [`ExchangeError::Timeout`]. A reply arriving later finds no entry and is
/// dropped with a warning; other pending exchanges are unaffected. Dropping
/// the future returned by `exchange` releases the entry the same way.
pub struct ExchangeClient<T> {
    outbound: T,
    ids: ExchangeIdGen,
    pending: PendingTable,
    config: ClientConfig,
}

impl<T: Outbound> ExchangeClient<T> {
    /// Creates a client sending through `outbound`.
    pub fn new(outbound: T, config: ClientConfig) -> Self {
        Self {
            outbound,
            ids: ExchangeIdGen::new(),
            pending: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Returns the outbound transport.
    pub fn outbound(&self) -> &T {
        &self.outbound
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the number of exchanges waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Runs one exchange with the configured timeout.
    ///
    /// # Errors
    ///
    /// - [`ExchangeError::Timeout`] if no reply arrived in time
    /// - [`ExchangeError::Rejected`] if the backend answered with `error`
    /// - [`ExchangeError::Closed`] if the channel closed first
    pub async fn exchange(&self, op: OpType, payload: Value) -> ExchangeResult<Value> {
        self.exchange_with(op, payload, Some(self.config.timeout))
            .await
    }

    /// Runs one exchange that waits for its reply indefinitely.
    ///
    /// # Errors
    ///
    /// Same as [`exchange`](Self::exchange), minus the timeout.
    pub async fn exchange_without_timeout(
        &self,
        op: OpType,
        payload: Value,
    ) -> ExchangeResult<Value> {
        self.exchange_with(op, payload, None).await
    }

    /// Runs one exchange with an explicit deadline, or none.
    ///
    /// # Errors
    ///
    /// Same as [`exchange`](Self::exchange).
    pub async fn exchange_with(
        &self,
        op: OpType,
        payload: Value,
        timeout: Option<Duration>,
    ) -> ExchangeResult<Value> {
        let exchange_id = self.ids.next(op);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(exchange_id.clone(), tx);
        let _slot = PendingSlot {
            pending: &self.pending,
            exchange_id: exchange_id.clone(),
        };

        debug!(exchange_id = %exchange_id, op = %op, "sending request");
        self.outbound
            .send(Message::request(op, exchange_id.clone(), payload))?;

        let outcome = match timeout {
            Some(after) => match tokio::time::timeout(after, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(exchange_id = %exchange_id, op = %op, ?after, "exchange timed out");
                    return Err(ExchangeError::Timeout {
                        op,
                        exchange_id,
                        after,
                    });
                }
            },
            None => rx.await,
        };

        match outcome {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(payload)) => Err(ExchangeError::Rejected { op, payload }),
            Err(_) => Err(ExchangeError::Closed),
        }
    }

    /// Routes one inbound frame.
    ///
    /// Replies and errors resolve their pending exchange; frames for unknown
    /// or expired exchanges are dropped with a warning. Menu signals are
    /// returned to the caller.
    pub fn handle_message(&self, message: Message) -> Option<MenuSignal> {
        match message {
            Message::Reply(envelope) => {
                let Envelope {
                    op_type,
                    exchange_id,
                    data,
                } = envelope;
                self.resolve(&op_type, &exchange_id, Ok(data));
                None
            }
            Message::Error(envelope) => {
                let Envelope {
                    op_type,
                    exchange_id,
                    data,
                } = envelope;
                self.resolve(&op_type, &exchange_id, Err(ErrorPayload::from_data(data)));
                None
            }
            Message::Menu { signal } => {
                debug!(%signal, "menu signal");
                Some(signal)
            }
            Message::Request(request) => {
                warn!(
                    exchange_id = %request.exchange_id,
                    op = %request.op_type,
                    kind = %ErrorKind::ProtocolMismatch,
                    "dropping request sent to the client"
                );
                None
            }
        }
    }

    /// Fails every pending exchange with [`ExchangeError::Closed`].
    pub fn close_all(&self) {
        let drained: Vec<_> = self.pending.lock().drain().collect();
        if !drained.is_empty() {
            debug!(count = drained.len(), "closing pending exchanges");
        }
    }

    fn resolve(&self, op: &OpName, exchange_id: &ExchangeId, outcome: Outcome) {
        let sender = self.pending.lock().remove(exchange_id);
        match sender {
            Some(tx) => {
                if tx.send(outcome).is_err() {
                    debug!(exchange_id = %exchange_id, "caller stopped waiting");
                }
            }
            None => {
                warn!(
                    exchange_id = %exchange_id,
                    op = %op,
                    kind = %ErrorKind::ProtocolMismatch,
                    "dropping reply for unknown exchange"
                );
            }
        }
    }
}

/// Removes a pending entry when its exchange ends, whichever way it ends.
struct PendingSlot<'a> {
    pending: &'a PendingTable,
    exchange_id: ExchangeId,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.exchange_id);
    }
}
