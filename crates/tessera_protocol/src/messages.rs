//! Protocol messages.

use crate::operation::{ExchangeId, OpName, OpType};
use crate::payloads::ErrorPayload;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A request from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Requested operation.
    pub op_type: OpType,
    /// Correlation ID echoed by the reply.
    pub exchange_id: ExchangeId,
    /// Operation input, `null` when the operation takes none.
    #[serde(default)]
    pub payload: Value,
}

/// The body of a `reply` or `error` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Operation of the originating request.
    pub op_type: OpName,
    /// Correlation ID of the originating request.
    pub exchange_id: ExchangeId,
    /// Result on success, [`ErrorPayload`] on failure.
    #[serde(default)]
    pub data: Value,
}

/// A fire-and-forget UI command sent by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuSignal {
    /// Start a new project.
    StartNewProject,
    /// Open an existing project.
    OpenExistingProject,
    /// Save the current project.
    SaveProject,
    /// Save the current project under a new path.
    SaveProjectAs,
    /// Show the current project's configuration.
    ShowCurrentProjectConfiguration,
    /// Quit.
    CloseApplication,
}

impl fmt::Display for MenuSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MenuSignal::StartNewProject => "startNewProject",
            MenuSignal::OpenExistingProject => "openExistingProject",
            MenuSignal::SaveProject => "saveProject",
            MenuSignal::SaveProjectAs => "saveProjectAs",
            MenuSignal::ShowCurrentProjectConfiguration => "showCurrentProjectConfiguration",
            MenuSignal::CloseApplication => "closeApplication",
        };
        f.write_str(name)
    }
}

/// One frame on the channel, tagged by its `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Message {
    /// Client to backend.
    Request(Request),
    /// Backend to client, success.
    Reply(Envelope),
    /// Backend to client, failure.
    Error(Envelope),
    /// Backend to client, uncorrelated.
    Menu {
        /// The command.
        signal: MenuSignal,
    },
}

impl Message {
    /// Creates a request.
    #[must_use]
    pub fn request(op_type: OpType, exchange_id: ExchangeId, payload: Value) -> Self {
        Message::Request(Request {
            op_type,
            exchange_id,
            payload,
        })
    }

    /// Creates a success reply.
    #[must_use]
    pub fn reply(op_type: OpType, exchange_id: ExchangeId, data: Value) -> Self {
        Message::Reply(Envelope {
            op_type: op_type.into(),
            exchange_id,
            data,
        })
    }

    /// Creates a failure reply.
    ///
    /// `op_type` may be a name outside the table when the request itself
    /// could not be decoded.
    #[must_use]
    pub fn error(
        op_type: impl Into<OpName>,
        exchange_id: ExchangeId,
        payload: ErrorPayload,
    ) -> Self {
        Message::Error(Envelope {
            op_type: op_type.into(),
            exchange_id,
            data: payload.into_data(),
        })
    }

    /// Creates a menu signal.
    #[must_use]
    pub fn menu(signal: MenuSignal) -> Self {
        Message::Menu { signal }
    }

    /// Returns the correlation ID, if the message carries one.
    #[must_use]
    pub fn exchange_id(&self) -> Option<&ExchangeId> {
        match self {
            Message::Request(request) => Some(&request.exchange_id),
            Message::Reply(envelope) | Message::Error(envelope) => Some(&envelope.exchange_id),
            Message::Menu { .. } => None,
        }
    }

    /// Returns the event name.
    #[must_use]
    pub fn event(&self) -> &'static str {
        match self {
            Message::Request(_) => "request",
            Message::Reply(_) => "reply",
            Message::Error(_) => "error",
            Message::Menu { .. } => "menu",
        }
    }
}
