//! # Tessera Protocol
//!
//! Wire types for the exchange channel between the editor and its backend.
//!
//! This crate provides:
//! - [`OpType`] and [`ExchangeId`] for correlated request/reply exchanges
//! - [`Message`] frames: requests, replies, errors and menu signals
//! - Typed payloads and the persisted [`AppSettings`]
//! - Newline-delimited JSON framing, and the frame writer both sides share
//!
//! The only I/O is [`write_frames`], which drains a queue into any
//! `AsyncWrite`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod error;
mod messages;
mod operation;
mod payloads;
mod settings;

pub use codec::{
    decode_line, decode_payload, encode_line, encode_payload, peek_request, write_frames,
};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{Envelope, MenuSignal, Message, Request};
pub use operation::{unix_millis, ExchangeId, ExchangeIdGen, OpName, OpType};
pub use payloads::{
    BackupRequest, DialogRequest, DirectoryDialogResult, ErrorKind, ErrorPayload,
    FileDialogResult, SavedPath,
};
pub use settings::AppSettings;
