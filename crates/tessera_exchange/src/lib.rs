//! # Tessera Exchange
//!
//! Client side of the exchange channel between the editor and its backend.
//!
//! This crate provides:
//! - [`ExchangeClient`] with a pending-exchange table, per-exchange timeouts
//!   and reply routing by exchange ID
//! - Typed methods for every backend operation
//! - The [`Outbound`] transport seam and a line writer for it
//! - [`run_inbound`], which feeds backend frames to the client
//! - [`AutosaveScheduler`] for periodic saves and backups
//!
//! ## Exchange lifecycle
//!
//! 1. A fresh ID is generated and a pending slot registered under it
//! 2. The request is queued on the outbound transport
//! 3. The caller waits for a `reply`, an `error` or the deadline
//! 4. Whichever comes first releases the slot; anything later is dropped
//!
//! Replies are matched by ID only. The backend is free to answer requests
//! out of order.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod autosave;
mod client;
mod config;
mod error;
mod pump;
mod transport;

pub use autosave::{autosave_once, backup_once, AutosaveScheduler, TickOutcome};
pub use client::ExchangeClient;
pub use config::ClientConfig;
pub use error::{ExchangeError, ExchangeResult};
pub use pump::run_inbound;
pub use tessera_protocol::write_frames;
pub use transport::{ChannelOutbound, Outbound, RecordingOutbound};
