//! # Tessera Backend
//!
//! The backend process of the Tessera editor.
//!
//! This crate provides:
//! - Handlers for every exchange operation (settings, projects, backups,
//!   path checks, dialogs)
//! - [`operation_wrapper`], which turns a handler result into a correlated
//!   `reply` or `error` frame
//! - A newline-delimited JSON serve loop over any async reader and writer
//! - [`MenuEmitter`] for uncorrelated menu signals
//!
//! # Architecture
//!
//! The backend owns all filesystem access. The editor talks to it only
//! through exchanges; each request carries an `exchangeId` that the reply
//! echoes. Requests are handled concurrently, one task each, so a slow
//! save does not hold up a settings read.
//!
//! Dialogs go through the [`DialogProvider`] seam. A process without a
//! window uses [`Headless`], which refuses every dialog.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod dialog;
mod error;
mod handler;
mod server;

pub use config::BackendConfig;
pub use dialog::{DialogProvider, Headless, ScriptedDialogs};
pub use error::{BackendError, BackendResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::{operation_wrapper, BackendServer, FrameSink, MenuEmitter};
