//! # Tessera Core
//!
//! Content graph and undo/redo engine for the Tessera editor.
//!
//! This crate provides:
//! - The content graph: types, property definitions, instances and values
//! - UI layout data (boards and tiles) behind the [`LayoutOps`] seam
//! - A snapshot-based [`TransactionLog`] with linear revert/unrevert
//! - [`ProjectSession`], the explicit per-project editing context
//!
//! ## Design Principles
//!
//! - Entity addresses are a closed sum type, matched exhaustively
//! - Every content change is a [`Mutation`] recorded in the log
//! - Refused reverts degrade to logged no-ops, never panics

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod entity;
mod error;
mod layout;
mod mutation;
mod project;
mod session;
mod transaction;
mod types;

pub use config::HistoryConfig;
pub use entity::{
    is_reserved_prop, ContentGraph, EntityAddress, EntityId, EntityKind, EntitySnapshot,
    Instance, InstanceMap, PropDefinition, PropValues, TypeWrapper, ValueType, RESERVED_PREFIX,
};
pub use error::{CoreError, CoreResult};
pub use layout::{Board, InstanceRef, Layout, LayoutOps, Tile, TileType};
pub use mutation::{ChangeMeta, Mutation, TilePlacement};
pub use project::Project;
pub use session::ProjectSession;
pub use transaction::{
    revert_change, revert_transaction, ActionType, Change, Direction, Transaction,
    TransactionLog, TransactionSummary,
};
pub use types::{BoardId, TileId, TransactionId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
