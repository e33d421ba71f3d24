//! Snapshot-based undo/redo.
//!
//! A [`TransactionLog`] records, for every semantic user action, the value
//! each touched entity address had before the action. Reverting replays
//! those snapshots backward; unreverting replays them forward.

mod manager;
mod revert;
mod state;

pub use manager::TransactionLog;
pub use revert::{revert_change, revert_transaction, Direction};
pub use state::{ActionType, Change, Transaction, TransactionSummary};
