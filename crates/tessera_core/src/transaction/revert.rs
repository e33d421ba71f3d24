//! Replaying changes against the content graph.

use crate::entity::{ContentGraph, EntityAddress};
use crate::error::CoreResult;
use crate::layout::{InstanceRef, LayoutOps};
use crate::mutation::owned_board;
use crate::transaction::state::{Change, Transaction};
use tracing::{debug, warn};

/// Order in which a transaction's changes are replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Last change first. Undoes the transaction.
    Backward,
    /// First change first. Reapplies an undone transaction.
    Forward,
}

/// Writes `change.entity_before` back at its address.
///
/// A `None` snapshot deletes the entity and cleans up its tiles or owned
/// boards. A present snapshot is restored, recreating missing scaffolding
/// and the type's tile or the instance's board when the change recorded one.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be placed or a layout operation
/// fails. The graph is left as the failing step found it.
pub fn revert_change<L: LayoutOps + ?Sized>(
    graph: &mut ContentGraph,
    layout: &mut L,
    change: &Change,
) -> CoreResult<()> {
    let meta = &change.meta;
    match &change.entity_before {
        None => {
            graph.remove(&change.address);
            match &change.address {
                EntityAddress::TypeWrapper { t_id } => {
                    layout.delete_tiles_for_type(t_id);
                }
                EntityAddress::Instance { t_id, i_id } => {
                    layout.delete_boards_owned_by(&InstanceRef::new(t_id, i_id));
                }
                EntityAddress::PropDefinition { .. } | EntityAddress::PropValues { .. } => {}
            }
        }
        Some(snapshot) => {
            graph.restore(&change.address, snapshot.clone())?;
            match &change.address {
                EntityAddress::TypeWrapper { t_id } => {
                    if let (Some(board), Some(tile_type)) = (&meta.board_id, meta.tile_type) {
                        if !layout.has_tile_for_type(t_id) {
                            layout.create_tile(board, tile_type, t_id)?;
                        }
                    }
                }
                EntityAddress::Instance { t_id, i_id } => {
                    if let Some(board) = &meta.board_id {
                        if !layout.has_board(board) {
                            layout.create_board(owned_board(board, t_id, i_id))?;
                        }
                    }
                }
                EntityAddress::PropDefinition { .. } | EntityAddress::PropValues { .. } => {}
            }
        }
    }
    Ok(())
}

/// Replays every change of `txn` in `direction`.
///
/// A failing change is logged and skipped; the rest still run.
/// Returns the number of changes that failed.
pub fn revert_transaction<L: LayoutOps + ?Sized>(
    graph: &mut ContentGraph,
    layout: &mut L,
    txn: &Transaction,
    direction: Direction,
) -> usize {
    debug!(txn = %txn.id(), ?direction, changes = txn.changes().len(), "replaying transaction");

    let mut failed = 0;
    let mut replay = |change: &Change| {
        if let Err(e) = revert_change(graph, layout, change) {
            warn!(
                txn = %txn.id(),
                address = %change.address,
                error = %e,
                "failed to revert change"
            );
            failed += 1;
        }
    };
    match direction {
        Direction::Backward => txn.changes().iter().rev().for_each(&mut replay),
        Direction::Forward => txn.changes().iter().for_each(&mut replay),
    }
    failed
}
