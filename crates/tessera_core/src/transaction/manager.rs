//! The transaction log.

use crate::config::HistoryConfig;
use crate::entity::{ContentGraph, EntityAddress};
use crate::error::{CoreError, CoreResult};
use crate::layout::LayoutOps;
use crate::mutation::{ChangeMeta, Mutation};
use crate::transaction::revert::{revert_transaction, Direction};
use crate::transaction::state::{ActionType, Change, Transaction, TransactionSummary};
use crate::types::TransactionId;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Linear undo/redo history over a content graph.
///
/// The log always starts with a sentinel transaction that can never be
/// reverted. Reverted transactions move to the redo buffer, most recently
/// reverted first. Any new transaction clears the redo buffer; history is a
/// stack, not a tree.
///
/// ## Opening transactions
///
/// [`begin`](Self::begin) announces a semantic action. The transaction is
/// created lazily by the first mutation that passes its checks, so an
/// action whose first mutation is rejected leaves neither an empty
/// transaction nor a cleared redo buffer behind. A mutation applied with no
/// action announced opens an [`ActionType::Implicit`] transaction.
#[derive(Debug)]
pub struct TransactionLog {
    transactions: Vec<Transaction>,
    redo: VecDeque<Transaction>,
    pending: Option<ActionType>,
    open: bool,
    next_id: u64,
    config: HistoryConfig,
}

impl TransactionLog {
    /// Creates a log holding only the sentinel.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self::from_persisted(Vec::new(), config)
    }

    /// Rebuilds a log from persisted transactions.
    ///
    /// A missing sentinel is inserted. The ID counter continues after the
    /// highest persisted ID and the redo buffer starts empty.
    #[must_use]
    pub fn from_persisted(mut transactions: Vec<Transaction>, config: HistoryConfig) -> Self {
        if transactions.first().map_or(true, |t| !t.is_sentinel()) {
            transactions.insert(0, Transaction::sentinel());
        }
        let next_id = transactions
            .iter()
            .map(|t| t.id().as_u64())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            transactions,
            redo: VecDeque::new(),
            pending: None,
            open: false,
            next_id,
            config,
        }
    }

    /// Returns the transactions, sentinel first.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Returns the redo buffer, most recently reverted first.
    pub fn redo_buffer(&self) -> impl Iterator<Item = &Transaction> {
        self.redo.iter()
    }

    /// Returns the ID of the last transaction in the log.
    #[must_use]
    pub fn last_id(&self) -> TransactionId {
        self.transactions
            .last()
            .map_or(TransactionId::SENTINEL, Transaction::id)
    }

    /// Returns the number of transactions, excluding the sentinel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.iter().filter(|t| !t.is_sentinel()).count()
    }

    /// Returns true if the log holds only the sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if a transaction is currently open for mutations.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns true if there is something to revert.
    #[must_use]
    pub fn can_revert(&self) -> bool {
        !self.last_id().is_sentinel()
    }

    /// Returns true if there is something to unrevert.
    #[must_use]
    pub fn can_unrevert(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Closes the open transaction and announces a new action.
    pub fn begin(&mut self, action: ActionType) {
        self.end();
        self.pending = Some(action);
    }

    /// Closes the open transaction.
    pub fn end(&mut self) {
        if self.open {
            if let Some(txn) = self.transactions.last_mut() {
                txn.seal();
            }
        }
        self.open = false;
        self.pending = None;
    }

    /// Ensures a transaction is open and snapshots `address` if this is its
    /// first touch in that transaction. Returns true if a snapshot was taken.
    ///
    /// Must run before the caller mutates the entity.
    pub fn begin_or_continue(
        &mut self,
        graph: &ContentGraph,
        address: &EntityAddress,
        meta: &ChangeMeta,
    ) -> bool {
        let cap = self.config.max_changes_per_transaction;
        let txn = self.open_transaction();
        if txn.has_snapshot(address) {
            return false;
        }
        debug!(txn = %txn.id(), address = %address, "snapshotting before first touch");
        txn.push_before(Change::capture(graph, address, meta.clone()), cap);
        true
    }

    /// Checks, snapshots and applies `mutation`.
    ///
    /// # Errors
    ///
    /// Returns the check error without touching the log or the graph, or
    /// the apply error after recording whatever the graph now holds.
    pub fn apply<L: LayoutOps + ?Sized>(
        &mut self,
        graph: &mut ContentGraph,
        layout: &mut L,
        mutation: &Mutation,
    ) -> CoreResult<()> {
        mutation.check(graph, layout)?;

        let address = mutation.address();
        let meta = mutation.meta();
        self.begin_or_continue(graph, &address, &meta);
        let applied = mutation.apply(graph, layout);

        let cap = self.config.max_changes_per_transaction;
        let txn = self.open_transaction();
        txn.record_after(graph, &address, meta, cap);
        debug!(txn = %txn.id(), mutation = mutation.name(), address = %address, "applied mutation");
        applied
    }

    /// Reverts one transaction, or every transaction after `target`.
    ///
    /// Returns the number of transactions reverted. Reverting to the last
    /// transaction is a no-op.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NothingToRevert`] if only the sentinel is left
    /// - [`CoreError::TransactionNotFound`] if `target` is not in the log
    ///
    /// Nothing is mutated when an error is returned.
    pub fn try_revert_to<L: LayoutOps + ?Sized>(
        &mut self,
        graph: &mut ContentGraph,
        layout: &mut L,
        target: Option<TransactionId>,
    ) -> CoreResult<usize> {
        if !self.can_revert() {
            return Err(CoreError::NothingToRevert);
        }
        if let Some(id) = target {
            if !self.transactions.iter().any(|t| t.id() == id) {
                return Err(CoreError::TransactionNotFound { id });
            }
        }
        self.end();

        let mut reverted = 0;
        while target != Some(self.last_id()) {
            let Some(txn) = self.pop_revertible() else {
                break;
            };
            revert_transaction(graph, layout, &txn, Direction::Backward);
            self.redo.push_front(txn);
            reverted += 1;
            if target.is_none() {
                break;
            }
        }
        info!(reverted, last = %self.last_id(), "reverted transactions");
        Ok(reverted)
    }

    /// Like [`try_revert_to`](Self::try_revert_to), but logs a refused
    /// request and returns 0.
    pub fn revert_to<L: LayoutOps + ?Sized>(
        &mut self,
        graph: &mut ContentGraph,
        layout: &mut L,
        target: Option<TransactionId>,
    ) -> usize {
        self.try_revert_to(graph, layout, target).unwrap_or_else(|e| {
            warn!(requested = ?target, error = %e, "revert refused");
            0
        })
    }

    /// Reapplies one transaction from the redo buffer, or every buffered
    /// transaction up to and including `target`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NothingToUnrevert`] if the redo buffer is empty
    /// - [`CoreError::TransactionNotFound`] if `target` is not in the redo buffer
    ///
    /// Nothing is mutated when an error is returned.
    pub fn try_unrevert_to<L: LayoutOps + ?Sized>(
        &mut self,
        graph: &mut ContentGraph,
        layout: &mut L,
        target: Option<TransactionId>,
    ) -> CoreResult<usize> {
        if self.redo.is_empty() {
            return Err(CoreError::NothingToUnrevert);
        }
        if let Some(id) = target {
            if !self.redo.iter().any(|t| t.id() == id) {
                return Err(CoreError::TransactionNotFound { id });
            }
        }
        self.end();

        let mut unreverted = 0;
        while let Some(txn) = self.redo.pop_front() {
            revert_transaction(graph, layout, &txn, Direction::Forward);
            let id = txn.id();
            self.transactions.push(txn);
            unreverted += 1;
            if target.map_or(true, |target| target == id) {
                break;
            }
        }
        info!(unreverted, last = %self.last_id(), "unreverted transactions");
        Ok(unreverted)
    }

    /// Like [`try_unrevert_to`](Self::try_unrevert_to), but logs a refused
    /// request and returns 0.
    pub fn unrevert_to<L: LayoutOps + ?Sized>(
        &mut self,
        graph: &mut ContentGraph,
        layout: &mut L,
        target: Option<TransactionId>,
    ) -> usize {
        self.try_unrevert_to(graph, layout, target)
            .unwrap_or_else(|e| {
                warn!(requested = ?target, error = %e, "unrevert refused");
                0
            })
    }

    /// Lists the log followed by the redo buffer, in ID order.
    #[must_use]
    pub fn history(&self) -> Vec<TransactionSummary> {
        self.transactions
            .iter()
            .map(|t| t.summary(false))
            .chain(self.redo.iter().map(|t| t.summary(true)))
            .collect()
    }

    /// Clones the log for persistence. The redo buffer is not persisted.
    #[must_use]
    pub fn to_persisted(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    fn pop_revertible(&mut self) -> Option<Transaction> {
        if self.transactions.last()?.is_sentinel() {
            return None;
        }
        self.transactions.pop()
    }

    /// Returns the open transaction, opening one first if needed.
    fn open_transaction(&mut self) -> &mut Transaction {
        if !self.open || !self.can_revert() {
            let action = self.pending.take().unwrap_or(ActionType::Implicit);
            let id = TransactionId::new(self.next_id);
            self.next_id += 1;
            if !self.redo.is_empty() {
                debug!(dropped = self.redo.len(), "new transaction clears redo buffer");
                self.redo.clear();
            }
            debug!(txn = %id, action = action.label(), "opening transaction");
            self.transactions.push(Transaction::new(id, action));
            self.open = true;
        }
        let last = self.transactions.len() - 1;
        &mut self.transactions[last]
    }
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::types::BoardId;

    struct Fixture {
        graph: ContentGraph,
        layout: Layout,
        log: TransactionLog,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                graph: ContentGraph::new(),
                layout: Layout::with_main_board(BoardId::new("main"), "Main"),
                log: TransactionLog::default(),
            }
        }

        fn act(&mut self, action: ActionType, mutation: Mutation) -> CoreResult<()> {
            self.log.begin(action);
            let result = self.log.apply(&mut self.graph, &mut self.layout, &mutation);
            self.log.end();
            result
        }

        fn create_type(&mut self, id: &str, name: &str) {
            self.act(
                ActionType::CreateType,
                Mutation::CreateType {
                    t_id: id.into(),
                    name: name.into(),
                    tile: None,
                },
            )
            .unwrap();
        }

        fn rename(&mut self, id: &str, name: &str) {
            self.act(
                ActionType::RenameType,
                Mutation::RenameType {
                    t_id: id.into(),
                    name: name.into(),
                },
            )
            .unwrap();
        }

        fn revert(&mut self, target: Option<TransactionId>) -> CoreResult<usize> {
            self.log.try_revert_to(&mut self.graph, &mut self.layout, target)
        }

        fn unrevert(&mut self, target: Option<TransactionId>) -> CoreResult<usize> {
            self.log.try_unrevert_to(&mut self.graph, &mut self.layout, target)
        }

        fn type_name(&self, id: &str) -> Option<String> {
            self.graph.type_wrapper(&id.into()).map(|t| t.name.clone())
        }
    }

    #[test]
    fn new_log_has_only_sentinel() {
        let log = TransactionLog::default();
        assert_eq!(log.transactions().len(), 1);
        assert!(log.last_id().is_sentinel());
        assert!(log.is_empty());
        assert!(!log.can_revert());
        assert!(!log.can_unrevert());
    }

    #[test]
    fn revert_on_empty_log_is_refused() {
        let mut fx = Fixture::new();
        assert_eq!(fx.revert(None), Err(CoreError::NothingToRevert));
        assert_eq!(
            fx.log.revert_to(&mut fx.graph, &mut fx.layout, None),
            0
        );
        assert_eq!(fx.log.transactions().len(), 1);
    }

    #[test]
    fn revert_and_unrevert_single_step() {
        let mut fx = Fixture::new();
        fx.create_type("t", "A");
        fx.rename("t", "B");

        assert_eq!(fx.revert(None), Ok(1));
        assert_eq!(fx.type_name("t").as_deref(), Some("A"));
        assert!(fx.log.can_unrevert());

        assert_eq!(fx.unrevert(None), Ok(1));
        assert_eq!(fx.type_name("t").as_deref(), Some("B"));
        assert!(!fx.log.can_unrevert());
    }

    #[test]
    fn revert_to_walks_back_sequentially() {
        let mut fx = Fixture::new();
        fx.create_type("t", "A");
        let first = fx.log.last_id();
        fx.rename("t", "B");
        fx.rename("t", "C");

        assert_eq!(fx.revert(Some(first)), Ok(2));
        assert_eq!(fx.log.last_id(), first);
        assert_eq!(fx.type_name("t").as_deref(), Some("A"));

        assert_eq!(fx.revert(Some(TransactionId::SENTINEL)), Ok(1));
        assert_eq!(fx.type_name("t"), None);
        assert_eq!(fx.log.redo_buffer().count(), 3);
    }

    #[test]
    fn revert_to_last_is_noop() {
        let mut fx = Fixture::new();
        fx.create_type("t", "A");
        let last = fx.log.last_id();
        assert_eq!(fx.revert(Some(last)), Ok(0));
        assert!(fx.type_name("t").is_some());
    }

    #[test]
    fn revert_to_unknown_id_mutates_nothing() {
        let mut fx = Fixture::new();
        fx.create_type("t", "A");

        let missing = TransactionId::new(99);
        assert_eq!(
            fx.revert(Some(missing)),
            Err(CoreError::TransactionNotFound { id: missing })
        );
        assert_eq!(fx.log.len(), 1);
        assert!(fx.type_name("t").is_some());
    }

    #[test]
    fn unrevert_to_target_replays_in_order() {
        let mut fx = Fixture::new();
        fx.create_type("t", "A");
        fx.rename("t", "B");
        let second = fx.log.last_id();
        fx.rename("t", "C");

        fx.revert(Some(TransactionId::SENTINEL)).unwrap();
        assert_eq!(fx.unrevert(Some(second)), Ok(2));
        assert_eq!(fx.type_name("t").as_deref(), Some("B"));
        assert_eq!(fx.log.last_id(), second);
        assert_eq!(fx.log.redo_buffer().count(), 1);
    }

    #[test]
    fn unrevert_unknown_or_empty_is_refused() {
        let mut fx = Fixture::new();
        assert_eq!(fx.unrevert(None), Err(CoreError::NothingToUnrevert));

        fx.create_type("t", "A");
        fx.revert(None).unwrap();
        let missing = TransactionId::new(42);
        assert_eq!(
            fx.unrevert(Some(missing)),
            Err(CoreError::TransactionNotFound { id: missing })
        );
        assert_eq!(fx.log.unrevert_to(&mut fx.graph, &mut fx.layout, Some(missing)), 0);
        assert!(fx.type_name("t").is_none());
    }

    #[test]
    fn new_mutation_clears_redo() {
        let mut fx = Fixture::new();
        fx.create_type("t", "A");
        fx.rename("t", "B");
        fx.revert(None).unwrap();
        assert!(fx.log.can_unrevert());

        fx.rename("t", "Z");
        assert!(!fx.log.can_unrevert());
        assert_eq!(fx.unrevert(None), Err(CoreError::NothingToUnrevert));
    }

    #[test]
    fn rejected_action_leaves_log_untouched() {
        let mut fx = Fixture::new();
        fx.create_type("t", "A");
        fx.revert(None).unwrap();

        let result = fx.act(
            ActionType::RenameType,
            Mutation::RenameType {
                t_id: "missing".into(),
                name: "X".into(),
            },
        );
        assert!(result.is_err());
        assert!(fx.log.is_empty());
        assert!(fx.log.can_unrevert());
    }

    #[test]
    fn several_mutations_share_one_transaction() {
        let mut fx = Fixture::new();
        fx.log.begin(ActionType::Custom("bulk".into()));
        for name in ["A", "B", "C"] {
            let mutation = if name == "A" {
                Mutation::CreateType {
                    t_id: "t".into(),
                    name: name.into(),
                    tile: None,
                }
            } else {
                Mutation::RenameType {
                    t_id: "t".into(),
                    name: name.into(),
                }
            };
            fx.log
                .apply(&mut fx.graph, &mut fx.layout, &mutation)
                .unwrap();
        }
        fx.log.end();

        assert_eq!(fx.log.len(), 1);
        assert_eq!(fx.log.transactions()[1].changes().len(), 2);

        fx.revert(None).unwrap();
        assert!(fx.type_name("t").is_none());
        fx.unrevert(None).unwrap();
        assert_eq!(fx.type_name("t").as_deref(), Some("C"));
    }

    #[test]
    fn mutation_without_action_opens_implicit_transaction() {
        let mut fx = Fixture::new();
        fx.log
            .apply(
                &mut fx.graph,
                &mut fx.layout,
                &Mutation::CreateType {
                    t_id: "t".into(),
                    name: "A".into(),
                    tile: None,
                },
            )
            .unwrap();

        let last = &fx.log.transactions()[1];
        assert_eq!(last.action_type(), &ActionType::Implicit);
        assert!(fx.log.is_open());
    }

    #[test]
    fn begin_or_continue_snapshots_once() {
        let mut fx = Fixture::new();
        let address = EntityAddress::type_wrapper(&"t".into());
        let meta = ChangeMeta::default();

        fx.log.begin(ActionType::CreateType);
        assert!(fx.log.begin_or_continue(&fx.graph, &address, &meta));
        assert!(!fx.log.begin_or_continue(&fx.graph, &address, &meta));
    }

    #[test]
    fn persisted_log_continues_ids() {
        let mut fx = Fixture::new();
        fx.create_type("t", "A");
        fx.rename("t", "B");

        let mut restored =
            TransactionLog::from_persisted(fx.log.to_persisted(), HistoryConfig::default());
        assert_eq!(restored.len(), 2);
        assert!(!restored.can_unrevert());

        let mut graph = fx.graph.clone();
        let mut layout = fx.layout.clone();
        restored.begin(ActionType::RenameType);
        restored
            .apply(
                &mut graph,
                &mut layout,
                &Mutation::RenameType {
                    t_id: "t".into(),
                    name: "C".into(),
                },
            )
            .unwrap();
        assert_eq!(restored.last_id(), TransactionId::new(3));
    }

    #[test]
    fn history_lists_undone_transactions() {
        let mut fx = Fixture::new();
        fx.create_type("t", "A");
        fx.rename("t", "B");
        fx.rename("t", "C");
        fx.revert(None).unwrap();
        fx.revert(None).unwrap();

        let history = fx.log.history();
        let rows: Vec<_> = history.iter().map(|s| (s.id.as_u64(), s.undone)).collect();
        assert_eq!(rows, [(0, false), (1, false), (2, true), (3, true)]);
    }
}
