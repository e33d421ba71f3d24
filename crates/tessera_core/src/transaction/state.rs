//! Transactions and their changes.

use crate::entity::{ContentGraph, EntityAddress, EntitySnapshot};
use crate::mutation::ChangeMeta;
use crate::types::TransactionId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// The semantic user action a transaction records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    /// The sentinel at the start of every log.
    InitialState,
    /// Mutations applied while no action was open.
    Implicit,
    /// A type was created.
    CreateType,
    /// A type was renamed.
    RenameType,
    /// A type and its instances were deleted.
    DeleteType,
    /// A property definition was added or changed.
    PutProp,
    /// A property and its values were removed.
    RemoveProp,
    /// A property was renamed.
    RenameProp,
    /// An instance was created.
    CreateInstance,
    /// An instance was deleted.
    DeleteInstance,
    /// Property values were edited.
    SetValues,
    /// An editor-defined action.
    Custom(String),
}

impl ActionType {
    /// Returns a display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            ActionType::InitialState => "initialState",
            ActionType::Implicit => "implicit",
            ActionType::CreateType => "createType",
            ActionType::RenameType => "renameType",
            ActionType::DeleteType => "deleteType",
            ActionType::PutProp => "putProp",
            ActionType::RemoveProp => "removeProp",
            ActionType::RenameProp => "renameProp",
            ActionType::CreateInstance => "createInstance",
            ActionType::DeleteInstance => "deleteInstance",
            ActionType::SetValues => "setValues",
            ActionType::Custom(name) => name,
        }
    }
}

/// One snapshot of one entity address.
///
/// `entity_before` is `None` when the entity did not exist at the time of
/// the snapshot. Restoring a change writes that value back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// The snapshotted address.
    #[serde(flatten)]
    pub address: EntityAddress,
    /// The entity value, or `None` if it did not exist.
    pub entity_before: Option<EntitySnapshot>,
    /// UI bookkeeping for the revert side effects.
    #[serde(flatten)]
    pub meta: ChangeMeta,
}

impl Change {
    /// Snapshots `address` in `graph`.
    #[must_use]
    pub fn capture(graph: &ContentGraph, address: &EntityAddress, meta: ChangeMeta) -> Self {
        Self {
            address: address.clone(),
            entity_before: graph.snapshot(address),
            meta,
        }
    }
}

/// The changes produced by one semantic user action.
///
/// The first mutation of an address inside a transaction records two
/// changes: the value before the mutation and the value after it. The
/// second one is refreshed after every later mutation in the same
/// transaction, so that replaying forward ends on the latest value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: TransactionId,
    action_type: ActionType,
    #[serde(default)]
    changes: VecDeque<Change>,
    /// Addresses touched while open, with the absolute index of their
    /// post-mutation change once it has been recorded.
    #[serde(skip)]
    touched: HashMap<EntityAddress, Option<usize>>,
    /// Number of changes evicted from the front.
    #[serde(skip)]
    evicted: usize,
}

impl Transaction {
    /// Creates an empty transaction.
    pub(crate) fn new(id: TransactionId, action_type: ActionType) -> Self {
        Self {
            id,
            action_type,
            changes: VecDeque::new(),
            touched: HashMap::new(),
            evicted: 0,
        }
    }

    /// Creates the sentinel transaction.
    #[must_use]
    pub fn sentinel() -> Self {
        Self::new(TransactionId::SENTINEL, ActionType::InitialState)
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the recorded action.
    #[must_use]
    pub fn action_type(&self) -> &ActionType {
        &self.action_type
    }

    /// Returns the changes, oldest first.
    #[must_use]
    pub fn changes(&self) -> &VecDeque<Change> {
        &self.changes
    }

    /// Returns true for the sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.id.is_sentinel()
    }

    /// Returns true if `address` was already snapshotted in this transaction.
    #[must_use]
    pub fn has_snapshot(&self, address: &EntityAddress) -> bool {
        self.touched.contains_key(address)
    }

    /// Records the pre-mutation change of a first touch.
    pub(crate) fn push_before(&mut self, change: Change, cap: usize) {
        self.touched.insert(change.address.clone(), None);
        self.push(change, cap);
    }

    /// Records the post-mutation change of `address` if it has none yet,
    /// then refreshes every post-mutation change to the current graph.
    pub(crate) fn record_after(
        &mut self,
        graph: &ContentGraph,
        address: &EntityAddress,
        meta: ChangeMeta,
        cap: usize,
    ) {
        if matches!(self.touched.get(address), Some(None)) {
            let index = self.push(Change::capture(graph, address, meta), cap);
            self.touched.insert(address.clone(), Some(index));
        }

        for (address, index) in &self.touched {
            let Some(index) = index else { continue };
            let Some(position) = index.checked_sub(self.evicted) else {
                continue;
            };
            if let Some(change) = self.changes.get_mut(position) {
                change.entity_before = graph.snapshot(address);
            }
        }
    }

    /// Forgets the snapshotted-address set. Called when the transaction closes.
    pub(crate) fn seal(&mut self) {
        self.touched.clear();
    }

    /// Appends a change, evicting the oldest ones above `cap`.
    /// Returns the absolute index of the appended change.
    fn push(&mut self, change: Change, cap: usize) -> usize {
        self.changes.push_back(change);
        let index = self.evicted + self.changes.len() - 1;
        while self.changes.len() > cap.max(1) {
            self.changes.pop_front();
            self.evicted += 1;
        }
        index
    }

    /// Returns a summary for history listings.
    #[must_use]
    pub fn summary(&self, undone: bool) -> TransactionSummary {
        TransactionSummary {
            id: self.id,
            action_type: self.action_type.clone(),
            change_count: self.changes.len(),
            undone,
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.action_type == other.action_type
            && self.changes == other.changes
    }
}

/// One row of a history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    /// Transaction ID.
    pub id: TransactionId,
    /// Recorded action.
    pub action_type: ActionType,
    /// Number of recorded changes.
    pub change_count: usize,
    /// True if the transaction sits in the redo buffer.
    pub undone: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, TypeWrapper};

    fn graph_with(name: &str) -> ContentGraph {
        let mut graph = ContentGraph::new();
        let t_id = EntityId::from("t");
        graph.types.insert(t_id.clone(), TypeWrapper::new(t_id, name));
        graph
    }

    fn type_address() -> EntityAddress {
        EntityAddress::type_wrapper(&"t".into())
    }

    #[test]
    fn sentinel_is_empty() {
        let sentinel = Transaction::sentinel();
        assert!(sentinel.is_sentinel());
        assert_eq!(sentinel.action_type(), &ActionType::InitialState);
        assert!(sentinel.changes().is_empty());
    }

    #[test]
    fn first_touch_records_before_and_after() {
        let mut txn = Transaction::new(TransactionId::new(1), ActionType::RenameType);
        let address = type_address();

        txn.push_before(
            Change::capture(&graph_with("A"), &address, ChangeMeta::default()),
            200,
        );
        assert!(txn.has_snapshot(&address));
        txn.record_after(&graph_with("B"), &address, ChangeMeta::default(), 200);

        assert_eq!(txn.changes().len(), 2);
        let names: Vec<_> = txn
            .changes()
            .iter()
            .map(|c| match &c.entity_before {
                Some(EntitySnapshot::TypeWrapper(t)) => t.name.clone(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn later_touches_refresh_after_value() {
        let mut txn = Transaction::new(TransactionId::new(1), ActionType::RenameType);
        let address = type_address();

        txn.push_before(
            Change::capture(&graph_with("A"), &address, ChangeMeta::default()),
            200,
        );
        txn.record_after(&graph_with("B"), &address, ChangeMeta::default(), 200);
        txn.record_after(&graph_with("C"), &address, ChangeMeta::default(), 200);

        assert_eq!(txn.changes().len(), 2);
        assert_eq!(
            txn.changes()[1].entity_before,
            Some(EntitySnapshot::TypeWrapper(TypeWrapper::new("t".into(), "C")))
        );
    }

    #[test]
    fn cap_evicts_oldest_changes() {
        let mut txn = Transaction::new(TransactionId::new(1), ActionType::SetValues);
        let graph = ContentGraph::new();

        for n in 0..5 {
            let address = EntityAddress::type_wrapper(&EntityId::new(format!("t{n}")));
            txn.push_before(Change::capture(&graph, &address, ChangeMeta::default()), 4);
            txn.record_after(&graph, &address, ChangeMeta::default(), 4);
        }

        assert_eq!(txn.changes().len(), 4);
        assert_eq!(
            txn.changes()[0].address,
            EntityAddress::type_wrapper(&"t3".into())
        );
    }

    #[test]
    fn change_wire_shape() {
        let change = Change {
            address: type_address(),
            entity_before: None,
            meta: ChangeMeta {
                new_name: Some("B".into()),
                ..ChangeMeta::default()
            },
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["entityType"], "typeWrapper");
        assert_eq!(json["tId"], "t");
        assert!(json["entityBefore"].is_null());
        assert_eq!(json["newName"], "B");

        let back: Change = serde_json::from_value(json).unwrap();
        assert_eq!(back, change);
    }

    #[test]
    fn persisted_transactions_compare_by_content() {
        let mut txn = Transaction::new(TransactionId::new(3), ActionType::CreateType);
        txn.push_before(
            Change::capture(&ContentGraph::new(), &type_address(), ChangeMeta::default()),
            200,
        );

        let json = serde_json::to_string(&txn).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, txn);
        assert!(!back.has_snapshot(&type_address()));
    }
}
