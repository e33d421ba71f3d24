//! Property-based test generators using proptest.
//!
//! Actions refer to entities by slot number instead of ID. A slot is
//! resolved modulo whatever exists when the action runs, so any generated
//! sequence can be replayed against any session.

use proptest::prelude::*;
use serde_json::json;
use tessera_core::{
    ContentGraph, CoreResult, EntityId, ProjectSession, PropDefinition, PropValues,
    TilePlacement, TileType, ValueType,
};

/// Property names drawn by the generators.
pub const PROP_NAMES: [&str; 4] = ["title", "size", "done", "due"];

/// A user action against a project session.
#[derive(Debug, Clone)]
pub enum Action {
    /// Create a type.
    CreateType {
        /// Display name.
        name: String,
        /// Whether to place a tile on the active board.
        with_tile: bool,
    },
    /// Rename a type.
    RenameType {
        /// Type slot.
        slot: usize,
        /// New name.
        name: String,
    },
    /// Delete a type with its instances.
    DeleteType {
        /// Type slot.
        slot: usize,
    },
    /// Add or replace a property definition. A replaced definition keeps
    /// its array flag.
    PutProp {
        /// Type slot.
        slot: usize,
        /// Index into [`PROP_NAMES`].
        prop: usize,
        /// Whether the property holds several values.
        array: bool,
    },
    /// Remove a property definition.
    RemoveProp {
        /// Type slot.
        slot: usize,
        /// Property slot on that type.
        prop: usize,
    },
    /// Rename a property.
    RenameProp {
        /// Type slot.
        slot: usize,
        /// Property slot on that type.
        prop: usize,
        /// Index into [`PROP_NAMES`] of the new name.
        to: usize,
    },
    /// Create an instance.
    CreateInstance {
        /// Type slot.
        slot: usize,
        /// Whether the instance gets its own board.
        with_board: bool,
    },
    /// Delete an instance.
    DeleteInstance {
        /// Type slot.
        slot: usize,
        /// Instance slot of that type.
        instance: usize,
    },
    /// Replace the values of a property.
    SetValues {
        /// Type slot.
        slot: usize,
        /// Instance slot of that type.
        instance: usize,
        /// Property slot on that type.
        prop: usize,
        /// New values. Truncated to one for scalar properties.
        values: Vec<i64>,
    },
}

/// Strategy for type names.
pub fn type_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{0,11}").expect("Invalid regex")
}

/// Strategy for a single action.
pub fn action_strategy() -> impl Strategy<Value = Action> {
    let slot = 0..8usize;
    prop_oneof![
        3 => (type_name_strategy(), any::<bool>())
            .prop_map(|(name, with_tile)| Action::CreateType { name, with_tile }),
        1 => (slot.clone(), type_name_strategy())
            .prop_map(|(slot, name)| Action::RenameType { slot, name }),
        1 => slot.clone().prop_map(|slot| Action::DeleteType { slot }),
        3 => (slot.clone(), 0..PROP_NAMES.len(), any::<bool>())
            .prop_map(|(slot, prop, array)| Action::PutProp { slot, prop, array }),
        1 => (slot.clone(), slot.clone())
            .prop_map(|(slot, prop)| Action::RemoveProp { slot, prop }),
        1 => (slot.clone(), slot.clone(), 0..PROP_NAMES.len())
            .prop_map(|(slot, prop, to)| Action::RenameProp { slot, prop, to }),
        3 => (slot.clone(), any::<bool>())
            .prop_map(|(slot, with_board)| Action::CreateInstance { slot, with_board }),
        1 => (slot.clone(), slot.clone())
            .prop_map(|(slot, instance)| Action::DeleteInstance { slot, instance }),
        4 => (slot.clone(), slot.clone(), slot, prop::collection::vec(any::<i64>(), 0..4))
            .prop_map(|(slot, instance, prop, values)| Action::SetValues {
                slot,
                instance,
                prop,
                values,
            }),
    ]
}

/// Strategy for a sequence of actions.
pub fn action_sequence_strategy(
    min_actions: usize,
    max_actions: usize,
) -> impl Strategy<Value = Vec<Action>> {
    prop::collection::vec(action_strategy(), min_actions..max_actions)
}

/// Runs `action` against `session`.
///
/// Returns `Ok(false)` when the action had nothing to target, for example
/// deleting an instance of a type that has none.
///
/// # Errors
///
/// Returns the session's error for actions that were refused.
pub fn apply_action(session: &mut ProjectSession, action: &Action) -> CoreResult<bool> {
    match action {
        Action::CreateType { name, with_tile } => {
            let tile = with_tile
                .then(|| session.layout().active_board.clone())
                .flatten()
                .map(|board| TilePlacement::new(board, TileType::TypeTable));
            session.create_type(name, tile)?;
        }
        Action::RenameType { slot, name } => {
            let Some(t_id) = type_at(session.graph(), *slot) else {
                return Ok(false);
            };
            session.rename_type(&t_id, name)?;
        }
        Action::DeleteType { slot } => {
            let Some(t_id) = type_at(session.graph(), *slot) else {
                return Ok(false);
            };
            session.delete_type(&t_id)?;
        }
        Action::PutProp { slot, prop, array } => {
            let Some(t_id) = type_at(session.graph(), *slot) else {
                return Ok(false);
            };
            let name = PROP_NAMES[prop % PROP_NAMES.len()];
            let order = u32::try_from(*prop).unwrap_or(u32::MAX);
            let mut definition = PropDefinition::new(name, ValueType::Number, order);
            // Stored values must stay valid for the replaced definition.
            let array = session
                .graph()
                .prop_definition(&t_id, name)
                .map_or(*array, |d| d.is_array);
            if array {
                definition = definition.array();
            }
            session.put_prop(&t_id, definition)?;
        }
        Action::RemoveProp { slot, prop } => {
            let Some((t_id, p_n)) = prop_at(session.graph(), *slot, *prop) else {
                return Ok(false);
            };
            session.remove_prop(&t_id, &p_n)?;
        }
        Action::RenameProp { slot, prop, to } => {
            let Some((t_id, p_n)) = prop_at(session.graph(), *slot, *prop) else {
                return Ok(false);
            };
            let new_name = PROP_NAMES[to % PROP_NAMES.len()];
            if session.graph().prop_definition(&t_id, new_name).is_some() {
                return Ok(false);
            }
            session.rename_prop(&t_id, &p_n, new_name)?;
        }
        Action::CreateInstance { slot, with_board } => {
            let Some(t_id) = type_at(session.graph(), *slot) else {
                return Ok(false);
            };
            session.create_instance(&t_id, *with_board)?;
        }
        Action::DeleteInstance { slot, instance } => {
            let Some((t_id, i_id)) = instance_at(session.graph(), *slot, *instance) else {
                return Ok(false);
            };
            session.delete_instance(&t_id, &i_id)?;
        }
        Action::SetValues {
            slot,
            instance,
            prop,
            values,
        } => {
            let Some((t_id, i_id)) = instance_at(session.graph(), *slot, *instance) else {
                return Ok(false);
            };
            let Some((_, p_n)) = prop_at(session.graph(), *slot, *prop) else {
                return Ok(false);
            };
            let is_array = session
                .graph()
                .prop_definition(&t_id, &p_n)
                .is_some_and(|d| d.is_array);
            let mut values: Vec<_> = values.iter().map(|v| json!(v)).collect();
            if !is_array {
                values.truncate(1);
            }
            session.set_values(&t_id, &i_id, &p_n, PropValues::new(values))?;
        }
    }
    Ok(true)
}

/// Returns a copy of `graph` with every type's properties sorted by
/// `(order, name)`.
///
/// Properties sharing an `order` key have no defined relative position, so
/// comparisons across undo and redo go through this form.
#[must_use]
pub fn canonical(graph: &ContentGraph) -> ContentGraph {
    let mut graph = graph.clone();
    for wrapper in graph.types.values_mut() {
        wrapper
            .props
            .sort_by(|a, b| (a.order, &a.name).cmp(&(b.order, &b.name)));
    }
    graph
}

fn type_at(graph: &ContentGraph, slot: usize) -> Option<EntityId> {
    let count = graph.types.len();
    if count == 0 {
        return None;
    }
    graph.types.keys().nth(slot % count).cloned()
}

fn prop_at(graph: &ContentGraph, slot: usize, prop: usize) -> Option<(EntityId, String)> {
    let t_id = type_at(graph, slot)?;
    let props = &graph.type_wrapper(&t_id)?.props;
    if props.is_empty() {
        return None;
    }
    let name = props[prop % props.len()].name.clone();
    Some((t_id, name))
}

fn instance_at(graph: &ContentGraph, slot: usize, instance: usize) -> Option<(EntityId, EntityId)> {
    let t_id = type_at(graph, slot)?;
    let ids: Vec<_> = graph.instances_of(&t_id).map(|i| i.id.clone()).collect();
    if ids.is_empty() {
        return None;
    }
    let i_id = ids[instance % ids.len()].clone();
    Some((t_id, i_id))
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{HistoryConfig, Project};

    fn session() -> ProjectSession {
        ProjectSession::open(Project::new("gen"), HistoryConfig::default())
    }

    #[test]
    fn actions_on_empty_project_have_no_target() {
        let mut session = session();
        let skipped = [
            Action::RenameType { slot: 0, name: "X".into() },
            Action::DeleteType { slot: 3 },
            Action::CreateInstance { slot: 1, with_board: true },
            Action::SetValues { slot: 0, instance: 0, prop: 0, values: vec![1] },
        ];
        for action in &skipped {
            assert!(!apply_action(&mut session, action).unwrap());
        }
        assert!(!session.can_revert());
    }

    #[test]
    fn scalar_values_are_truncated() {
        let mut session = session();
        let actions = [
            Action::CreateType { name: "Task".into(), with_tile: true },
            Action::PutProp { slot: 0, prop: 1, array: false },
            Action::CreateInstance { slot: 0, with_board: false },
            Action::SetValues { slot: 0, instance: 0, prop: 0, values: vec![1, 2, 3] },
        ];
        for action in &actions {
            assert!(apply_action(&mut session, action).unwrap());
        }
        let t_id = session.graph().types.keys().next().cloned().unwrap();
        let i_id = session.graph().instances_of(&t_id).next().unwrap().id.clone();
        let values = session.graph().prop_values(&t_id, &i_id, "size").unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(session.layout().tile_count(), 1);
    }

    #[test]
    fn canonical_orders_ties_by_name() {
        let mut graph = ContentGraph::new();
        let t_id = EntityId::new("t");
        let mut wrapper = tessera_core::TypeWrapper::new(t_id.clone(), "T");
        wrapper.put_prop(PropDefinition::new("b", ValueType::Text, 0));
        wrapper.put_prop(PropDefinition::new("a", ValueType::Text, 0));
        graph.types.insert(t_id.clone(), wrapper);

        let names: Vec<_> = canonical(&graph).types[&t_id]
            .props
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_sequences_apply(actions in action_sequence_strategy(1, 30)) {
            let mut session = session();
            for action in &actions {
                prop_assert!(apply_action(&mut session, action).is_ok());
            }
        }
    }
}
