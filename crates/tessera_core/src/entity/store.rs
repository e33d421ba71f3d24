//! The content graph: types and their instances.

use crate::entity::{
    EntityAddress, EntityId, EntitySnapshot, Instance, PropDefinition, PropValues, TypeWrapper,
};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Instances of one type, keyed by instance ID.
pub type InstanceMap = BTreeMap<EntityId, Instance>;

/// The mutable content graph of a project.
///
/// # Invariants
///
/// - Every instance map is keyed by the ID of an existing type
/// - IDs are unique across all types and all instances
///
/// The graph offers raw address-level access ([`snapshot`](Self::snapshot),
/// [`restore`](Self::restore), [`remove`](Self::remove)). Callers outside
/// the crate mutate it through [`crate::ProjectSession`] so that every
/// change is recorded in the transaction log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentGraph {
    /// Types by ID.
    #[serde(default)]
    pub types: BTreeMap<EntityId, TypeWrapper>,
    /// Instances by type ID, then instance ID.
    #[serde(default)]
    pub instances: BTreeMap<EntityId, InstanceMap>,
}

impl ContentGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from persisted parts.
    #[must_use]
    pub fn from_parts(
        types: BTreeMap<EntityId, TypeWrapper>,
        instances: BTreeMap<EntityId, InstanceMap>,
    ) -> Self {
        Self { types, instances }
    }

    /// Gets a type.
    #[must_use]
    pub fn type_wrapper(&self, t_id: &EntityId) -> Option<&TypeWrapper> {
        self.types.get(t_id)
    }

    /// Gets a property definition.
    #[must_use]
    pub fn prop_definition(&self, t_id: &EntityId, p_n: &str) -> Option<&PropDefinition> {
        self.types.get(t_id).and_then(|t| t.prop(p_n))
    }

    /// Gets an instance.
    #[must_use]
    pub fn instance(&self, t_id: &EntityId, i_id: &EntityId) -> Option<&Instance> {
        self.instances.get(t_id).and_then(|m| m.get(i_id))
    }

    /// Gets an instance's values for one property.
    #[must_use]
    pub fn prop_values(&self, t_id: &EntityId, i_id: &EntityId, p_n: &str) -> Option<&PropValues> {
        self.instance(t_id, i_id).and_then(|i| i.props.get(p_n))
    }

    /// Iterates over the instances of a type.
    pub fn instances_of(&self, t_id: &EntityId) -> impl Iterator<Item = &Instance> {
        self.instances.get(t_id).into_iter().flat_map(|m| m.values())
    }

    /// Returns the number of types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Returns the total number of instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.values().map(BTreeMap::len).sum()
    }

    /// Returns true if `id` is used by any type or instance.
    #[must_use]
    pub fn contains_id(&self, id: &EntityId) -> bool {
        self.types.contains_key(id) || self.instances.values().any(|m| m.contains_key(id))
    }

    /// Generates an ID unused by any type or instance.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IdExhausted`] if `attempts` candidates all collided.
    pub fn generate_id(&self, attempts: u32) -> CoreResult<EntityId> {
        self.generate_id_with(attempts, EntityId::random)
    }

    fn generate_id_with(
        &self,
        attempts: u32,
        mut candidate: impl FnMut() -> EntityId,
    ) -> CoreResult<EntityId> {
        for _ in 0..attempts {
            let id = candidate();
            if !self.contains_id(&id) {
                return Ok(id);
            }
            debug!(id = %id, "generated id collided, retrying");
        }
        Err(CoreError::IdExhausted { attempts })
    }

    /// Deep-copies the entity at `address`, or `None` if it does not exist.
    #[must_use]
    pub fn snapshot(&self, address: &EntityAddress) -> Option<EntitySnapshot> {
        match address {
            EntityAddress::TypeWrapper { t_id } => self
                .type_wrapper(t_id)
                .cloned()
                .map(EntitySnapshot::TypeWrapper),
            EntityAddress::PropDefinition { t_id, p_n } => self
                .prop_definition(t_id, p_n)
                .cloned()
                .map(EntitySnapshot::PropDefinition),
            EntityAddress::Instance { t_id, i_id } => self
                .instance(t_id, i_id)
                .cloned()
                .map(EntitySnapshot::Instance),
            EntityAddress::PropValues { t_id, i_id, p_n } => self
                .prop_values(t_id, i_id, p_n)
                .cloned()
                .map(EntitySnapshot::PropValues),
        }
    }

    /// Writes `snapshot` back at `address`.
    ///
    /// Missing structural scaffolding is recreated: an empty instance map
    /// for a restored type or a restored instance, and an empty instance for
    /// restored values. A type is never invented.
    ///
    /// # Errors
    ///
    /// - [`CoreError::SnapshotMismatch`] if the snapshot kind differs from the address kind
    /// - [`CoreError::MissingContainer`] if the owning type does not exist
    pub fn restore(&mut self, address: &EntityAddress, snapshot: EntitySnapshot) -> CoreResult<()> {
        match (address, snapshot) {
            (EntityAddress::TypeWrapper { t_id }, EntitySnapshot::TypeWrapper(wrapper)) => {
                self.types.insert(t_id.clone(), wrapper);
                self.instances.entry(t_id.clone()).or_default();
            }
            (EntityAddress::PropDefinition { t_id, .. }, EntitySnapshot::PropDefinition(def)) => {
                let wrapper = self
                    .types
                    .get_mut(t_id)
                    .ok_or_else(|| missing_container(address))?;
                wrapper.put_prop(def);
            }
            (EntityAddress::Instance { t_id, i_id }, EntitySnapshot::Instance(instance)) => {
                let map = self.instance_map_mut(address, t_id)?;
                map.insert(i_id.clone(), instance);
            }
            (EntityAddress::PropValues { t_id, i_id, p_n }, EntitySnapshot::PropValues(values)) => {
                let map = self.instance_map_mut(address, t_id)?;
                let instance = map.entry(i_id.clone()).or_insert_with(|| {
                    debug!(t_id = %t_id, i_id = %i_id, "recreating instance to host values");
                    Instance::new(i_id.clone())
                });
                instance.props.insert(p_n.clone(), values);
            }
            (_, other) => {
                return Err(CoreError::SnapshotMismatch {
                    expected: address.kind(),
                    actual: other.kind(),
                })
            }
        }
        Ok(())
    }

    /// Removes the entity at `address`. Returns true if something was removed.
    ///
    /// Removing a type also drops its instance map.
    pub fn remove(&mut self, address: &EntityAddress) -> bool {
        match address {
            EntityAddress::TypeWrapper { t_id } => {
                let removed = self.types.remove(t_id).is_some();
                self.instances.remove(t_id);
                removed
            }
            EntityAddress::PropDefinition { t_id, p_n } => self
                .types
                .get_mut(t_id)
                .and_then(|t| t.remove_prop(p_n))
                .is_some(),
            EntityAddress::Instance { t_id, i_id } => self
                .instances
                .get_mut(t_id)
                .and_then(|m| m.remove(i_id))
                .is_some(),
            EntityAddress::PropValues { t_id, i_id, p_n } => self
                .instances
                .get_mut(t_id)
                .and_then(|m| m.get_mut(i_id))
                .and_then(|i| i.props.remove(p_n))
                .is_some(),
        }
    }

    fn instance_map_mut(
        &mut self,
        address: &EntityAddress,
        t_id: &EntityId,
    ) -> CoreResult<&mut InstanceMap> {
        if !self.types.contains_key(t_id) {
            return Err(missing_container(address));
        }
        Ok(self.instances.entry(t_id.clone()).or_default())
    }
}

fn missing_container(address: &EntityAddress) -> CoreError {
    CoreError::MissingContainer {
        address: address.to_string(),
    }
}
