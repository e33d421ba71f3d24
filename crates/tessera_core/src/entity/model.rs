//! Entity value types: types, property definitions, instances and values.

use crate::entity::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of reserved metadata property names.
///
/// Instances may carry values for reserved properties without a matching
/// [`PropDefinition`] on their type.
pub const RESERVED_PREFIX: char = '_';

/// Returns true if `name` is a reserved metadata property.
#[must_use]
pub fn is_reserved_prop(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Value type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// Free text.
    Text,
    /// Numeric value.
    Number,
    /// True or false.
    Boolean,
    /// Calendar date.
    Date,
    /// Reference to an instance of another type.
    Reference,
}

/// Definition of one property of a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDefinition {
    /// Property name, unique within its type.
    pub name: String,
    /// Type of the values.
    pub value_type: ValueType,
    /// Whether the property holds several values.
    #[serde(default)]
    pub is_array: bool,
    /// Ordering key among the type's properties.
    #[serde(default)]
    pub order: u32,
    /// Target type for reference properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_target: Option<EntityId>,
}

impl PropDefinition {
    /// Creates a scalar property definition.
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType, order: u32) -> Self {
        Self {
            name: name.into(),
            value_type,
            is_array: false,
            order,
            ref_target: None,
        }
    }

    /// Marks the property as holding several values.
    #[must_use]
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Sets the reference target type.
    #[must_use]
    pub fn referencing(mut self, target: EntityId) -> Self {
        self.value_type = ValueType::Reference;
        self.ref_target = Some(target);
        self
    }
}

/// A named schema with ordered property definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeWrapper {
    /// Type ID.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Property definitions sorted by their `order` key.
    #[serde(default)]
    pub props: Vec<PropDefinition>,
}

impl TypeWrapper {
    /// Creates a type without properties.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            props: Vec::new(),
        }
    }

    /// Looks up a property definition by name.
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<&PropDefinition> {
        self.props.iter().find(|p| p.name == name)
    }

    /// Inserts or replaces a definition, keeping `props` sorted by `order`.
    pub fn put_prop(&mut self, definition: PropDefinition) {
        self.props.retain(|p| p.name != definition.name);
        let at = self
            .props
            .partition_point(|p| p.order <= definition.order);
        self.props.insert(at, definition);
    }

    /// Removes a definition by name.
    pub fn remove_prop(&mut self, name: &str) -> Option<PropDefinition> {
        let index = self.props.iter().position(|p| p.name == name)?;
        Some(self.props.remove(index))
    }
}

/// The ordered raw values of one property of one instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropValues(pub Vec<serde_json::Value>);

impl PropValues {
    /// Creates a value list.
    #[must_use]
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        Self(values)
    }

    /// Creates a list holding one value.
    #[must_use]
    pub fn single(value: impl Into<serde_json::Value>) -> Self {
        Self(vec![value.into()])
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A concrete record of a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    /// Instance ID.
    pub id: EntityId,
    /// Property name to values.
    #[serde(default)]
    pub props: BTreeMap<String, PropValues>,
}

impl Instance {
    /// Creates an instance without values.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            props: BTreeMap::new(),
        }
    }
}
