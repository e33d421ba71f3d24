//! Entity addresses and snapshots.

use crate::entity::{EntityId, Instance, PropDefinition, PropValues, TypeWrapper};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four independently addressable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    /// A type.
    TypeWrapper,
    /// One property definition of a type.
    PropDefinition,
    /// One instance of a type.
    Instance,
    /// The values of one property of one instance.
    PropValues,
}

/// Address of one mutable cell of the content graph.
///
/// Serialized with an `entityType` tag and `tId`/`iId`/`pN` fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "entityType", rename_all = "camelCase")]
pub enum EntityAddress {
    /// A type.
    TypeWrapper {
        /// Type ID.
        #[serde(rename = "tId")]
        t_id: EntityId,
    },
    /// A property definition.
    PropDefinition {
        /// Type ID.
        #[serde(rename = "tId")]
        t_id: EntityId,
        /// Property name.
        #[serde(rename = "pN")]
        p_n: String,
    },
    /// An instance.
    Instance {
        /// Type ID.
        #[serde(rename = "tId")]
        t_id: EntityId,
        /// Instance ID.
        #[serde(rename = "iId")]
        i_id: EntityId,
    },
    /// The values of one property of an instance.
    PropValues {
        /// Type ID.
        #[serde(rename = "tId")]
        t_id: EntityId,
        /// Instance ID.
        #[serde(rename = "iId")]
        i_id: EntityId,
        /// Property name.
        #[serde(rename = "pN")]
        p_n: String,
    },
}

impl EntityAddress {
    /// Address of a type.
    #[must_use]
    pub fn type_wrapper(t_id: &EntityId) -> Self {
        Self::TypeWrapper { t_id: t_id.clone() }
    }

    /// Address of a property definition.
    #[must_use]
    pub fn prop_definition(t_id: &EntityId, p_n: &str) -> Self {
        Self::PropDefinition {
            t_id: t_id.clone(),
            p_n: p_n.to_string(),
        }
    }

    /// Address of an instance.
    #[must_use]
    pub fn instance(t_id: &EntityId, i_id: &EntityId) -> Self {
        Self::Instance {
            t_id: t_id.clone(),
            i_id: i_id.clone(),
        }
    }

    /// Address of an instance's property values.
    #[must_use]
    pub fn prop_values(t_id: &EntityId, i_id: &EntityId, p_n: &str) -> Self {
        Self::PropValues {
            t_id: t_id.clone(),
            i_id: i_id.clone(),
            p_n: p_n.to_string(),
        }
    }

    /// Returns the entity kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityAddress::TypeWrapper { .. } => EntityKind::TypeWrapper,
            EntityAddress::PropDefinition { .. } => EntityKind::PropDefinition,
            EntityAddress::Instance { .. } => EntityKind::Instance,
            EntityAddress::PropValues { .. } => EntityKind::PropValues,
        }
    }

    /// Returns the type ID every address carries.
    #[must_use]
    pub fn type_id(&self) -> &EntityId {
        match self {
            EntityAddress::TypeWrapper { t_id }
            | EntityAddress::PropDefinition { t_id, .. }
            | EntityAddress::Instance { t_id, .. }
            | EntityAddress::PropValues { t_id, .. } => t_id,
        }
    }
}

impl fmt::Display for EntityAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityAddress::TypeWrapper { t_id } => write!(f, "type {t_id}"),
            EntityAddress::PropDefinition { t_id, p_n } => write!(f, "prop {t_id}.{p_n}"),
            EntityAddress::Instance { t_id, i_id } => write!(f, "instance {t_id}/{i_id}"),
            EntityAddress::PropValues { t_id, i_id, p_n } => {
                write!(f, "values {t_id}/{i_id}.{p_n}")
            }
        }
    }
}

/// A deep copy of one entity's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntitySnapshot {
    /// A type, including its property definitions.
    TypeWrapper(TypeWrapper),
    /// A property definition.
    PropDefinition(PropDefinition),
    /// An instance, including all its values.
    Instance(Instance),
    /// Property values.
    PropValues(PropValues),
}

impl EntitySnapshot {
    /// Returns the entity kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            EntitySnapshot::TypeWrapper(_) => EntityKind::TypeWrapper,
            EntitySnapshot::PropDefinition(_) => EntityKind::PropDefinition,
            EntitySnapshot::Instance(_) => EntityKind::Instance,
            EntitySnapshot::PropValues(_) => EntityKind::PropValues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_wire_shape() {
        let address = EntityAddress::prop_values(&"t1".into(), &"i1".into(), "title");
        let json = serde_json::to_value(&address).unwrap();

        assert_eq!(json["entityType"], "propValues");
        assert_eq!(json["tId"], "t1");
        assert_eq!(json["iId"], "i1");
        assert_eq!(json["pN"], "title");

        let back: EntityAddress = serde_json::from_value(json).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn kinds_match() {
        let address = EntityAddress::type_wrapper(&"t".into());
        let snapshot = EntitySnapshot::TypeWrapper(TypeWrapper::new("t".into(), "T"));
        assert_eq!(address.kind(), snapshot.kind());
        assert_eq!(address.type_id().as_str(), "t");
    }

    #[test]
    fn address_display() {
        let address = EntityAddress::instance(&"t".into(), &"i".into());
        assert_eq!(address.to_string(), "instance t/i");
    }
}
