//! Entity identifier.

use crate::types::short_uuid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a type or an instance.
///
/// IDs are unique across the union of all type IDs and all instance IDs of
/// a project. Uniqueness is enforced when the ID is generated, see
/// [`crate::ContentGraph::generate_id`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates an entity ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a random candidate ID.
    ///
    /// The candidate is not checked against any graph.
    #[must_use]
    pub fn random() -> Self {
        Self(short_uuid())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_differ() {
        let a = EntityId::random();
        let b = EntityId::random();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 12);
    }

    #[test]
    fn display_and_debug() {
        let id = EntityId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(format!("{id:?}"), "EntityId(abc)");
    }
}
