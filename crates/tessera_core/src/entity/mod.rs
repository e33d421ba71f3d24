//! Entities of the content graph.
//!
//! Four entity kinds are independently addressable: types, property
//! definitions, instances and property values. [`EntityAddress`] names one
//! cell, [`EntitySnapshot`] holds a deep copy of its value.

mod address;
mod id;
mod model;
mod store;

pub use address::{EntityAddress, EntityKind, EntitySnapshot};
pub use id::EntityId;
pub use model::{
    is_reserved_prop, Instance, PropDefinition, PropValues, TypeWrapper, ValueType,
    RESERVED_PREFIX,
};
pub use store::{ContentGraph, InstanceMap};
