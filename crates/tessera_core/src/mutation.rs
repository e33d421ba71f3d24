//! Mutations: the only way the content graph changes.
//!
//! Each [`Mutation`] targets exactly one [`EntityAddress`]. The transaction
//! log checks it, snapshots the address, then applies it.

use crate::entity::{
    is_reserved_prop, ContentGraph, EntityAddress, EntityId, Instance, PropDefinition,
    PropValues, TypeWrapper,
};
use crate::error::{CoreError, CoreResult};
use crate::layout::{Board, InstanceRef, LayoutOps, TileType};
use crate::types::BoardId;
use serde::{Deserialize, Serialize};

/// Where a type's tile is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilePlacement {
    /// Board holding the tile.
    pub board_id: BoardId,
    /// What the tile shows.
    pub tile_type: TileType,
}

impl TilePlacement {
    /// Creates a placement.
    #[must_use]
    pub fn new(board_id: BoardId, tile_type: TileType) -> Self {
        Self {
            board_id,
            tile_type,
        }
    }
}

/// Bookkeeping recorded next to a change so reverts can redo UI side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMeta {
    /// New name given by a rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    /// Board of the type's tile, or board owned by the instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<BoardId>,
    /// Kind of the type's tile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_type: Option<TileType>,
}

/// A single-address change to the content graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Adds a type, optionally with a tile on a board.
    CreateType {
        /// New type ID.
        t_id: EntityId,
        /// Display name.
        name: String,
        /// Tile to create for the type.
        tile: Option<TilePlacement>,
    },
    /// Renames a type.
    RenameType {
        /// Type ID.
        t_id: EntityId,
        /// New display name.
        name: String,
    },
    /// Removes a type that has no instances, along with its tiles.
    DeleteType {
        /// Type ID.
        t_id: EntityId,
        /// Where the type's tile was, so a revert can put it back.
        tile: Option<TilePlacement>,
    },
    /// Inserts or replaces a property definition.
    PutProp {
        /// Type ID.
        t_id: EntityId,
        /// The definition.
        definition: PropDefinition,
    },
    /// Removes a property definition.
    RemoveProp {
        /// Type ID.
        t_id: EntityId,
        /// Property name.
        p_n: String,
        /// Set when the removal is half of a rename.
        renamed_to: Option<String>,
    },
    /// Adds an instance, optionally with a board it owns.
    CreateInstance {
        /// Type ID.
        t_id: EntityId,
        /// New instance ID.
        i_id: EntityId,
        /// Board to create for the instance.
        board: Option<BoardId>,
    },
    /// Removes an instance and every board it owns.
    DeleteInstance {
        /// Type ID.
        t_id: EntityId,
        /// Instance ID.
        i_id: EntityId,
        /// The board the instance owned, so a revert can put it back.
        board: Option<BoardId>,
    },
    /// Replaces the values of one property of an instance.
    SetValues {
        /// Type ID.
        t_id: EntityId,
        /// Instance ID.
        i_id: EntityId,
        /// Property name.
        p_n: String,
        /// The new values.
        values: PropValues,
    },
    /// Removes the values of one property of an instance.
    ClearValues {
        /// Type ID.
        t_id: EntityId,
        /// Instance ID.
        i_id: EntityId,
        /// Property name.
        p_n: String,
    },
}

impl Mutation {
    /// Returns the address this mutation writes.
    #[must_use]
    pub fn address(&self) -> EntityAddress {
        match self {
            Mutation::CreateType { t_id, .. }
            | Mutation::RenameType { t_id, .. }
            | Mutation::DeleteType { t_id, .. } => EntityAddress::type_wrapper(t_id),
            Mutation::PutProp { t_id, definition } => {
                EntityAddress::prop_definition(t_id, &definition.name)
            }
            Mutation::RemoveProp { t_id, p_n, .. } => EntityAddress::prop_definition(t_id, p_n),
            Mutation::CreateInstance { t_id, i_id, .. }
            | Mutation::DeleteInstance { t_id, i_id, .. } => EntityAddress::instance(t_id, i_id),
            Mutation::SetValues { t_id, i_id, p_n, .. }
            | Mutation::ClearValues { t_id, i_id, p_n } => {
                EntityAddress::prop_values(t_id, i_id, p_n)
            }
        }
    }

    /// Returns the short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::CreateType { .. } => "createType",
            Mutation::RenameType { .. } => "renameType",
            Mutation::DeleteType { .. } => "deleteType",
            Mutation::PutProp { .. } => "putProp",
            Mutation::RemoveProp { .. } => "removeProp",
            Mutation::CreateInstance { .. } => "createInstance",
            Mutation::DeleteInstance { .. } => "deleteInstance",
            Mutation::SetValues { .. } => "setValues",
            Mutation::ClearValues { .. } => "clearValues",
        }
    }

    /// Returns the bookkeeping stored with this mutation's changes.
    #[must_use]
    pub fn meta(&self) -> ChangeMeta {
        match self {
            Mutation::CreateType { name, tile, .. } => ChangeMeta {
                new_name: Some(name.clone()),
                board_id: tile.as_ref().map(|t| t.board_id.clone()),
                tile_type: tile.as_ref().map(|t| t.tile_type),
            },
            Mutation::DeleteType { tile, .. } => ChangeMeta {
                new_name: None,
                board_id: tile.as_ref().map(|t| t.board_id.clone()),
                tile_type: tile.as_ref().map(|t| t.tile_type),
            },
            Mutation::RenameType { name, .. } => ChangeMeta {
                new_name: Some(name.clone()),
                ..ChangeMeta::default()
            },
            Mutation::RemoveProp { renamed_to, .. } => ChangeMeta {
                new_name: renamed_to.clone(),
                ..ChangeMeta::default()
            },
            Mutation::CreateInstance { board, .. } | Mutation::DeleteInstance { board, .. } => {
                ChangeMeta {
                    board_id: board.clone(),
                    ..ChangeMeta::default()
                }
            }
            Mutation::PutProp { .. }
            | Mutation::SetValues { .. }
            | Mutation::ClearValues { .. } => ChangeMeta::default(),
        }
    }

    /// Verifies the mutation can be applied without touching anything.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if a target entity or board is missing
    /// - [`CoreError::IdInUse`] if a new ID collides
    /// - [`CoreError::InvalidArgument`] for bad names or too many values
    /// - [`CoreError::InvalidOperation`] when deleting a type that still has instances
    pub fn check<L: LayoutOps + ?Sized>(&self, graph: &ContentGraph, layout: &L) -> CoreResult<()> {
        match self {
            Mutation::CreateType { t_id, name, tile } => {
                if graph.contains_id(t_id) {
                    return Err(CoreError::IdInUse { id: t_id.clone() });
                }
                if name.trim().is_empty() {
                    return Err(CoreError::invalid_argument("type name is empty"));
                }
                if let Some(tile) = tile {
                    require_board(layout, &tile.board_id)?;
                }
            }
            Mutation::RenameType { t_id, name } => {
                require_type(graph, t_id)?;
                if name.trim().is_empty() {
                    return Err(CoreError::invalid_argument("type name is empty"));
                }
            }
            Mutation::DeleteType { t_id, .. } => {
                require_type(graph, t_id)?;
                if graph.instances_of(t_id).next().is_some() {
                    return Err(CoreError::invalid_operation(format!(
                        "type {t_id} still has instances"
                    )));
                }
            }
            Mutation::PutProp { t_id, definition } => {
                require_type(graph, t_id)?;
                check_prop_name(&definition.name)?;
                if let Some(target) = &definition.ref_target {
                    require_type(graph, target)?;
                }
            }
            Mutation::RemoveProp { t_id, p_n, renamed_to } => {
                if graph.prop_definition(t_id, p_n).is_none() {
                    return Err(CoreError::not_found(format!("prop {t_id}.{p_n}")));
                }
                if let Some(new_name) = renamed_to {
                    check_prop_name(new_name)?;
                }
            }
            Mutation::CreateInstance { t_id, i_id, board } => {
                require_type(graph, t_id)?;
                if graph.contains_id(i_id) {
                    return Err(CoreError::IdInUse { id: i_id.clone() });
                }
                if let Some(board) = board {
                    if layout.has_board(board) {
                        return Err(CoreError::invalid_operation(format!(
                            "board {board} already exists"
                        )));
                    }
                }
            }
            Mutation::DeleteInstance { t_id, i_id, .. }
            | Mutation::ClearValues { t_id, i_id, .. } => {
                require_instance(graph, t_id, i_id)?;
            }
            Mutation::SetValues {
                t_id,
                i_id,
                p_n,
                values,
            } => {
                require_instance(graph, t_id, i_id)?;
                if !is_reserved_prop(p_n) {
                    let definition = graph
                        .prop_definition(t_id, p_n)
                        .ok_or_else(|| CoreError::not_found(format!("prop {t_id}.{p_n}")))?;
                    if !definition.is_array && values.len() > 1 {
                        return Err(CoreError::invalid_argument(format!(
                            "prop {p_n} holds a single value, got {}",
                            values.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies the mutation. Call [`check`](Self::check) first.
    ///
    /// # Errors
    ///
    /// Returns an error if a target disappeared since the check, or if a
    /// layout operation fails.
    pub fn apply<L: LayoutOps + ?Sized>(
        &self,
        graph: &mut ContentGraph,
        layout: &mut L,
    ) -> CoreResult<()> {
        match self {
            Mutation::CreateType { t_id, name, tile } => {
                graph
                    .types
                    .insert(t_id.clone(), TypeWrapper::new(t_id.clone(), name.clone()));
                graph.instances.entry(t_id.clone()).or_default();
                if let Some(tile) = tile {
                    layout.create_tile(&tile.board_id, tile.tile_type, t_id)?;
                }
            }
            Mutation::RenameType { t_id, name } => {
                let wrapper = graph
                    .types
                    .get_mut(t_id)
                    .ok_or_else(|| CoreError::not_found(format!("type {t_id}")))?;
                wrapper.name.clone_from(name);
            }
            Mutation::DeleteType { t_id, .. } => {
                graph.remove(&EntityAddress::type_wrapper(t_id));
                layout.delete_tiles_for_type(t_id);
            }
            Mutation::PutProp { t_id, definition } => {
                let wrapper = graph
                    .types
                    .get_mut(t_id)
                    .ok_or_else(|| CoreError::not_found(format!("type {t_id}")))?;
                wrapper.put_prop(definition.clone());
            }
            Mutation::RemoveProp { t_id, p_n, .. } => {
                graph.remove(&EntityAddress::prop_definition(t_id, p_n));
            }
            Mutation::CreateInstance { t_id, i_id, board } => {
                graph
                    .instances
                    .entry(t_id.clone())
                    .or_default()
                    .insert(i_id.clone(), Instance::new(i_id.clone()));
                if let Some(board) = board {
                    layout.create_board(owned_board(board, t_id, i_id))?;
                }
            }
            Mutation::DeleteInstance { t_id, i_id, .. } => {
                graph.remove(&EntityAddress::instance(t_id, i_id));
                layout.delete_boards_owned_by(&InstanceRef::new(t_id, i_id));
            }
            Mutation::SetValues {
                t_id,
                i_id,
                p_n,
                values,
            } => {
                let instance = graph
                    .instances
                    .get_mut(t_id)
                    .and_then(|m| m.get_mut(i_id))
                    .ok_or_else(|| CoreError::not_found(format!("instance {t_id}/{i_id}")))?;
                instance.props.insert(p_n.clone(), values.clone());
            }
            Mutation::ClearValues { t_id, i_id, p_n } => {
                graph.remove(&EntityAddress::prop_values(t_id, i_id, p_n));
            }
        }
        Ok(())
    }
}

/// The board an instance owns.
pub(crate) fn owned_board(board: &BoardId, t_id: &EntityId, i_id: &EntityId) -> Board {
    Board::new(board.clone(), i_id.as_str()).owned_by(InstanceRef::new(t_id, i_id))
}

fn require_type(graph: &ContentGraph, t_id: &EntityId) -> CoreResult<()> {
    if graph.type_wrapper(t_id).is_none() {
        return Err(CoreError::not_found(format!("type {t_id}")));
    }
    Ok(())
}

fn require_instance(graph: &ContentGraph, t_id: &EntityId, i_id: &EntityId) -> CoreResult<()> {
    if graph.instance(t_id, i_id).is_none() {
        return Err(CoreError::not_found(format!("instance {t_id}/{i_id}")));
    }
    Ok(())
}

fn require_board<L: LayoutOps + ?Sized>(layout: &L, board: &BoardId) -> CoreResult<()> {
    if !layout.has_board(board) {
        return Err(CoreError::not_found(format!("board {board}")));
    }
    Ok(())
}

fn check_prop_name(name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::invalid_argument("prop name is empty"));
    }
    if is_reserved_prop(name) {
        return Err(CoreError::invalid_argument(format!(
            "prop name {name} is reserved"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ValueType;
    use crate::layout::Layout;
    use serde_json::json;

    fn setup() -> (ContentGraph, Layout) {
        let mut graph = ContentGraph::new();
        let mut layout = Layout::with_main_board(BoardId::new("main"), "Main");
        let create = Mutation::CreateType {
            t_id: "t".into(),
            name: "Task".into(),
            tile: Some(TilePlacement::new(BoardId::new("main"), TileType::TypeTable)),
        };
        create.check(&graph, &layout).unwrap();
        create.apply(&mut graph, &mut layout).unwrap();
        (graph, layout)
    }

    fn apply(graph: &mut ContentGraph, layout: &mut Layout, mutation: Mutation) -> CoreResult<()> {
        mutation.check(graph, layout)?;
        mutation.apply(graph, layout)
    }

    #[test]
    fn create_type_places_tile() {
        let (graph, layout) = setup();
        assert!(graph.type_wrapper(&"t".into()).is_some());
        assert!(layout.has_tile_for_type(&"t".into()));
    }

    #[test]
    fn create_type_rejects_taken_id() {
        let (mut graph, mut layout) = setup();
        let result = apply(
            &mut graph,
            &mut layout,
            Mutation::CreateType {
                t_id: "t".into(),
                name: "Again".into(),
                tile: None,
            },
        );
        assert_eq!(result, Err(CoreError::IdInUse { id: "t".into() }));
    }

    #[test]
    fn delete_type_requires_no_instances() {
        let (mut graph, mut layout) = setup();
        apply(
            &mut graph,
            &mut layout,
            Mutation::CreateInstance {
                t_id: "t".into(),
                i_id: "i".into(),
                board: None,
            },
        )
        .unwrap();

        let result = apply(
            &mut graph,
            &mut layout,
            Mutation::DeleteType {
                t_id: "t".into(),
                tile: None,
            },
        );
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
    }

    #[test]
    fn set_values_validates_prop() {
        let (mut graph, mut layout) = setup();
        apply(
            &mut graph,
            &mut layout,
            Mutation::PutProp {
                t_id: "t".into(),
                definition: PropDefinition::new("title", ValueType::Text, 0),
            },
        )
        .unwrap();
        apply(
            &mut graph,
            &mut layout,
            Mutation::CreateInstance {
                t_id: "t".into(),
                i_id: "i".into(),
                board: Some(BoardId::new("b-i")),
            },
        )
        .unwrap();
        assert!(layout.has_board(&BoardId::new("b-i")));

        let set = |p_n: &str, values: Vec<serde_json::Value>| Mutation::SetValues {
            t_id: "t".into(),
            i_id: "i".into(),
            p_n: p_n.into(),
            values: PropValues::new(values),
        };

        assert!(apply(&mut graph, &mut layout, set("title", vec![json!("a")])).is_ok());
        assert!(apply(&mut graph, &mut layout, set("_created", vec![json!(1)])).is_ok());
        assert!(matches!(
            apply(&mut graph, &mut layout, set("missing", vec![json!(1)])),
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            apply(&mut graph, &mut layout, set("title", vec![json!("a"), json!("b")])),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn reserved_prop_names_rejected() {
        let (mut graph, mut layout) = setup();
        let result = apply(
            &mut graph,
            &mut layout,
            Mutation::PutProp {
                t_id: "t".into(),
                definition: PropDefinition::new("_meta", ValueType::Text, 0),
            },
        );
        assert!(matches!(result, Err(CoreError::InvalidArgument { .. })));
    }

    #[test]
    fn addresses_and_meta() {
        let mutation = Mutation::SetValues {
            t_id: "t".into(),
            i_id: "i".into(),
            p_n: "title".into(),
            values: PropValues::default(),
        };
        assert_eq!(
            mutation.address(),
            EntityAddress::prop_values(&"t".into(), &"i".into(), "title")
        );
        assert_eq!(mutation.meta(), ChangeMeta::default());

        let rename = Mutation::RenameType {
            t_id: "t".into(),
            name: "Job".into(),
        };
        assert_eq!(rename.meta().new_name.as_deref(), Some("Job"));
        assert_eq!(rename.name(), "renameType");
    }
}
