//! UI layout data: boards holding tiles.
//!
//! The transaction log never edits the layout directly. Tile and board side
//! effects of reverts go through [`LayoutOps`], the same CRUD operations the
//! editor uses.

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use crate::types::{BoardId, TileId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// What a tile shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileType {
    /// A table listing all instances of a type.
    TypeTable,
    /// A form editing one instance.
    InstanceForm,
}

/// Reference to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRef {
    /// Type ID.
    pub t_id: EntityId,
    /// Instance ID.
    pub i_id: EntityId,
}

impl InstanceRef {
    /// Creates an instance reference.
    #[must_use]
    pub fn new(t_id: &EntityId, i_id: &EntityId) -> Self {
        Self {
            t_id: t_id.clone(),
            i_id: i_id.clone(),
        }
    }
}

/// A tile on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    /// Tile ID.
    pub id: TileId,
    /// What the tile shows.
    pub tile_type: TileType,
    /// The type the tile is bound to.
    pub type_id: EntityId,
}

/// A board: a named canvas of tiles, optionally owned by an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// Board ID.
    pub id: BoardId,
    /// Display name.
    pub name: String,
    /// Owning instance, for boards that live and die with an instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<InstanceRef>,
    /// Tiles in display order.
    #[serde(default)]
    pub tiles: Vec<Tile>,
}

impl Board {
    /// Creates an empty board without owner.
    #[must_use]
    pub fn new(id: BoardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            tiles: Vec::new(),
        }
    }

    /// Sets the owning instance.
    #[must_use]
    pub fn owned_by(mut self, owner: InstanceRef) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// CRUD operations on the UI layout.
///
/// Reverting a type creation deletes its tiles, reverting an instance
/// creation deletes the boards it owns, and restoring either recreates the
/// missing counterpart. All of it goes through this trait.
pub trait LayoutOps {
    /// Returns true if the board exists.
    fn has_board(&self, board: &BoardId) -> bool;

    /// Adds a board.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the ID is taken.
    fn create_board(&mut self, board: Board) -> CoreResult<()>;

    /// Deletes a board. Returns true if it existed.
    fn delete_board(&mut self, board: &BoardId) -> bool;

    /// Deletes every board owned by `owner`. Returns how many were deleted.
    fn delete_boards_owned_by(&mut self, owner: &InstanceRef) -> usize;

    /// Returns the board owned by `owner`, if any.
    fn owned_board(&self, owner: &InstanceRef) -> Option<BoardId>;

    /// Adds a tile bound to `t_id` on `board`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the board does not exist.
    fn create_tile(
        &mut self,
        board: &BoardId,
        tile_type: TileType,
        t_id: &EntityId,
    ) -> CoreResult<TileId>;

    /// Returns true if any board holds a tile bound to `t_id`.
    fn has_tile_for_type(&self, t_id: &EntityId) -> bool;

    /// Returns where the first tile bound to `t_id` sits.
    fn tile_placement(&self, t_id: &EntityId) -> Option<(BoardId, TileType)>;

    /// Deletes every tile bound to `t_id`. Returns how many were deleted.
    fn delete_tiles_for_type(&mut self, t_id: &EntityId) -> usize;
}

/// The UI layout of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Boards by ID.
    #[serde(default)]
    pub boards: BTreeMap<BoardId, Board>,
    /// The board currently shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_board: Option<BoardId>,
}

impl Layout {
    /// Creates a layout with one empty board, made active.
    #[must_use]
    pub fn with_main_board(id: BoardId, name: impl Into<String>) -> Self {
        let mut boards = BTreeMap::new();
        boards.insert(id.clone(), Board::new(id.clone(), name));
        Self {
            boards,
            active_board: Some(id),
        }
    }

    /// Gets a board.
    #[must_use]
    pub fn board(&self, id: &BoardId) -> Option<&Board> {
        self.boards.get(id)
    }

    /// Returns the number of boards.
    #[must_use]
    pub fn board_count(&self) -> usize {
        self.boards.len()
    }

    /// Returns the total number of tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.boards.values().map(|b| b.tiles.len()).sum()
    }
}

impl LayoutOps for Layout {
    fn has_board(&self, board: &BoardId) -> bool {
        self.boards.contains_key(board)
    }

    fn create_board(&mut self, board: Board) -> CoreResult<()> {
        if self.boards.contains_key(&board.id) {
            return Err(CoreError::invalid_operation(format!(
                "board {} already exists",
                board.id
            )));
        }
        debug!(board = %board.id, "creating board");
        self.boards.insert(board.id.clone(), board);
        Ok(())
    }

    fn delete_board(&mut self, board: &BoardId) -> bool {
        if self.active_board.as_ref() == Some(board) {
            self.active_board = None;
        }
        self.boards.remove(board).is_some()
    }

    fn delete_boards_owned_by(&mut self, owner: &InstanceRef) -> usize {
        let owned: Vec<BoardId> = self
            .boards
            .values()
            .filter(|b| b.owner.as_ref() == Some(owner))
            .map(|b| b.id.clone())
            .collect();
        for id in &owned {
            debug!(board = %id, i_id = %owner.i_id, "deleting owned board");
            self.delete_board(id);
        }
        owned.len()
    }

    fn owned_board(&self, owner: &InstanceRef) -> Option<BoardId> {
        self.boards
            .values()
            .find(|b| b.owner.as_ref() == Some(owner))
            .map(|b| b.id.clone())
    }

    fn create_tile(
        &mut self,
        board: &BoardId,
        tile_type: TileType,
        t_id: &EntityId,
    ) -> CoreResult<TileId> {
        let target = self
            .boards
            .get_mut(board)
            .ok_or_else(|| CoreError::not_found(format!("board {board}")))?;
        let id = TileId::generate();
        target.tiles.push(Tile {
            id: id.clone(),
            tile_type,
            type_id: t_id.clone(),
        });
        debug!(board = %board, tile = %id, t_id = %t_id, "created tile");
        Ok(id)
    }

    fn has_tile_for_type(&self, t_id: &EntityId) -> bool {
        self.boards
            .values()
            .any(|b| b.tiles.iter().any(|t| &t.type_id == t_id))
    }

    fn tile_placement(&self, t_id: &EntityId) -> Option<(BoardId, TileType)> {
        self.boards.values().find_map(|b| {
            b.tiles
                .iter()
                .find(|t| &t.type_id == t_id)
                .map(|t| (b.id.clone(), t.tile_type))
        })
    }

    fn delete_tiles_for_type(&mut self, t_id: &EntityId) -> usize {
        let mut deleted = 0;
        for board in self.boards.values_mut() {
            let before = board.tiles.len();
            board.tiles.retain(|t| &t.type_id != t_id);
            deleted += before - board.tiles.len();
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::with_main_board(BoardId::new("main"), "Main")
    }

    #[test]
    fn tiles_roundtrip() {
        let mut layout = layout();
        let main = BoardId::new("main");
        let t_id = EntityId::from("t");

        layout.create_tile(&main, TileType::TypeTable, &t_id).unwrap();
        assert!(layout.has_tile_for_type(&t_id));
        assert_eq!(
            layout.tile_placement(&t_id),
            Some((main.clone(), TileType::TypeTable))
        );

        assert_eq!(layout.delete_tiles_for_type(&t_id), 1);
        assert!(!layout.has_tile_for_type(&t_id));
        assert_eq!(layout.delete_tiles_for_type(&t_id), 0);
    }

    #[test]
    fn tile_on_missing_board_fails() {
        let mut layout = layout();
        let result = layout.create_tile(&BoardId::new("nope"), TileType::TypeTable, &"t".into());
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn owned_boards() {
        let mut layout = layout();
        let owner = InstanceRef::new(&"t".into(), &"i".into());
        layout
            .create_board(Board::new(BoardId::new("b1"), "I").owned_by(owner.clone()))
            .unwrap();

        assert_eq!(layout.owned_board(&owner), Some(BoardId::new("b1")));
        assert_eq!(layout.delete_boards_owned_by(&owner), 1);
        assert!(!layout.has_board(&BoardId::new("b1")));
        assert!(layout.has_board(&BoardId::new("main")));
    }

    #[test]
    fn duplicate_board_rejected() {
        let mut layout = layout();
        let result = layout.create_board(Board::new(BoardId::new("main"), "Again"));
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
    }

    #[test]
    fn deleting_active_board_clears_it() {
        let mut layout = layout();
        assert!(layout.delete_board(&BoardId::new("main")));
        assert!(layout.active_board.is_none());
    }
}
