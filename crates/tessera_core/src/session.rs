//! The per-project editing context.

use crate::config::HistoryConfig;
use crate::entity::{ContentGraph, EntityId, PropDefinition, PropValues};
use crate::error::{CoreError, CoreResult};
use crate::layout::{InstanceRef, Layout, LayoutOps};
use crate::mutation::{Mutation, TilePlacement};
use crate::project::Project;
use crate::transaction::{ActionType, TransactionLog, TransactionSummary};
use crate::types::{BoardId, TransactionId};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An open project: content graph, layout and transaction log.
///
/// Created when a project is opened and dropped when it is closed. Every
/// content change goes through a semantic action on the session, so that
/// each action is recorded as one transaction.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Project, ProjectSession, HistoryConfig};
///
/// let mut session = ProjectSession::open(Project::new("Notes"), HistoryConfig::default());
/// let t_id = session.create_type("Task", None)?;
/// session.rename_type(&t_id, "Todo")?;
///
/// session.revert_to(None);
/// assert_eq!(session.graph().type_wrapper(&t_id).unwrap().name, "Task");
/// # Ok::<(), tessera_core::CoreError>(())
/// ```
#[derive(Debug)]
pub struct ProjectSession {
    path: Option<PathBuf>,
    name: String,
    graph: ContentGraph,
    layout: Layout,
    log: TransactionLog,
    config: HistoryConfig,
}

impl ProjectSession {
    /// Opens a project document.
    #[must_use]
    pub fn open(project: Project, config: HistoryConfig) -> Self {
        info!(
            name = %project.name,
            types = project.types.len(),
            transactions = project.recent_changes.len(),
            "opening project"
        );
        Self {
            path: project.path,
            name: project.name,
            graph: ContentGraph::from_parts(project.types, project.instances),
            layout: project.layout,
            log: TransactionLog::from_persisted(project.recent_changes, config.clone()),
            config,
        }
    }

    /// Builds the project document for saving.
    #[must_use]
    pub fn to_project(&self) -> Project {
        Project {
            path: self.path.clone(),
            name: self.name.clone(),
            types: self.graph.types.clone(),
            instances: self.graph.instances.clone(),
            layout: self.layout.clone(),
            recent_changes: self.log.to_persisted(),
        }
    }

    /// Closes the project, discarding the log and the redo buffer.
    pub fn close(self) {
        debug!(name = %self.name, transactions = self.log.len(), "closing project");
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the save path.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Sets the save path, for example after "save as".
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// Returns the content graph.
    #[must_use]
    pub fn graph(&self) -> &ContentGraph {
        &self.graph
    }

    /// Returns the UI layout.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the transaction log.
    #[must_use]
    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Announces an action grouping the following mutations.
    pub fn begin_action(&mut self, action: ActionType) {
        self.log.begin(action);
    }

    /// Closes the current action.
    pub fn end_action(&mut self) {
        self.log.end();
    }

    /// Applies one mutation inside the current action.
    ///
    /// # Errors
    ///
    /// Returns the mutation's check or apply error.
    pub fn apply(&mut self, mutation: &Mutation) -> CoreResult<()> {
        self.log.apply(&mut self.graph, &mut self.layout, mutation)
    }

    /// Creates a type, optionally with a tile. Returns its new ID.
    ///
    /// # Errors
    ///
    /// Fails if no unique ID could be drawn or the tile's board is missing.
    pub fn create_type(&mut self, name: &str, tile: Option<TilePlacement>) -> CoreResult<EntityId> {
        let t_id = self.graph.generate_id(self.config.id_attempts)?;
        self.action(ActionType::CreateType, |s| {
            s.apply(&Mutation::CreateType {
                t_id: t_id.clone(),
                name: name.to_string(),
                tile,
            })
        })?;
        Ok(t_id)
    }

    /// Renames a type.
    ///
    /// # Errors
    ///
    /// Fails if the type does not exist or the name is empty.
    pub fn rename_type(&mut self, t_id: &EntityId, name: &str) -> CoreResult<()> {
        self.action(ActionType::RenameType, |s| {
            s.apply(&Mutation::RenameType {
                t_id: t_id.clone(),
                name: name.to_string(),
            })
        })
    }

    /// Deletes a type together with its instances, their boards and the
    /// type's tiles.
    ///
    /// # Errors
    ///
    /// Fails if the type does not exist.
    pub fn delete_type(&mut self, t_id: &EntityId) -> CoreResult<()> {
        self.require_type(t_id)?;
        let instances: Vec<EntityId> = self
            .graph
            .instances_of(t_id)
            .map(|i| i.id.clone())
            .collect();
        let tile = self
            .layout
            .tile_placement(t_id)
            .map(|(board_id, tile_type)| TilePlacement::new(board_id, tile_type));

        self.action(ActionType::DeleteType, |s| {
            for i_id in &instances {
                let board = s.layout.owned_board(&InstanceRef::new(t_id, i_id));
                s.apply(&Mutation::DeleteInstance {
                    t_id: t_id.clone(),
                    i_id: i_id.clone(),
                    board,
                })?;
            }
            s.apply(&Mutation::DeleteType {
                t_id: t_id.clone(),
                tile,
            })
        })
    }

    /// Adds or replaces a property definition.
    ///
    /// # Errors
    ///
    /// Fails if the type does not exist or the name is empty or reserved.
    pub fn put_prop(&mut self, t_id: &EntityId, definition: PropDefinition) -> CoreResult<()> {
        self.action(ActionType::PutProp, |s| {
            s.apply(&Mutation::PutProp {
                t_id: t_id.clone(),
                definition,
            })
        })
    }

    /// Removes a property definition and every instance's values for it.
    ///
    /// # Errors
    ///
    /// Fails if the property does not exist.
    pub fn remove_prop(&mut self, t_id: &EntityId, p_n: &str) -> CoreResult<()> {
        self.require_prop(t_id, p_n)?;
        let holders = self.value_holders(t_id, p_n);
        self.action(ActionType::RemoveProp, |s| {
            for i_id in &holders {
                s.apply(&Mutation::ClearValues {
                    t_id: t_id.clone(),
                    i_id: i_id.clone(),
                    p_n: p_n.to_string(),
                })?;
            }
            s.apply(&Mutation::RemoveProp {
                t_id: t_id.clone(),
                p_n: p_n.to_string(),
                renamed_to: None,
            })
        })
    }

    /// Renames a property, moving every instance's values to the new name.
    ///
    /// # Errors
    ///
    /// Fails if the property does not exist or the new name is taken.
    pub fn rename_prop(&mut self, t_id: &EntityId, p_n: &str, new_name: &str) -> CoreResult<()> {
        let mut definition = self.require_prop(t_id, p_n)?.clone();
        if self.graph.prop_definition(t_id, new_name).is_some() {
            return Err(CoreError::invalid_argument(format!(
                "prop {new_name} already exists on {t_id}"
            )));
        }
        definition.name = new_name.to_string();
        let holders = self.value_holders(t_id, p_n);

        self.action(ActionType::RenameProp, |s| {
            s.apply(&Mutation::RemoveProp {
                t_id: t_id.clone(),
                p_n: p_n.to_string(),
                renamed_to: Some(new_name.to_string()),
            })?;
            s.apply(&Mutation::PutProp {
                t_id: t_id.clone(),
                definition,
            })?;
            for i_id in &holders {
                let values = s
                    .graph
                    .prop_values(t_id, i_id, p_n)
                    .cloned()
                    .unwrap_or_default();
                s.apply(&Mutation::SetValues {
                    t_id: t_id.clone(),
                    i_id: i_id.clone(),
                    p_n: new_name.to_string(),
                    values,
                })?;
                s.apply(&Mutation::ClearValues {
                    t_id: t_id.clone(),
                    i_id: i_id.clone(),
                    p_n: p_n.to_string(),
                })?;
            }
            Ok(())
        })
    }

    /// Creates an instance, optionally with a board it owns. Returns its ID.
    ///
    /// # Errors
    ///
    /// Fails if the type does not exist or no unique ID could be drawn.
    pub fn create_instance(&mut self, t_id: &EntityId, with_board: bool) -> CoreResult<EntityId> {
        let i_id = self.graph.generate_id(self.config.id_attempts)?;
        let board = with_board.then(BoardId::generate);
        self.action(ActionType::CreateInstance, |s| {
            s.apply(&Mutation::CreateInstance {
                t_id: t_id.clone(),
                i_id: i_id.clone(),
                board,
            })
        })?;
        Ok(i_id)
    }

    /// Deletes an instance and the boards it owns.
    ///
    /// # Errors
    ///
    /// Fails if the instance does not exist.
    pub fn delete_instance(&mut self, t_id: &EntityId, i_id: &EntityId) -> CoreResult<()> {
        let board = self.layout.owned_board(&InstanceRef::new(t_id, i_id));
        self.action(ActionType::DeleteInstance, |s| {
            s.apply(&Mutation::DeleteInstance {
                t_id: t_id.clone(),
                i_id: i_id.clone(),
                board,
            })
        })
    }

    /// Replaces the values of one property of an instance.
    ///
    /// # Errors
    ///
    /// Fails if the instance or property does not exist, or if a scalar
    /// property is given several values.
    pub fn set_values(
        &mut self,
        t_id: &EntityId,
        i_id: &EntityId,
        p_n: &str,
        values: PropValues,
    ) -> CoreResult<()> {
        self.action(ActionType::SetValues, |s| {
            s.apply(&Mutation::SetValues {
                t_id: t_id.clone(),
                i_id: i_id.clone(),
                p_n: p_n.to_string(),
                values,
            })
        })
    }

    /// Reverts one transaction, or back to `target`. Refusals are logged
    /// and return 0.
    pub fn revert_to(&mut self, target: Option<TransactionId>) -> usize {
        self.log.revert_to(&mut self.graph, &mut self.layout, target)
    }

    /// Reverts one transaction, or back to `target`.
    ///
    /// # Errors
    ///
    /// See [`TransactionLog::try_revert_to`].
    pub fn try_revert_to(&mut self, target: Option<TransactionId>) -> CoreResult<usize> {
        self.log
            .try_revert_to(&mut self.graph, &mut self.layout, target)
    }

    /// Reapplies one undone transaction, or up to `target`. Refusals are
    /// logged and return 0.
    pub fn unrevert_to(&mut self, target: Option<TransactionId>) -> usize {
        self.log
            .unrevert_to(&mut self.graph, &mut self.layout, target)
    }

    /// Reapplies one undone transaction, or up to `target`.
    ///
    /// # Errors
    ///
    /// See [`TransactionLog::try_unrevert_to`].
    pub fn try_unrevert_to(&mut self, target: Option<TransactionId>) -> CoreResult<usize> {
        self.log
            .try_unrevert_to(&mut self.graph, &mut self.layout, target)
    }

    /// Lists the history for "revert to" menus.
    #[must_use]
    pub fn history(&self) -> Vec<TransactionSummary> {
        self.log.history()
    }

    /// Returns true if there is something to revert.
    #[must_use]
    pub fn can_revert(&self) -> bool {
        self.log.can_revert()
    }

    /// Returns true if there is something to unrevert.
    #[must_use]
    pub fn can_unrevert(&self) -> bool {
        self.log.can_unrevert()
    }

    fn action(
        &mut self,
        action: ActionType,
        body: impl FnOnce(&mut Self) -> CoreResult<()>,
    ) -> CoreResult<()> {
        self.log.begin(action);
        let result = body(self);
        self.log.end();
        result
    }

    fn require_type(&self, t_id: &EntityId) -> CoreResult<()> {
        match self.graph.type_wrapper(t_id) {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found(format!("type {t_id}"))),
        }
    }

    fn require_prop(&self, t_id: &EntityId, p_n: &str) -> CoreResult<&PropDefinition> {
        self.graph
            .prop_definition(t_id, p_n)
            .ok_or_else(|| CoreError::not_found(format!("prop {t_id}.{p_n}")))
    }

    fn value_holders(&self, t_id: &EntityId, p_n: &str) -> Vec<EntityId> {
        self.graph
            .instances_of(t_id)
            .filter(|i| i.props.contains_key(p_n))
            .map(|i| i.id.clone())
            .collect()
    }
}
