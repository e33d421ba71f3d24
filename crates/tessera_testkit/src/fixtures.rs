//! Test fixtures and project helpers.
//!
//! Provides ready-made projects and sessions for tests that need content
//! to work on.

use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tessera_core::{
    EntityId, HistoryConfig, Project, ProjectSession, PropDefinition, PropValues, TilePlacement,
    TileType, ValueType,
};

/// IDs of the entities created by [`sample_session`].
#[derive(Debug, Clone)]
pub struct SampleIds {
    /// The "Book" type.
    pub book: EntityId,
    /// The "Author" type.
    pub author: EntityId,
    /// Instances of "Book".
    pub books: Vec<EntityId>,
    /// The single "Author" instance.
    pub tolkien: EntityId,
}

/// Builds a session with two types, a few props and three instances.
///
/// The setup is recorded in the log, one transaction per action.
pub fn sample_session() -> (ProjectSession, SampleIds) {
    let mut session = ProjectSession::open(Project::new("Library"), HistoryConfig::default());
    let board = session
        .layout()
        .active_board
        .clone()
        .expect("new projects have a main board");

    let book = session
        .create_type("Book", Some(TilePlacement::new(board.clone(), TileType::TypeTable)))
        .expect("create Book");
    let author = session
        .create_type("Author", Some(TilePlacement::new(board, TileType::InstanceForm)))
        .expect("create Author");

    session
        .put_prop(&book, PropDefinition::new("title", ValueType::Text, 0))
        .expect("title");
    session
        .put_prop(&book, PropDefinition::new("tags", ValueType::Text, 1).array())
        .expect("tags");
    session
        .put_prop(&author, PropDefinition::new("name", ValueType::Text, 0))
        .expect("name");

    let tolkien = session.create_instance(&author, true).expect("author instance");
    session
        .set_values(&author, &tolkien, "name", PropValues::single("J. R. R. Tolkien"))
        .expect("author name");

    let mut books = Vec::new();
    for (title, tags) in [
        ("The Hobbit", vec!["fantasy"]),
        ("Silmarillion", vec!["myth", "fantasy"]),
    ] {
        let i_id = session.create_instance(&book, false).expect("book instance");
        session
            .set_values(&book, &i_id, "title", PropValues::single(title))
            .expect("title value");
        let tags = PropValues::new(tags.into_iter().map(|t| json!(t)).collect());
        session
            .set_values(&book, &i_id, "tags", tags)
            .expect("tags value");
        books.push(i_id);
    }

    (
        session,
        SampleIds {
            book,
            author,
            books,
            tolkien,
        },
    )
}

/// The project document of [`sample_session`].
pub fn sample_project() -> Project {
    sample_session().0.to_project()
}

/// A project file in a temporary directory, removed on drop.
pub struct TestProject {
    /// The open session.
    pub session: ProjectSession,
    /// Entities of the sample content.
    pub ids: SampleIds,
    dir: TempDir,
}

impl TestProject {
    /// Creates the sample project with a save path inside a fresh temp directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let (mut session, ids) = sample_session();
        session.set_path(dir.path().join("library.json"));
        Self { session, ids, dir }
    }

    /// Returns the temporary directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the project's save path.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("library.json")
    }

    /// Returns the current project document.
    pub fn project(&self) -> Project {
        self.session.to_project()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestProject {
    type Target = ProjectSession;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl std::ops::DerefMut for TestProject {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_content() {
        let (session, ids) = sample_session();
        assert_eq!(session.graph().type_count(), 2);
        assert_eq!(session.graph().instance_count(), 3);
        assert_eq!(session.layout().tile_count(), 2);
        assert_eq!(session.layout().board_count(), 2);
        let tags = session
            .graph()
            .prop_values(&ids.book, &ids.books[1], "tags")
            .unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_project_has_path() {
        let project = TestProject::new();
        assert_eq!(project.session.path(), Some(project.path().as_path()));
        assert_eq!(project.project().path, Some(project.path()));
        assert!(project.can_revert());
    }
}
