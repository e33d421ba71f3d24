//! CLI command implementations.

pub mod backup;
pub mod history;
pub mod inspect;
pub mod serve;

use std::path::Path;
use tessera_core::Project;
use tessera_storage::AtomicFileStore;

/// Loads the project at `path`, failing if there is none.
pub async fn load_project(path: &Path) -> Result<Project, Box<dyn std::error::Error>> {
    let store = AtomicFileStore::with_defaults();
    let project: Option<Project> = store.load(path).await?;
    let mut project = project.ok_or_else(|| format!("No project found at {}", path.display()))?;
    project.path = Some(path.to_path_buf());
    Ok(project)
}
