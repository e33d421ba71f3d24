//! Backup command implementation.

use super::load_project;
use std::path::Path;
use tessera_storage::AtomicFileStore;
use tracing::info;

/// Writes a timestamped copy of the project next to it.
pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Backing up {}", path.display());
    let project = load_project(path).await?;
    let (directory, file_name) = project
        .location()
        .ok_or_else(|| format!("{} has no file name", path.display()))?;

    let store = AtomicFileStore::with_defaults();
    let saved = store.save(&directory, &file_name, &project, true).await?;

    println!("✓ Backup created successfully");
    println!("  Project: {}", project.name);
    println!("  Path:    {}", saved.path.display());
    Ok(())
}
