//! Inspect command implementation.

use super::load_project;
use serde::Serialize;
use std::path::Path;
use tessera_core::{Project, TransactionLog};

/// Project inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Project file path.
    pub path: String,
    /// Project name.
    pub name: String,
    /// Number of types.
    pub type_count: usize,
    /// Number of instances over all types.
    pub instance_count: usize,
    /// Number of boards.
    pub board_count: usize,
    /// Number of tiles over all boards.
    pub tile_count: usize,
    /// Number of stored transactions, sentinel included.
    pub transaction_count: usize,
    /// Number of stored changes.
    pub change_count: usize,
}

impl InspectResult {
    fn from_project(path: &Path, project: &Project) -> Self {
        let log =
            TransactionLog::from_persisted(project.recent_changes.clone(), Default::default());
        Self {
            path: path.display().to_string(),
            name: project.name.clone(),
            type_count: project.types.len(),
            instance_count: project.instance_count(),
            board_count: project.layout.board_count(),
            tile_count: project.layout.tile_count(),
            transaction_count: log.transactions().len(),
            change_count: log.transactions().iter().map(|t| t.changes().len()).sum(),
        }
    }
}

/// Runs the inspect command.
pub async fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project(path).await?;
    let result = InspectResult::from_project(path, &project);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Tessera Project Inspection");
    println!("==========================");
    println!();
    println!("Path: {}", result.path);
    println!("Name: {}", result.name);
    println!();
    println!("Content:");
    println!("  Types:     {}", result.type_count);
    println!("  Instances: {}", result.instance_count);
    println!();
    println!("Layout:");
    println!("  Boards: {}", result.board_count);
    println!("  Tiles:  {}", result.tile_count);
    println!();
    println!("History:");
    println!("  Transactions: {}", result.transaction_count);
    println!("  Changes:      {}", result.change_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{HistoryConfig, ProjectSession};

    #[test]
    fn counts_project_content() {
        let mut session = ProjectSession::open(Project::new("Notes"), HistoryConfig::default());
        let t_id = session.create_type("Book", None).unwrap();
        session.create_instance(&t_id, false).unwrap();
        let project = session.to_project();

        let result = InspectResult::from_project(Path::new("/p.json"), &project);
        assert_eq!(result.name, "Notes");
        assert_eq!(result.type_count, 1);
        assert_eq!(result.instance_count, 1);
        assert_eq!(result.board_count, 1);
        assert_eq!(result.transaction_count, 3);
        assert!(result.change_count >= 4);
    }
}
