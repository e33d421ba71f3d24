//! History command implementation.

use super::load_project;
use std::path::Path;
use tessera_core::{HistoryConfig, TransactionLog, TransactionSummary};

/// Runs the history command.
pub async fn run(
    path: &Path,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project(path).await?;
    let log = TransactionLog::from_persisted(project.recent_changes, HistoryConfig::default());
    let rows = tail(log.history(), limit);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            println!("{:>8}  {:<20}  {:>7}", "ID", "ACTION", "CHANGES");
            for row in &rows {
                println!(
                    "{:>8}  {:<20}  {:>7}",
                    row.id.as_u64(),
                    row.action_type.label(),
                    row.change_count
                );
            }
        }
    }

    Ok(())
}

fn tail(mut rows: Vec<TransactionSummary>, limit: Option<usize>) -> Vec<TransactionSummary> {
    if let Some(limit) = limit {
        let skip = rows.len().saturating_sub(limit);
        rows.drain(..skip);
    }
    rows
}
