//! Serve command: the backend process.

use std::path::PathBuf;
use std::sync::Arc;
use tessera_backend::{BackendConfig, BackendServer, Headless};
use tokio::io::BufReader;
use tracing::info;

/// Serves exchange requests on stdin/stdout until stdin closes.
pub async fn run(app_data: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    info!(app_data = %app_data.display(), "backend starting");
    let server = Arc::new(BackendServer::new(
        BackendConfig::new(app_data),
        Arc::new(Headless),
    ));

    server
        .run(
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            |_menu| {},
        )
        .await?;

    info!("backend stopped");
    Ok(())
}
