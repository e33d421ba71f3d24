//! A client and a backend wired together in one process.
//!
//! Frames travel over in-memory pipes exactly as they would over the
//! backend's stdin and stdout, so the whole path is exercised: encoding,
//! the backend's dispatch and the client's reply routing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tessera_backend::{BackendConfig, BackendServer, MenuEmitter, ScriptedDialogs};
use tessera_exchange::{run_inbound, write_frames, ChannelOutbound, ClientConfig, ExchangeClient};
use tessera_protocol::MenuSignal;
use tokio::io::BufReader;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const PIPE_CAPACITY: usize = 64 * 1024;

/// A running client/backend pair. Dropping it stops both sides.
pub struct Loopback {
    /// The editor-side client.
    pub client: Arc<ExchangeClient<ChannelOutbound>>,
    /// Answers queued for the backend's dialogs.
    pub dialogs: Arc<ScriptedDialogs>,
    /// Menu signals that reached the client.
    pub signals: mpsc::UnboundedReceiver<MenuSignal>,
    menu: MenuEmitter,
    tasks: Vec<JoinHandle<()>>,
    dir: TempDir,
}

impl Loopback {
    /// Starts a pair with the default client configuration.
    pub async fn start() -> Self {
        Self::start_with(ClientConfig::default()).await
    }

    /// Starts a pair whose backend keeps its data in a fresh temp directory.
    pub async fn start_with(config: ClientConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let dialogs = Arc::new(ScriptedDialogs::new());
        let server = Arc::new(BackendServer::new(
            BackendConfig::new(dir.path().join("app-data")),
            dialogs.clone(),
        ));

        let (to_backend, backend_in) = tokio::io::duplex(PIPE_CAPACITY);
        let (backend_out, from_backend) = tokio::io::duplex(PIPE_CAPACITY);
        let (outbound, outbound_rx) = ChannelOutbound::channel();
        let client = Arc::new(ExchangeClient::new(outbound, config));
        let (signal_tx, signals) = mpsc::unbounded_channel();
        let (menu_tx, menu_rx) = oneshot::channel();

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(async move {
            let _ = write_frames(outbound_rx, to_backend).await;
        }));
        tasks.push(tokio::spawn(async move {
            let _ = server
                .run(BufReader::new(backend_in), backend_out, |menu| {
                    let _ = menu_tx.send(menu);
                })
                .await;
        }));
        {
            let client = client.clone();
            tasks.push(tokio::spawn(async move {
                let _ = run_inbound(&client, BufReader::new(from_backend), Some(signal_tx)).await;
            }));
        }

        Self {
            client,
            dialogs,
            signals,
            menu: menu_rx.await.expect("backend did not start"),
            tasks,
            dir,
        }
    }

    /// Returns the scratch directory shared by both sides.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Returns a path for a project file inside the scratch directory.
    pub fn project_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("projects").join(format!("{name}.json"))
    }

    /// Returns the backend's menu emitter.
    pub fn menu(&self) -> &MenuEmitter {
        &self.menu
    }
}

impl Drop for Loopback {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
