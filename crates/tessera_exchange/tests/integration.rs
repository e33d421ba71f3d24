//! Integration tests for the exchange client against a real backend.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tessera_backend::{BackendConfig, BackendServer, MenuEmitter, ScriptedDialogs};
use tessera_core::Project;
use tessera_exchange::{
    run_inbound, write_frames, ChannelOutbound, ClientConfig, ExchangeClient, ExchangeError,
};
use tessera_protocol::{DialogRequest, ErrorKind, MenuSignal};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A client wired to an in-process backend over two pipes.
struct Harness {
    client: Arc<ExchangeClient<ChannelOutbound>>,
    dialogs: Arc<ScriptedDialogs>,
    menu: MenuEmitter,
    signals: mpsc::UnboundedReceiver<MenuSignal>,
    tasks: Vec<JoinHandle<()>>,
    _dir: TempDir,
    root: PathBuf,
}

impl Harness {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let dialogs = Arc::new(ScriptedDialogs::new());
        let server = Arc::new(BackendServer::new(
            BackendConfig::new(root.join("app")),
            dialogs.clone(),
        ));

        let (to_backend, backend_in) = tokio::io::duplex(64 * 1024);
        let (backend_out, from_backend) = tokio::io::duplex(64 * 1024);

        let (outbound, outbound_rx) = ChannelOutbound::channel();
        let client = Arc::new(ExchangeClient::new(outbound, ClientConfig::default()));
        let (signal_tx, signals) = mpsc::unbounded_channel();
        let (menu_tx, menu_rx) = tokio::sync::oneshot::channel();

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(async move {
            write_frames(outbound_rx, to_backend).await.unwrap();
        }));
        tasks.push(tokio::spawn(async move {
            server
                .run(BufReader::new(backend_in), backend_out, |menu| {
                    let _ = menu_tx.send(menu);
                })
                .await
                .unwrap();
        }));
        {
            let client = client.clone();
            tasks.push(tokio::spawn(async move {
                run_inbound(&client, BufReader::new(from_backend), Some(signal_tx))
                    .await
                    .unwrap();
            }));
        }

        Self {
            client,
            dialogs,
            menu: menu_rx.await.unwrap(),
            signals,
            tasks,
            _dir: dir,
            root,
        }
    }
}

#[tokio::test]
async fn settings_round_trip() {
    let harness = Harness::start().await;
    let client = &harness.client;

    let mut settings = client.load_application_data().await.unwrap();
    assert!(!settings.allow_autosave);

    settings.allow_autosave = true;
    settings.default_local_path = Some(harness.root.join("projects"));
    client.update_application_data(&settings).await.unwrap();

    assert_eq!(client.load_application_data().await.unwrap(), settings);
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn project_save_fetch_and_backup() {
    let harness = Harness::start().await;
    let client = &harness.client;
    let path = harness.root.join("projects/notes.json");

    client.test_path(&harness.root.join("projects")).await.unwrap();

    let project = Project::new("Notes").with_path(&path);
    let saved = client.save_project(&project).await.unwrap();
    assert_eq!(saved.path, path);

    let fetched = client.fetch_project(&path).await.unwrap();
    assert_eq!(fetched, project);

    let backup = client.backup_project(&path, &project).await.unwrap();
    assert_ne!(backup.path, path);
    assert_eq!(backup.path.parent(), path.parent());
}

#[tokio::test]
async fn backend_errors_reject_the_exchange() {
    let harness = Harness::start().await;
    let client = &harness.client;

    let missing = client
        .fetch_project(&harness.root.join("missing.json"))
        .await
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let rooted = client
        .save_project(&Project::new("x").with_path("/x.json"))
        .await
        .unwrap_err();
    match rooted {
        ExchangeError::Rejected { payload, .. } => {
            assert_eq!(payload.kind, ErrorKind::InvalidArgument);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn dialogs_and_save_as() {
    let harness = Harness::start().await;
    let client = &harness.client;
    let target = harness.root.join("chosen.json");
    harness.dialogs.push_file(&target);
    harness.dialogs.push_directory(harness.root.join("dir"));

    let saved = client.save_project_as(&Project::new("x")).await.unwrap();
    assert_eq!(saved, Some(target.clone()));
    assert_eq!(client.fetch_project(&target).await.unwrap().name, "x");

    let dir = client
        .select_directory_dialog(&DialogRequest::new("Choose", None))
        .await
        .unwrap();
    assert_eq!(dir.directory, Some(harness.root.join("dir")));

    let file = client
        .select_file_dialog(&DialogRequest::default())
        .await
        .unwrap();
    assert!(file.canceled);
}

#[tokio::test]
async fn concurrent_exchanges_all_resolve() {
    let harness = Harness::start().await;
    let mut joins = Vec::new();
    for i in 0..16 {
        let client = harness.client.clone();
        let path = harness.root.join(format!("p{i}/project.json"));
        joins.push(tokio::spawn(async move {
            let project = Project::new(format!("p{i}")).with_path(&path);
            client.save_project(&project).await.unwrap();
            client.fetch_project(&path).await.unwrap().name
        }));
    }
    for (i, join) in joins.into_iter().enumerate() {
        assert_eq!(join.await.unwrap(), format!("p{i}"));
    }
    assert_eq!(harness.client.pending_count(), 0);
}

#[tokio::test]
async fn menu_signals_reach_the_client() {
    let mut harness = Harness::start().await;
    assert!(harness.menu.emit(MenuSignal::OpenExistingProject));
    let signal = tokio::time::timeout(Duration::from_secs(5), harness.signals.recv())
        .await
        .unwrap();
    assert_eq!(signal, Some(MenuSignal::OpenExistingProject));
    for task in harness.tasks.drain(..) {
        task.abort();
    }
}
