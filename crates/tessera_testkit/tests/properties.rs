//! Property tests for history and persistence.

use proptest::prelude::*;
use std::fs;
use tempfile::tempdir;
use tessera_core::{ContentGraph, HistoryConfig, Project, ProjectSession};
use tessera_storage::AtomicFileStore;
use tessera_testkit::crash::{file_names, StagingBlocker};
use tessera_testkit::prelude::*;

/// What must come back after a revert or an unrevert.
#[derive(Debug, PartialEq)]
struct Observed {
    graph: ContentGraph,
    boards: usize,
    tiles: usize,
}

fn observe(session: &ProjectSession) -> Observed {
    Observed {
        graph: canonical(session.graph()),
        boards: session.layout().board_count(),
        tiles: session.layout().tile_count(),
    }
}

fn session_after(actions: &[Action]) -> ProjectSession {
    let mut session = ProjectSession::open(Project::new("prop"), HistoryConfig::default());
    for action in actions {
        apply_action(&mut session, action).unwrap();
    }
    session
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn revert_restores_earlier_state(
        setup in action_sequence_strategy(0, 12),
        edits in action_sequence_strategy(1, 20),
    ) {
        let mut session = session_after(&setup);
        let start = session.log().last_id();
        let before = observe(&session);

        for action in &edits {
            apply_action(&mut session, action).unwrap();
        }
        session.revert_to(Some(start));

        prop_assert_eq!(session.log().last_id(), start);
        prop_assert_eq!(observe(&session), before);
    }

    #[test]
    fn unrevert_restores_later_state(
        setup in action_sequence_strategy(0, 12),
        edits in action_sequence_strategy(1, 20),
    ) {
        let mut session = session_after(&setup);
        let start = session.log().last_id();
        for action in &edits {
            apply_action(&mut session, action).unwrap();
        }
        let end = session.log().last_id();
        let after = observe(&session);

        let reverted = session.revert_to(Some(start));
        let unreverted = session.unrevert_to(Some(end));

        prop_assert_eq!(reverted, unreverted);
        prop_assert!(!session.can_unrevert());
        prop_assert_eq!(observe(&session), after);
    }

    #[test]
    fn stepwise_revert_matches_bulk_revert(edits in action_sequence_strategy(1, 20)) {
        let mut stepwise = session_after(&edits);
        let mut bulk = ProjectSession::open(stepwise.to_project(), HistoryConfig::default());

        while stepwise.can_revert() {
            prop_assert_eq!(stepwise.revert_to(None), 1);
        }
        let sentinel = bulk.log().transactions()[0].id();
        bulk.revert_to(Some(sentinel));

        prop_assert_eq!(observe(&stepwise), observe(&bulk));
        prop_assert_eq!(stepwise.graph().type_count(), 0);
    }

    #[test]
    fn new_action_clears_redo(edits in action_sequence_strategy(1, 20)) {
        let mut session = session_after(&edits);
        prop_assume!(session.can_revert());

        session.revert_to(None);
        prop_assert!(session.can_unrevert());

        let fresh = Action::CreateType { name: "Fresh".into(), with_tile: false };
        apply_action(&mut session, &fresh).unwrap();
        prop_assert!(!session.can_unrevert());
        prop_assert!(session.history().iter().all(|summary| !summary.undone));
    }

    #[test]
    fn saved_project_loads_unchanged(
        edits in action_sequence_strategy(0, 20),
        backup in any::<bool>()
    ) {
        let project = session_after(&edits).to_project();
        let dir = tempdir().unwrap();
        let store = AtomicFileStore::with_defaults();

        let loaded: Option<Project> = block_on(async {
            let saved = store.save(dir.path(), "project.json", &project, backup).await.unwrap();
            store.load(&saved.path).await.unwrap()
        });

        prop_assert_eq!(loaded, Some(project));
        let names = file_names(dir.path()).unwrap();
        prop_assert_eq!(names.len(), 1);
        prop_assert_eq!(names[0] != "project.json", backup);
    }

    #[test]
    fn failed_staging_leaves_target_untouched(edits in action_sequence_strategy(1, 20)) {
        let dir = tempdir().unwrap();
        let store = AtomicFileStore::with_defaults();
        let target = dir.path().join("project.json");

        block_on(store.save(dir.path(), "project.json", &Project::new("old"), false)).unwrap();
        let before = fs::read(&target).unwrap();

        let blocker = StagingBlocker::new(dir.path(), "project.json").unwrap();
        let project = session_after(&edits).to_project();
        let result = block_on(store.save(dir.path(), "project.json", &project, false));
        drop(blocker);

        prop_assert!(result.is_err());
        prop_assert_eq!(fs::read(&target).unwrap(), before);
    }
}

#[test]
fn reloaded_history_still_reverts() {
    let (mut session, _) = sample_session();
    let before = observe(&session);
    let checkpoint = session.log().last_id();
    apply_action(&mut session, &Action::DeleteType { slot: 0 }).unwrap();

    let json = serde_json::to_string(&session.to_project()).unwrap();
    let project: Project = serde_json::from_str(&json).unwrap();
    let mut reopened = ProjectSession::open(project, HistoryConfig::default());

    assert_eq!(reopened.revert_to(Some(checkpoint)), 1);
    assert_eq!(observe(&reopened), before);
}
