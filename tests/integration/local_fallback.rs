//! Integration tests for local-only mode: startup without a signed-in
//! user, persistence across restarts, and the signed-out contract.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use later::alert::AlertSink;
use later::identity;
use later::local::MemoryLocalStore;
use later::remote::RemoteStore;
use later::remote::memory::MemoryRemoteStore;
use later::store::TaskStore;
use later_model::{DayKey, TaskDraft, TaskPatch, UserId};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn day(s: &str) -> DayKey {
    DayKey::parse(s).expect("valid day")
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft::new(title).expect("valid draft")
}

type LocalOnlyStore = Arc<TaskStore<Arc<MemoryLocalStore>, Arc<MemoryRemoteStore>>>;

fn make_store(
    local: &Arc<MemoryLocalStore>,
    remote: &Arc<MemoryRemoteStore>,
) -> LocalOnlyStore {
    let (alerts, _rx) = AlertSink::channel(16);
    Arc::new(TaskStore::new(
        Arc::clone(local),
        Arc::clone(remote),
        alerts,
    ))
}

/// Polls `cond` every 10ms for up to 2 seconds, panicking on timeout.
async fn eventually(cond: impl AsyncFn() -> bool, what: &str) {
    for _ in 0..200 {
        if cond().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}

// ---------------------------------------------------------------------------
// Startup and persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolving_to_signed_out_loads_the_cache_once() {
    let local = Arc::new(MemoryLocalStore::new());
    let remote = Arc::new(MemoryRemoteStore::new());
    let store = make_store(&local, &remote);

    // Seed the cache the way a previous session would have left it.
    let seeded = make_store(&local, &remote);
    seeded.add_task(day("2024-03-01"), draft("from last session"));
    seeded.write_cache().await;
    drop(seeded);

    assert!(store.is_loading());
    let (handle, auth_rx) = identity::channel();
    let _watcher = store.watch_identity(auth_rx);
    handle.sign_out();

    eventually(
        async || !store.tasks_for_day(day("2024-03-01")).is_empty(),
        "startup cache load",
    )
    .await;
    assert!(!store.is_loading());
    assert_eq!(
        store.tasks_for_day(day("2024-03-01"))[0].title,
        "from last session"
    );
}

#[tokio::test]
async fn local_tasks_survive_a_restart() {
    let local = Arc::new(MemoryLocalStore::new());
    let remote = Arc::new(MemoryRemoteStore::new());

    {
        let store = make_store(&local, &remote);
        store.refresh().await;
        store.add_task(
            day("2024-03-01"),
            draft("persist me").with_description("and my description"),
        );
        store.write_cache().await;
    }

    let reopened = make_store(&local, &remote);
    reopened.refresh().await;
    let tasks = reopened.tasks_for_day(day("2024-03-01"));
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "persist me");
    assert_eq!(tasks[0].description, "and my description");
}

#[tokio::test]
async fn completion_and_edits_survive_a_restart() {
    let local = Arc::new(MemoryLocalStore::new());
    let remote = Arc::new(MemoryRemoteStore::new());

    {
        let store = make_store(&local, &remote);
        store.refresh().await;
        let d = day("2024-03-01");
        store.add_task(d, draft("round trip"));
        let id = store.tasks_for_day(d)[0].id.clone();
        store.toggle_task(d, &id);
        store.update_task(
            &id,
            TaskPatch {
                time: chrono::NaiveTime::from_hms_opt(7, 45, 0),
                ..TaskPatch::default()
            },
        );
        store.write_cache().await;
    }

    let reopened = make_store(&local, &remote);
    reopened.refresh().await;
    let task = &reopened.tasks_for_day(day("2024-03-01"))[0];
    assert!(task.completed);
    assert_eq!(task.time, chrono::NaiveTime::from_hms_opt(7, 45, 0));
}

// ---------------------------------------------------------------------------
// The signed-out contract
// ---------------------------------------------------------------------------

#[tokio::test]
async fn local_mode_never_calls_the_remote_store() {
    let local = Arc::new(MemoryLocalStore::new());
    let remote = Arc::new(MemoryRemoteStore::new());
    let store = make_store(&local, &remote);
    store.refresh().await;

    let d = day("2024-03-01");
    store.add_task(d, draft("offline"));
    let id = store.tasks_for_day(d)[0].id.clone();
    store.toggle_task(d, &id);
    store.set_description(d, &id, "still offline");
    store.delete_task(d, &id);

    // Give any (wrongly) spawned remote legs a chance to land.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(remote.document_count(&UserId::new("anyone")), 0);
    assert!(remote.query(&UserId::new("anyone")).await.unwrap().is_empty());
}

#[tokio::test]
async fn offline_add_matches_the_spec_scenario() {
    let local = Arc::new(MemoryLocalStore::new());
    let remote = Arc::new(MemoryRemoteStore::new());
    let store = make_store(&local, &remote);
    store.refresh().await;

    store.add_task(
        day("2024-03-01"),
        draft("Buy milk").with_time(chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
    );

    let tasks = store.tasks_for_day(day("2024-03-01"));
    assert_eq!(tasks.len(), 1);
    assert!(!tasks[0].completed);
    assert!(!tasks[0].id.as_str().is_empty());
    assert_eq!(
        tasks[0].time,
        chrono::NaiveTime::from_hms_opt(9, 0, 0)
    );
}

#[tokio::test]
async fn signing_in_later_hands_over_to_the_remote_collection() {
    let local = Arc::new(MemoryLocalStore::new());
    let remote = Arc::new(MemoryRemoteStore::new());
    let user = UserId::new("user-1");
    remote
        .insert(&user, day("2024-05-01"), &draft("cloud task"))
        .await
        .unwrap();

    let store = make_store(&local, &remote);
    let (handle, auth_rx) = identity::channel();
    let _watcher = store.watch_identity(auth_rx);
    handle.sign_out();
    eventually(async || !store.is_loading(), "local startup").await;
    store.add_task(day("2024-03-01"), draft("local scratch"));

    handle.sign_in(user);
    eventually(
        async || !store.tasks_for_day(day("2024-05-01")).is_empty(),
        "remote snapshot after sign-in",
    )
    .await;
    // The remote collection replaced the local scratch state.
    assert!(store.tasks_for_day(day("2024-03-01")).is_empty());
}
