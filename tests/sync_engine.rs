//! Background scheduling tests.

mod common;

use common::{ScriptedSource, REPO};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use taskwatch::services::apply_context::NullTreeView;
use taskwatch::services::sync_events::{LogNotifier, NoProgress};
use taskwatch::{
    AppError, ApplyContext, FetchCycle, RemoteIssue, SearchSpec, SourceRegistry, SyncEngine,
    SyncHandle,
};
use tokio::time::{sleep, timeout};

fn start(source: Arc<ScriptedSource>) -> SyncHandle {
    let cycle = FetchCycle::new(
        Arc::new(SourceRegistry::new().with_source(source)),
        ApplyContext::spawn(Arc::new(NullTreeView)),
        Arc::new(LogNotifier),
    );
    SyncEngine::start_background(
        cycle,
        vec![SearchSpec::new("mine", REPO, "assignee:me")],
        Arc::new(NoProgress),
    )
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_initial_tick_cycles_every_search() {
    let source = Arc::new(ScriptedSource::new(vec![
        RemoteIssue::open("2", "two"),
        RemoteIssue::open("1", "one"),
    ]));
    let handle = start(source.clone());
    let search = handle.search("mine").unwrap();

    wait_for(|| source.fetch_calls.load(Ordering::SeqCst) == 1 && !search.is_updating()).await;

    let ids: Vec<String> = search
        .issues()
        .read()
        .await
        .iter()
        .map(|issue| issue.id.to_string())
        .collect();
    assert_eq!(ids, vec!["1", "2"]);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_trigger_reruns_named_search() {
    let source = Arc::new(ScriptedSource::new(Vec::new()));
    let handle = start(source.clone());
    let search = handle.search("mine").unwrap();

    wait_for(|| source.fetch_calls.load(Ordering::SeqCst) == 1 && !search.is_updating()).await;
    handle.trigger("mine").await.unwrap();
    wait_for(|| source.fetch_calls.load(Ordering::SeqCst) == 2).await;

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_trigger_unknown_search_fails() {
    let handle = start(Arc::new(ScriptedSource::new(Vec::new())));

    let result = handle.trigger("nobody").await;
    assert!(matches!(result, Err(AppError::NotFound { .. })));

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_zero_interval_is_rejected() {
    let handle = start(Arc::new(ScriptedSource::new(Vec::new())));

    assert!(handle.update_interval(0).await.is_err());
    assert!(handle.update_interval(60).await.is_ok());

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_commands_fail_after_stop() {
    let handle = start(Arc::new(ScriptedSource::new(Vec::new())));
    handle.stop().await.unwrap();

    timeout(Duration::from_secs(5), async {
        while handle.trigger_all().await.is_ok() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("engine kept accepting commands");
}
