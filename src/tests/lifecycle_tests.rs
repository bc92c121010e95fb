use crate::draft_store::DraftStore;
use crate::lifecycle::ProfileLifecycle;
use crate::profile_document::{ProfileDocument, VisibilitySettings};
use crate::search_index::{QueryFilters, SearchIndex};
use crate::snapshot_engine::SnapshotEngine;
use crate::storage::{MemoryStorage, ProfileStorage, UserId};
use std::sync::Arc;

struct TestStack {
    storage: Arc<MemoryStorage>,
    drafts: DraftStore,
    engine: Arc<SnapshotEngine>,
    index: Arc<SearchIndex>,
    lifecycle: ProfileLifecycle,
}

fn test_stack() -> TestStack {
    let storage = Arc::new(MemoryStorage::new());
    let index = Arc::new(SearchIndex::new());
    let engine = Arc::new(SnapshotEngine::new(storage.clone(), index.clone()));
    TestStack {
        storage: storage.clone(),
        drafts: DraftStore::new(storage.clone()),
        engine: engine.clone(),
        index: index.clone(),
        lifecycle: ProfileLifecycle::new(storage, engine, index),
    }
}

fn document(name: &str, skills: &[&str]) -> ProfileDocument {
    ProfileDocument {
        name: name.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

async fn published_alice(stack: &TestStack) -> UserId {
    let u = UserId("u1".to_string());
    stack.drafts.claim_handle(&u, "alice").await.unwrap();
    stack
        .drafts
        .save_draft(&u, document("Alice", &["Go"]), VisibilitySettings::default())
        .await
        .unwrap();
    let handle = stack.drafts.handle_for_user(&u).await.unwrap().unwrap();
    let draft = stack.drafts.draft(&u).await.unwrap().unwrap();
    stack
        .engine
        .publish(&handle, draft.canonical, &draft.visibility)
        .await
        .unwrap();
    u
}

#[tokio::test]
async fn unpublish_hides_profile_but_keeps_history() {
    let stack = test_stack();
    let u = published_alice(&stack).await;
    let handle = stack.drafts.handle_for_user(&u).await.unwrap().unwrap();

    stack.lifecycle.unpublish(&handle).await.unwrap();

    assert!(stack.engine.latest_snapshot(&handle).await.unwrap().is_none());
    let page = stack
        .index
        .query(&QueryFilters {
            skill: Some("go".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert!(page.results.is_empty());

    // History survives for authorized internal callers
    let row = stack
        .engine
        .snapshot_by_version(&handle, 1)
        .await
        .unwrap()
        .unwrap();
    assert!(!row.published);
}

#[tokio::test]
async fn hard_delete_removes_everything() {
    let stack = test_stack();
    let u = published_alice(&stack).await;
    let handle = stack.drafts.handle_for_user(&u).await.unwrap().unwrap();
    stack
        .storage
        .insert_session("token-1", &u)
        .await
        .unwrap();

    stack.lifecycle.hard_delete(&u).await.unwrap();

    assert!(stack.drafts.handle_for_user(&u).await.unwrap().is_none());
    assert!(stack.drafts.draft(&u).await.unwrap().is_none());
    assert!(stack.engine.latest_snapshot(&handle).await.unwrap().is_none());
    assert!(stack
        .engine
        .snapshot_by_version(&handle, 1)
        .await
        .unwrap()
        .is_none());
    assert!(stack
        .storage
        .user_for_session("token-1")
        .await
        .unwrap()
        .is_none());
    let page = stack.index.query(&QueryFilters::default()).unwrap();
    assert!(page.results.is_empty());
}

#[tokio::test]
async fn hard_delete_frees_the_handle_for_reclaim() {
    let stack = test_stack();
    let u = published_alice(&stack).await;

    stack.lifecycle.hard_delete(&u).await.unwrap();

    // The handle is unreachable and may be claimed again
    let u2 = UserId("u2".to_string());
    let reclaimed = stack.drafts.claim_handle(&u2, "alice").await.unwrap();
    assert_eq!(reclaimed.as_str(), "alice");
}

#[tokio::test]
async fn hard_delete_without_handle_still_clears_draft() {
    let stack = test_stack();
    let u = UserId("u1".to_string());
    stack
        .drafts
        .save_draft(&u, document("Alice", &[]), VisibilitySettings::default())
        .await
        .unwrap();

    stack.lifecycle.hard_delete(&u).await.unwrap();

    assert!(stack.drafts.draft(&u).await.unwrap().is_none());
}
