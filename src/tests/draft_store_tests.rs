use crate::draft_store::DraftStore;
use crate::error::ProfileError;
use crate::profile_document::{ProfileDocument, Visibility, VisibilitySettings};
use crate::storage::{MemoryStorage, UserId};
use std::sync::Arc;

fn test_store() -> DraftStore {
    DraftStore::new(Arc::new(MemoryStorage::new()))
}

fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

fn document(name: &str) -> ProfileDocument {
    ProfileDocument {
        name: name.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn absent_draft_is_not_an_error() {
    let store = test_store();

    let draft = store.draft(&user("u1")).await.unwrap();
    assert!(draft.is_none());
}

#[tokio::test]
async fn save_overwrites_the_whole_draft() {
    let store = test_store();
    let u = user("u1");

    store
        .save_draft(&u, document("Alice"), VisibilitySettings::default())
        .await
        .unwrap();

    let visibility = VisibilitySettings {
        bio: Visibility::Private,
        ..Default::default()
    };
    store
        .save_draft(&u, document("Alice B."), visibility)
        .await
        .unwrap();

    let draft = store.draft(&u).await.unwrap().unwrap();
    assert_eq!(draft.canonical.name, "Alice B.");
    assert_eq!(draft.visibility.bio, Visibility::Private);
}

#[tokio::test]
async fn drafts_are_scoped_per_user() {
    let store = test_store();

    store
        .save_draft(&user("u1"), document("Alice"), VisibilitySettings::default())
        .await
        .unwrap();

    assert!(store.draft(&user("u2")).await.unwrap().is_none());
}

#[tokio::test]
async fn claim_handle_enforces_global_uniqueness() {
    let store = test_store();

    store.claim_handle(&user("u1"), "alice").await.unwrap();

    let taken = store.claim_handle(&user("u2"), "alice").await;
    assert!(matches!(taken, Err(ProfileError::Validation(_))));
}

#[tokio::test]
async fn a_user_claims_at_most_one_handle() {
    let store = test_store();
    let u = user("u1");

    store.claim_handle(&u, "alice").await.unwrap();

    let second = store.claim_handle(&u, "alice-two").await;
    assert!(matches!(second, Err(ProfileError::Validation(_))));

    let handle = store.handle_for_user(&u).await.unwrap().unwrap();
    assert_eq!(handle.as_str(), "alice");
}

#[tokio::test]
async fn invalid_handles_are_rejected() {
    let store = test_store();
    let u = user("u1");

    for bad in ["ab", "Alice", "has space", "-leading", "trailing-", "a!b"] {
        let result = store.claim_handle(&u, bad).await;
        assert!(
            matches!(result, Err(ProfileError::Validation(_))),
            "handle '{bad}' should be rejected"
        );
    }

    assert!(store.handle_for_user(&u).await.unwrap().is_none());
}
