//! Orchestrates unpublish and hard delete across the engine's parts
//!
//! Steps run from most publicly visible to least, so a mid-sequence
//! failure degrades toward increased privacy rather than accidental
//! exposure.

use crate::error::ProfileError;
use crate::search_index::SearchIndex;
use crate::snapshot_engine::SnapshotEngine;
use crate::storage::{Handle, ProfileStorage, UserId};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ProfileLifecycle {
    storage: Arc<dyn ProfileStorage>,
    snapshot_engine: Arc<SnapshotEngine>,
    search_index: Arc<SearchIndex>,
}

impl ProfileLifecycle {
    pub fn new(
        storage: Arc<dyn ProfileStorage>,
        snapshot_engine: Arc<SnapshotEngine>,
        search_index: Arc<SearchIndex>,
    ) -> Self {
        Self {
            storage,
            snapshot_engine,
            search_index,
        }
    }

    /// Hide a profile from the public surface, keeping its history.
    ///
    /// Snapshots are unpublished first; once that succeeds the public
    /// read path already returns not-found, so a straggling index entry
    /// is a self-healing inconsistency, not a failure.
    pub async fn unpublish(&self, handle: &Handle) -> Result<(), ProfileError> {
        self.snapshot_engine.unpublish_snapshots(handle).await?;
        self.search_index.delete_entry(handle);
        Ok(())
    }

    /// Irreversibly remove a user and everything attached to them.
    ///
    /// Order: search index entry, handle, snapshots, draft, sessions,
    /// user. The handle becomes unreachable before any row that could
    /// still be fetched through it is touched.
    pub async fn hard_delete(&self, user: &UserId) -> Result<(), ProfileError> {
        let handle = self
            .storage
            .handle_for_user(user)
            .await
            .map_err(|e| ProfileError::internal("handle_for_user", e))?;

        if let Some(handle) = &handle {
            self.search_index.delete_entry(handle);
            self.storage
                .release_handle(user)
                .await
                .map_err(|e| ProfileError::internal("release_handle", e))?;
            self.snapshot_engine.delete_all_snapshots(handle).await?;
        }

        self.storage
            .delete_draft(user)
            .await
            .map_err(|e| ProfileError::internal("delete_draft", e))?;
        if let Err(e) = self.storage.delete_sessions_for_user(user).await {
            // The account data is gone; a leftover session resolves to
            // a user with no profile and expires on its own.
            warn!("failed to clear sessions for deleted user {}: {}", user, e);
        }
        self.storage
            .delete_user(user)
            .await
            .map_err(|e| ProfileError::internal("delete_user", e))?;

        info!(
            "hard-deleted user {}{}",
            user,
            handle
                .map(|h| format!(" (handle {h})"))
                .unwrap_or_default()
        );
        Ok(())
    }
}
