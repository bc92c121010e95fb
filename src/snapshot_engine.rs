//! Promotes drafts into immutable, versioned, content-hashed snapshots
//!
//! Publishing is the single mutating entry point for public data. A
//! snapshot is never edited in place; unpublishing flips a flag and
//! keeps the history.

use crate::error::ProfileError;
use crate::profile_document::{content_hash, project_public, ProfileDocument, VisibilitySettings};
use crate::search_index::SearchIndex;
use crate::storage::{Handle, ProfileStorage, SnapshotRecord};
use std::sync::Arc;
use tracing::{debug, info};

pub struct SnapshotEngine {
    storage: Arc<dyn ProfileStorage>,
    search_index: Arc<SearchIndex>,
}

impl SnapshotEngine {
    pub fn new(storage: Arc<dyn ProfileStorage>, search_index: Arc<SearchIndex>) -> Self {
        Self {
            storage,
            search_index,
        }
    }

    /// Publish a canonical document under a handle.
    ///
    /// Computes the content hash, freezes the public projection through
    /// the visibility settings supplied here, appends the next version
    /// via the storage layer's atomic sequence primitive, and rebuilds
    /// the handle's search index entry from the frozen projection.
    ///
    /// Re-publishing content whose hash matches the currently published
    /// latest version is a no-op returning the existing snapshot. If the
    /// latest version is unpublished, a new version is always written so
    /// republishing after an unpublish takes effect.
    pub async fn publish(
        &self,
        handle: &Handle,
        canonical: ProfileDocument,
        visibility: &VisibilitySettings,
    ) -> Result<SnapshotRecord, ProfileError> {
        let hash = content_hash(&canonical);

        let latest = self
            .storage
            .latest_snapshot(handle)
            .await
            .map_err(|e| ProfileError::internal("latest_snapshot", e))?;
        if let Some(latest) = latest {
            if latest.published && latest.content_hash == hash {
                debug!(
                    "publish for {} matches published version {}, skipping",
                    handle, latest.version_id
                );
                return Ok(latest);
            }
        }

        let public = project_public(&canonical, visibility);
        let record = self
            .storage
            .append_snapshot(handle, hash, canonical, public)
            .await
            .map_err(|e| ProfileError::internal("append_snapshot", e))?;

        self.search_index
            .rebuild_for_handle(handle, &record.public, record.created_at);

        info!("published {} version {}", handle, record.version_id);
        Ok(record)
    }

    /// Latest snapshot for a handle, only while it is published.
    ///
    /// An unpublished-but-stored latest version is indistinguishable
    /// from a handle that was never published.
    pub async fn latest_snapshot(
        &self,
        handle: &Handle,
    ) -> Result<Option<SnapshotRecord>, ProfileError> {
        let latest = self
            .storage
            .latest_snapshot(handle)
            .await
            .map_err(|e| ProfileError::internal("latest_snapshot", e))?;
        Ok(latest.filter(|record| record.published))
    }

    /// Fetch one version regardless of its published flag. For
    /// authorized internal callers only; the public read path goes
    /// through [`SnapshotEngine::latest_snapshot`].
    pub async fn snapshot_by_version(
        &self,
        handle: &Handle,
        version_id: u64,
    ) -> Result<Option<SnapshotRecord>, ProfileError> {
        self.storage
            .snapshot_by_version(handle, version_id)
            .await
            .map_err(|e| ProfileError::internal("snapshot_by_version", e))
    }

    /// Soft-delete: flip `published = false` on every version, keeping
    /// all rows and the version counter.
    pub async fn unpublish_snapshots(&self, handle: &Handle) -> Result<usize, ProfileError> {
        let touched = self
            .storage
            .unpublish_all(handle)
            .await
            .map_err(|e| ProfileError::internal("unpublish_all", e))?;
        info!("unpublished {} snapshot(s) for {}", touched, handle);
        Ok(touched)
    }

    /// Hard-remove every snapshot row for the handle. Only the full
    /// profile deletion path calls this.
    pub async fn delete_all_snapshots(&self, handle: &Handle) -> Result<(), ProfileError> {
        self.storage
            .delete_snapshots(handle)
            .await
            .map_err(|e| ProfileError::internal("delete_snapshots", e))?;
        info!("deleted all snapshots for {}", handle);
        Ok(())
    }
}
