//! The user's single mutable working profile

use crate::error::ProfileError;
use crate::profile_document::{ProfileDocument, VisibilitySettings};
use crate::storage::{DraftRecord, Handle, ProfileStorage, StorageError, UserId};
use std::sync::Arc;
use tracing::info;

/// Thin service over the draft and handle tables.
///
/// Exactly one draft per user; saves overwrite the whole document, no
/// partial merge. Absence of a draft is not an error.
pub struct DraftStore {
    storage: Arc<dyn ProfileStorage>,
}

impl DraftStore {
    pub fn new(storage: Arc<dyn ProfileStorage>) -> Self {
        Self { storage }
    }

    pub async fn draft(&self, user: &UserId) -> Result<Option<DraftRecord>, ProfileError> {
        self.storage
            .draft(user)
            .await
            .map_err(|e| ProfileError::internal("draft", e))
    }

    pub async fn save_draft(
        &self,
        user: &UserId,
        canonical: ProfileDocument,
        visibility: VisibilitySettings,
    ) -> Result<(), ProfileError> {
        self.storage
            .upsert_draft(user, canonical, visibility)
            .await
            .map_err(|e| ProfileError::internal("upsert_draft", e))?;
        info!("saved draft for user {}", user);
        Ok(())
    }

    pub async fn handle_for_user(&self, user: &UserId) -> Result<Option<Handle>, ProfileError> {
        self.storage
            .handle_for_user(user)
            .await
            .map_err(|e| ProfileError::internal("handle_for_user", e))
    }

    /// Claim a handle for a user. Handles are globally unique, one per
    /// user, and immutable once claimed.
    pub async fn claim_handle(&self, user: &UserId, raw: &str) -> Result<Handle, ProfileError> {
        let handle = Handle::parse(raw)?;
        match self.storage.claim_handle(user, &handle).await {
            Ok(()) => {
                info!("user {} claimed handle {}", user, handle);
                Ok(handle)
            }
            Err(StorageError::Conflict(reason)) => Err(ProfileError::Validation(reason)),
            Err(e) => Err(ProfileError::internal("claim_handle", e)),
        }
    }
}
