//! Storage collaborator interface and the in-memory implementation
//!
//! The engine never talks to tables directly; everything goes through
//! [`ProfileStorage`], which stands in for the external SQL store. The
//! one primitive the engine leans on is [`ProfileStorage::append_snapshot`]:
//! a single atomic "assign next version and insert" so concurrent
//! publishes for the same handle can never race a read-then-write pair.

use crate::error::ProfileError;
use crate::profile_document::{ProfileDocument, PublicProfile, VisibilitySettings};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Opaque user identity minted by the external auth collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique public profile identifier, immutable once claimed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Handle(String);

impl Handle {
    /// Parse and validate a handle: 3-32 chars, lowercase ASCII
    /// alphanumerics and `-`, no leading or trailing `-`.
    pub fn parse(raw: &str) -> Result<Self, ProfileError> {
        if raw.len() < 3 || raw.len() > 32 {
            return Err(ProfileError::Validation(
                "handle must be 3-32 characters".to_string(),
            ));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ProfileError::Validation(
                "handle may only contain lowercase letters, digits, and '-'".to_string(),
            ));
        }
        if raw.starts_with('-') || raw.ends_with('-') {
            return Err(ProfileError::Validation(
                "handle may not start or end with '-'".to_string(),
            ));
        }
        Ok(Handle(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Failures from the storage collaborator
#[derive(Error, Debug)]
pub enum StorageError {
    /// A uniqueness or precondition constraint was violated
    #[error("conflict: {0}")]
    Conflict(String),
    /// The backend itself failed
    #[error("storage backend: {0}")]
    Backend(String),
}

/// A user's current working profile plus its visibility settings
#[derive(Debug, Clone, Serialize)]
pub struct DraftRecord {
    pub canonical: ProfileDocument,
    pub visibility: VisibilitySettings,
    pub updated_at: DateTime<Utc>,
}

/// One immutable published-or-not version of a profile
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotRecord {
    pub handle: Handle,
    pub version_id: u64,
    pub content_hash: String,
    pub canonical: ProfileDocument,
    pub public: PublicProfile,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

/// The storage backend the engine is built against.
///
/// Expected consistency: at least read-committed, with
/// `append_snapshot` behaving as a single atomic insert-with-sequence
/// per handle.
#[async_trait]
pub trait ProfileStorage: Send + Sync {
    // Sessions
    async fn user_for_session(&self, token: &str) -> Result<Option<UserId>, StorageError>;
    async fn insert_session(&self, token: &str, user: &UserId) -> Result<(), StorageError>;
    async fn delete_sessions_for_user(&self, user: &UserId) -> Result<(), StorageError>;

    // Handles
    async fn claim_handle(&self, user: &UserId, handle: &Handle) -> Result<(), StorageError>;
    async fn handle_for_user(&self, user: &UserId) -> Result<Option<Handle>, StorageError>;
    async fn release_handle(&self, user: &UserId) -> Result<(), StorageError>;

    // Drafts
    async fn draft(&self, user: &UserId) -> Result<Option<DraftRecord>, StorageError>;
    async fn upsert_draft(
        &self,
        user: &UserId,
        canonical: ProfileDocument,
        visibility: VisibilitySettings,
    ) -> Result<(), StorageError>;
    async fn delete_draft(&self, user: &UserId) -> Result<(), StorageError>;

    // Snapshots
    /// Atomically assign the next version id for the handle and insert
    /// the row with `published = true`. Version ids start at 1 and keep
    /// counting across unpublish/republish cycles.
    async fn append_snapshot(
        &self,
        handle: &Handle,
        content_hash: String,
        canonical: ProfileDocument,
        public: PublicProfile,
    ) -> Result<SnapshotRecord, StorageError>;
    /// Highest-version snapshot regardless of its `published` flag.
    async fn latest_snapshot(&self, handle: &Handle)
        -> Result<Option<SnapshotRecord>, StorageError>;
    async fn snapshot_by_version(
        &self,
        handle: &Handle,
        version_id: u64,
    ) -> Result<Option<SnapshotRecord>, StorageError>;
    /// Flip `published = false` on every snapshot for the handle,
    /// returning how many rows were touched. Rows are retained.
    async fn unpublish_all(&self, handle: &Handle) -> Result<usize, StorageError>;
    async fn delete_snapshots(&self, handle: &Handle) -> Result<(), StorageError>;

    // Users
    async fn delete_user(&self, user: &UserId) -> Result<(), StorageError>;
}

#[derive(Default)]
struct Tables {
    sessions: HashMap<String, UserId>,
    handles: HashMap<String, UserId>,
    handle_by_user: HashMap<UserId, Handle>,
    drafts: HashMap<UserId, DraftRecord>,
    snapshots: HashMap<String, Vec<SnapshotRecord>>,
}

/// In-memory storage used for tests and single-process deployments.
///
/// A single lock guards all tables; `append_snapshot` computes the next
/// version and inserts under one write acquisition, which is what makes
/// it the atomic sequence primitive the trait requires.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStorage for MemoryStorage {
    async fn user_for_session(&self, token: &str) -> Result<Option<UserId>, StorageError> {
        Ok(self.tables.read().sessions.get(token).cloned())
    }

    async fn insert_session(&self, token: &str, user: &UserId) -> Result<(), StorageError> {
        self.tables
            .write()
            .sessions
            .insert(token.to_string(), user.clone());
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user: &UserId) -> Result<(), StorageError> {
        self.tables.write().sessions.retain(|_, u| u != user);
        Ok(())
    }

    async fn claim_handle(&self, user: &UserId, handle: &Handle) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        if tables.handles.contains_key(handle.as_str()) {
            return Err(StorageError::Conflict(format!(
                "handle '{handle}' is already taken"
            )));
        }
        if tables.handle_by_user.contains_key(user) {
            return Err(StorageError::Conflict(
                "user already has a handle".to_string(),
            ));
        }
        tables.handles.insert(handle.as_str().to_string(), user.clone());
        tables.handle_by_user.insert(user.clone(), handle.clone());
        Ok(())
    }

    async fn handle_for_user(&self, user: &UserId) -> Result<Option<Handle>, StorageError> {
        Ok(self.tables.read().handle_by_user.get(user).cloned())
    }

    async fn release_handle(&self, user: &UserId) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        if let Some(handle) = tables.handle_by_user.remove(user) {
            tables.handles.remove(handle.as_str());
        }
        Ok(())
    }

    async fn draft(&self, user: &UserId) -> Result<Option<DraftRecord>, StorageError> {
        Ok(self.tables.read().drafts.get(user).cloned())
    }

    async fn upsert_draft(
        &self,
        user: &UserId,
        canonical: ProfileDocument,
        visibility: VisibilitySettings,
    ) -> Result<(), StorageError> {
        self.tables.write().drafts.insert(
            user.clone(),
            DraftRecord {
                canonical,
                visibility,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_draft(&self, user: &UserId) -> Result<(), StorageError> {
        self.tables.write().drafts.remove(user);
        Ok(())
    }

    async fn append_snapshot(
        &self,
        handle: &Handle,
        content_hash: String,
        canonical: ProfileDocument,
        public: PublicProfile,
    ) -> Result<SnapshotRecord, StorageError> {
        let mut tables = self.tables.write();
        let rows = tables
            .snapshots
            .entry(handle.as_str().to_string())
            .or_default();
        let version_id = rows.last().map(|row| row.version_id + 1).unwrap_or(1);
        let record = SnapshotRecord {
            handle: handle.clone(),
            version_id,
            content_hash,
            canonical,
            public,
            published: true,
            created_at: Utc::now(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn latest_snapshot(
        &self,
        handle: &Handle,
    ) -> Result<Option<SnapshotRecord>, StorageError> {
        Ok(self
            .tables
            .read()
            .snapshots
            .get(handle.as_str())
            .and_then(|rows| rows.last().cloned()))
    }

    async fn snapshot_by_version(
        &self,
        handle: &Handle,
        version_id: u64,
    ) -> Result<Option<SnapshotRecord>, StorageError> {
        Ok(self
            .tables
            .read()
            .snapshots
            .get(handle.as_str())
            .and_then(|rows| rows.iter().find(|row| row.version_id == version_id))
            .cloned())
    }

    async fn unpublish_all(&self, handle: &Handle) -> Result<usize, StorageError> {
        let mut tables = self.tables.write();
        let mut touched = 0;
        if let Some(rows) = tables.snapshots.get_mut(handle.as_str()) {
            for row in rows.iter_mut().filter(|row| row.published) {
                row.published = false;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn delete_snapshots(&self, handle: &Handle) -> Result<(), StorageError> {
        self.tables.write().snapshots.remove(handle.as_str());
        Ok(())
    }

    async fn delete_user(&self, _user: &UserId) -> Result<(), StorageError> {
        // User rows live in the auth collaborator's store; sessions,
        // handle, draft, and snapshots are removed by their own calls.
        Ok(())
    }
}
