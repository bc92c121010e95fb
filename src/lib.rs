pub mod auth;
pub mod draft_store;
pub mod error;
pub mod lifecycle;
pub mod profile_document;
pub mod rate_limiter;
pub mod search_index;
pub mod server;
pub mod snapshot_engine;
pub mod storage;

#[cfg(test)]
mod tests;

pub use auth::{AuthResolver, SessionAuthResolver};
pub use draft_store::DraftStore;
pub use error::ProfileError;
pub use lifecycle::ProfileLifecycle;
pub use profile_document::{
    content_hash, project_public, ProfileDocument, PublicProfile, Visibility, VisibilitySettings,
};
pub use rate_limiter::{EndpointClass, RateTier, RequestRateLimiter};
pub use search_index::{QueryFilters, QueryPage, SearchIndex, SearchIndexEntry};
pub use server::{router, AppState};
pub use snapshot_engine::SnapshotEngine;
pub use storage::{DraftRecord, Handle, MemoryStorage, ProfileStorage, SnapshotRecord, UserId};
