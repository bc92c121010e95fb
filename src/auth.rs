//! Request-to-user resolution
//!
//! Credential verification lives outside this engine. The one
//! capability consumed here is: resolve the current request to an
//! authenticated user or fail.

use crate::error::ProfileError;
use crate::storage::{ProfileStorage, UserId};
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::sync::Arc;

/// The external auth collaborator, seen from the engine's side
#[async_trait]
pub trait AuthResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<UserId, ProfileError>;
}

/// Resolves `Authorization: Bearer <token>` against the session table.
///
/// Token issuance (login, OAuth, cookie signing) happens out of band;
/// this only looks up what the issuer already stored.
pub struct SessionAuthResolver {
    storage: Arc<dyn ProfileStorage>,
}

impl SessionAuthResolver {
    pub fn new(storage: Arc<dyn ProfileStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl AuthResolver for SessionAuthResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<UserId, ProfileError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ProfileError::Unauthorized)?;

        self.storage
            .user_for_session(token)
            .await
            .map_err(|e| ProfileError::internal("user_for_session", e))?
            .ok_or(ProfileError::Unauthorized)
    }
}
