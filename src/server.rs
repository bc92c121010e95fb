//! HTTP surface: router, handlers, and the rate-limit gate
//!
//! Public discovery reads never touch the draft store or the auth
//! resolver; authenticated routes resolve the user before doing
//! anything else. Every route passes the rate limiter first.

use crate::auth::AuthResolver;
use crate::draft_store::DraftStore;
use crate::error::ProfileError;
use crate::lifecycle::ProfileLifecycle;
use crate::profile_document::{ProfileDocument, VisibilitySettings};
use crate::rate_limiter::{EndpointClass, RequestRateLimiter};
use crate::search_index::{QueryFilters, SearchIndex};
use crate::snapshot_engine::SnapshotEngine;
use crate::storage::Handle;
use axum::{
    extract::{ConnectInfo, Path, Query, Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Current version of the public JSON shapes
pub const SCHEMA_VERSION: u32 = 1;

pub struct AppState {
    pub auth: Arc<dyn AuthResolver>,
    pub draft_store: DraftStore,
    pub snapshot_engine: Arc<SnapshotEngine>,
    pub search_index: Arc<SearchIndex>,
    pub lifecycle: ProfileLifecycle,
    pub rate_limiter: RequestRateLimiter,
}

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/", get(discovery_handler))
        .route("/health", get(health_handler))
        .route("/profiles", get(query_profiles_handler))
        .route("/profiles/{handle}", get(fetch_profile_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            public_read_gate,
        ));

    let authenticated = Router::new()
        .route(
            "/me/profile",
            get(own_profile_handler).put(save_draft_handler),
        )
        .route("/me/handle", post(claim_handle_handler))
        .route("/me/publish", post(publish_handler))
        .route("/me/unpublish", post(unpublish_handler))
        .route("/me", delete(hard_delete_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), default_gate));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public)
        .merge(authenticated)
        .layer(cors)
        .with_state(state)
}

/// Client identity for rate limiting: first `X-Forwarded-For` hop when
/// present, else the peer address.
fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

async fn public_read_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ProfileError> {
    state
        .rate_limiter
        .check(&client_key(&request), EndpointClass::PublicRead)?;
    Ok(next.run(request).await)
}

async fn default_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ProfileError> {
    state
        .rate_limiter
        .check(&client_key(&request), EndpointClass::Default)?;
    Ok(next.run(request).await)
}

async fn discovery_handler() -> Response {
    Json(json!({
        "name": "profile-publisher",
        "version": env!("CARGO_PKG_VERSION"),
        "schema_version": SCHEMA_VERSION,
        "endpoints": {
            "profile": "GET /profiles/{handle}",
            "search": "GET /profiles?skill=&org=&title=&location=&updated_after=&limit=&cursor=",
            "own_profile": "GET /me/profile",
            "save_draft": "PUT /me/profile",
            "claim_handle": "POST /me/handle",
            "publish": "POST /me/publish",
            "unpublish": "POST /me/unpublish",
            "delete_profile": "DELETE /me",
        },
    }))
    .into_response()
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn fetch_profile_handler(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Response, ProfileError> {
    let handle = Handle::parse(&handle)?;
    let snapshot = state
        .snapshot_engine
        .latest_snapshot(&handle)
        .await?
        .ok_or(ProfileError::NotFound("no published profile"))?;

    Ok(Json(json!({
        "handle": snapshot.handle,
        "version_id": snapshot.version_id,
        "updated_at": snapshot.created_at,
        "profile": snapshot.public,
    }))
    .into_response())
}

#[derive(Deserialize)]
struct SearchParams {
    skill: Option<String>,
    org: Option<String>,
    title: Option<String>,
    location: Option<String>,
    updated_after: Option<String>,
    limit: Option<String>,
    cursor: Option<String>,
}

impl SearchParams {
    /// Parse into typed filters; an unparseable limit or timestamp is a
    /// validation error, never a silent fallback.
    fn into_filters(self) -> Result<QueryFilters, ProfileError> {
        let limit = self
            .limit
            .map(|raw| {
                raw.parse::<usize>()
                    .ok()
                    .filter(|limit| *limit > 0)
                    .ok_or_else(|| {
                        ProfileError::Validation("limit must be a positive integer".to_string())
                    })
            })
            .transpose()?;

        let updated_after = self
            .updated_after
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(|_| {
                        ProfileError::Validation(
                            "updated_after must be an RFC 3339 timestamp".to_string(),
                        )
                    })
            })
            .transpose()?;

        Ok(QueryFilters {
            skill: self.skill,
            org: self.org,
            title: self.title,
            location: self.location,
            updated_after,
            limit,
            cursor: self.cursor,
        })
    }
}

async fn query_profiles_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ProfileError> {
    let filters = params.into_filters()?;
    let page = state.search_index.query(&filters)?;
    Ok(Json(page).into_response())
}

async fn own_profile_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ProfileError> {
    let user = state.auth.resolve(&headers).await?;
    let draft = state.draft_store.draft(&user).await?;
    let handle = state.draft_store.handle_for_user(&user).await?;

    let published_version = match &handle {
        Some(handle) => state
            .snapshot_engine
            .latest_snapshot(handle)
            .await?
            .map(|snapshot| snapshot.version_id),
        None => None,
    };

    Ok(Json(json!({
        "handle": handle,
        "draft": draft,
        "published_version": published_version,
    }))
    .into_response())
}

#[derive(Deserialize)]
struct SaveDraftRequest {
    profile: ProfileDocument,
    #[serde(default)]
    visibility: VisibilitySettings,
}

async fn save_draft_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SaveDraftRequest>,
) -> Result<Response, ProfileError> {
    let user = state.auth.resolve(&headers).await?;
    if body.profile.name.trim().is_empty() {
        return Err(ProfileError::Validation("name must not be empty".to_string()));
    }
    state
        .draft_store
        .save_draft(&user, body.profile, body.visibility)
        .await?;
    Ok(Json(json!({ "saved": true })).into_response())
}

#[derive(Deserialize)]
struct ClaimHandleRequest {
    handle: String,
}

async fn claim_handle_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ClaimHandleRequest>,
) -> Result<Response, ProfileError> {
    let user = state.auth.resolve(&headers).await?;
    let handle = state.draft_store.claim_handle(&user, &body.handle).await?;
    Ok(Json(json!({ "handle": handle })).into_response())
}

async fn publish_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ProfileError> {
    let user = state.auth.resolve(&headers).await?;
    let handle = state
        .draft_store
        .handle_for_user(&user)
        .await?
        .ok_or(ProfileError::NotFound("no handle claimed"))?;
    let draft = state
        .draft_store
        .draft(&user)
        .await?
        .ok_or(ProfileError::NotFound("no draft to publish"))?;

    let snapshot = state
        .snapshot_engine
        .publish(&handle, draft.canonical, &draft.visibility)
        .await?;

    Ok(Json(json!({
        "handle": snapshot.handle,
        "version_id": snapshot.version_id,
        "content_hash": snapshot.content_hash,
        "created_at": snapshot.created_at,
        "profile": snapshot.public,
    }))
    .into_response())
}

async fn unpublish_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ProfileError> {
    let user = state.auth.resolve(&headers).await?;
    let handle = state
        .draft_store
        .handle_for_user(&user)
        .await?
        .ok_or(ProfileError::NotFound("no handle claimed"))?;
    state.lifecycle.unpublish(&handle).await?;
    Ok(Json(json!({ "unpublished": true })).into_response())
}

#[derive(Deserialize)]
struct HardDeleteRequest {
    #[serde(default)]
    confirm: bool,
}

async fn hard_delete_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<HardDeleteRequest>,
) -> Result<Response, ProfileError> {
    let user = state.auth.resolve(&headers).await?;
    if !body.confirm {
        return Err(ProfileError::Validation(
            "deletion requires {\"confirm\": true}".to_string(),
        ));
    }
    state.lifecycle.hard_delete(&user).await?;
    Ok(Json(json!({ "deleted": true })).into_response())
}
