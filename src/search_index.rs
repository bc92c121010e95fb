//! Derived, queryable projection of currently-published profiles
//!
//! The index is a cache, never a source of truth: the Snapshot Engine
//! rebuilds a handle's entry wholesale on every publish and the
//! Lifecycle Coordinator removes it on unpublish and hard delete. No
//! other path writes here, so the whole index is always rederivable
//! from snapshot state.

use crate::error::ProfileError;
use crate::profile_document::PublicProfile;
use crate::storage::Handle;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

/// One row per currently-published handle
#[derive(Debug, Clone, Serialize)]
pub struct SearchIndexEntry {
    pub handle: Handle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub skills: Vec<String>,
    pub organizations: Vec<String>,
    pub titles: Vec<String>,
    pub locations: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl SearchIndexEntry {
    /// Denormalize the queryable fields out of a public projection.
    pub fn from_public(handle: &Handle, public: &PublicProfile, updated_at: DateTime<Utc>) -> Self {
        Self {
            handle: handle.clone(),
            display_name: public.name.clone(),
            skills: public.skills.clone(),
            organizations: public.experience.iter().map(|e| e.org.clone()).collect(),
            titles: public.experience.iter().map(|e| e.title.clone()).collect(),
            locations: public.location.clone().into_iter().collect(),
            updated_at,
        }
    }

    fn sort_key(&self) -> (i64, &str) {
        (self.updated_at.timestamp_micros(), self.handle.as_str())
    }
}

/// Optional filters for a discovery query
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    pub skill: Option<String>,
    pub org: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    /// Inclusive lower bound on `updated_at`
    pub updated_after: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// One page of query results
#[derive(Debug, Serialize)]
pub struct QueryPage {
    pub results: Vec<SearchIndexEntry>,
    pub next_cursor: Option<String>,
}

/// Cursor position: sort key of the last entry already delivered.
///
/// Encoding the key rather than an offset keeps pages stable while
/// entries are inserted or removed elsewhere in the index.
struct Cursor {
    updated_at_micros: i64,
    handle: String,
}

impl Cursor {
    fn encode(entry: &SearchIndexEntry) -> String {
        let raw = format!(
            "{}:{}",
            entry.updated_at.timestamp_micros(),
            entry.handle.as_str()
        );
        general_purpose::URL_SAFE_NO_PAD.encode(raw)
    }

    fn decode(encoded: &str) -> Result<Self, ProfileError> {
        let malformed = || ProfileError::Validation("malformed cursor".to_string());
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| malformed())?;
        let raw = String::from_utf8(bytes).map_err(|_| malformed())?;
        let (micros, handle) = raw.split_once(':').ok_or_else(malformed)?;
        let updated_at_micros = micros.parse().map_err(|_| malformed())?;
        if handle.is_empty() {
            return Err(malformed());
        }
        Ok(Cursor {
            updated_at_micros,
            handle: handle.to_string(),
        })
    }
}

fn tag_match(values: &[String], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    values
        .iter()
        .any(|value| value.to_lowercase().contains(&needle))
}

/// In-memory search index over published profiles
#[derive(Default)]
pub struct SearchIndex {
    entries: RwLock<HashMap<String, SearchIndexEntry>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for a handle wholesale. Called by the Snapshot
    /// Engine on every publish.
    pub fn rebuild_for_handle(
        &self,
        handle: &Handle,
        public: &PublicProfile,
        updated_at: DateTime<Utc>,
    ) {
        let entry = SearchIndexEntry::from_public(handle, public, updated_at);
        self.entries
            .write()
            .insert(handle.as_str().to_string(), entry);
        debug!("rebuilt search index entry for {}", handle);
    }

    /// Remove the entry for a handle. Called on unpublish and hard delete.
    pub fn delete_entry(&self, handle: &Handle) {
        self.entries.write().remove(handle.as_str());
        debug!("removed search index entry for {}", handle);
    }

    /// Filtered, cursor-paginated lookup over the index.
    ///
    /// Results are ordered most-recently-updated first with handle as
    /// tie-break, so a cursor resumes exactly where the previous page
    /// stopped even as entries come and go around it.
    pub fn query(&self, filters: &QueryFilters) -> Result<QueryPage, ProfileError> {
        let limit = filters.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let cursor = filters
            .cursor
            .as_deref()
            .map(Cursor::decode)
            .transpose()?;

        let entries = self.entries.read();
        let mut matches: Vec<&SearchIndexEntry> = entries
            .values()
            .filter(|entry| {
                filters
                    .skill
                    .as_deref()
                    .is_none_or(|skill| tag_match(&entry.skills, skill))
                    && filters
                        .org
                        .as_deref()
                        .is_none_or(|org| tag_match(&entry.organizations, org))
                    && filters
                        .title
                        .as_deref()
                        .is_none_or(|title| tag_match(&entry.titles, title))
                    && filters
                        .location
                        .as_deref()
                        .is_none_or(|location| tag_match(&entry.locations, location))
                    && filters
                        .updated_after
                        .is_none_or(|after| entry.updated_at >= after)
            })
            .collect();

        matches.sort_by(|a, b| {
            let (a_ts, a_handle) = a.sort_key();
            let (b_ts, b_handle) = b.sort_key();
            b_ts.cmp(&a_ts).then_with(|| a_handle.cmp(b_handle))
        });

        let after_cursor = |entry: &SearchIndexEntry| match &cursor {
            None => true,
            Some(cursor) => {
                let (ts, handle) = entry.sort_key();
                ts < cursor.updated_at_micros
                    || (ts == cursor.updated_at_micros && handle > cursor.handle.as_str())
            }
        };

        let mut remaining = matches.into_iter().filter(|entry| after_cursor(entry));
        let results: Vec<SearchIndexEntry> = remaining.by_ref().take(limit).cloned().collect();
        let next_cursor = if remaining.next().is_some() {
            results.last().map(Cursor::encode)
        } else {
            None
        };

        Ok(QueryPage {
            results,
            next_cursor,
        })
    }
}
