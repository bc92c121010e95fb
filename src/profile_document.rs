//! Canonical profile document, visibility settings, and the public projection
//!
//! The canonical document is the single structured shape a draft and a
//! snapshot both carry. Redaction is a pure function from canonical +
//! visibility to the public projection, computed once at publish time
//! and frozen into the snapshot.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Whether a field or section appears in the public projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

fn private() -> Visibility {
    Visibility::Private
}

/// A position held at an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub org: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A project the user wants to show off
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// An external link (website, repository, social account)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub label: String,
    pub url: String,
}

/// The full working profile a user edits
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ProjectEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkEntry>,
}

/// Per-field/per-section visibility flags, parallel to [`ProfileDocument`].
///
/// Everything defaults to public except `email`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilitySettings {
    #[serde(default)]
    pub name: Visibility,
    #[serde(default)]
    pub headline: Visibility,
    #[serde(default)]
    pub bio: Visibility,
    #[serde(default)]
    pub location: Visibility,
    #[serde(default = "private")]
    pub email: Visibility,
    #[serde(default)]
    pub skills: Visibility,
    #[serde(default)]
    pub experience: Visibility,
    #[serde(default)]
    pub projects: Visibility,
    #[serde(default)]
    pub links: Visibility,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            name: Visibility::Public,
            headline: Visibility::Public,
            bio: Visibility::Public,
            location: Visibility::Public,
            email: Visibility::Private,
            skills: Visibility::Public,
            experience: Visibility::Public,
            projects: Visibility::Public,
            links: Visibility::Public,
        }
    }
}

/// The externally visible subset of a profile, frozen at publish time
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublicProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ProjectEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkEntry>,
}

/// Compute the public projection of a canonical document.
///
/// Fields and sections flagged private are dropped entirely. The result
/// is stored verbatim in the snapshot, so visibility edits made after
/// publishing never reach already-published data.
pub fn project_public(canonical: &ProfileDocument, visibility: &VisibilitySettings) -> PublicProfile {
    fn keep<T: Clone>(value: &Option<T>, flag: Visibility) -> Option<T> {
        if flag.is_public() {
            value.clone()
        } else {
            None
        }
    }

    fn keep_all<T: Clone>(values: &[T], flag: Visibility) -> Vec<T> {
        if flag.is_public() {
            values.to_vec()
        } else {
            Vec::new()
        }
    }

    PublicProfile {
        name: if visibility.name.is_public() {
            Some(canonical.name.clone())
        } else {
            None
        },
        headline: keep(&canonical.headline, visibility.headline),
        bio: keep(&canonical.bio, visibility.bio),
        location: keep(&canonical.location, visibility.location),
        email: keep(&canonical.email, visibility.email),
        skills: keep_all(&canonical.skills, visibility.skills),
        experience: keep_all(&canonical.experience, visibility.experience),
        projects: keep_all(&canonical.projects, visibility.projects),
        links: keep_all(&canonical.links, visibility.links),
    }
}

/// Deterministic digest of a canonical document, used for publish idempotence.
///
/// Struct fields serialize in declaration order, so the same document
/// always produces the same bytes and the same hash.
pub fn content_hash(canonical: &ProfileDocument) -> String {
    let bytes = serde_json::to_vec(canonical).expect("profile document serializes");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}
