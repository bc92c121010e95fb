use crate::profile_document::{
    content_hash, project_public, ExperienceEntry, ProfileDocument, Visibility,
    VisibilitySettings,
};

fn sample_document() -> ProfileDocument {
    ProfileDocument {
        name: "Alice".to_string(),
        headline: Some("Systems engineer".to_string()),
        bio: Some("Builds storage engines".to_string()),
        location: Some("Berlin".to_string()),
        email: Some("alice@example.com".to_string()),
        skills: vec!["Go".to_string(), "Rust".to_string()],
        experience: vec![ExperienceEntry {
            org: "Acme".to_string(),
            title: "Engineer".to_string(),
            start: Some("2020".to_string()),
            end: None,
            summary: None,
        }],
        projects: vec![],
        links: vec![],
    }
}

#[test]
fn projection_keeps_public_fields() {
    let doc = sample_document();
    let visibility = VisibilitySettings::default();

    let public = project_public(&doc, &visibility);

    assert_eq!(public.name.as_deref(), Some("Alice"));
    assert_eq!(public.skills, vec!["Go", "Rust"]);
    assert_eq!(public.experience.len(), 1);
}

#[test]
fn projection_drops_private_fields() {
    let doc = sample_document();
    let visibility = VisibilitySettings {
        bio: Visibility::Private,
        skills: Visibility::Private,
        experience: Visibility::Private,
        ..Default::default()
    };

    let public = project_public(&doc, &visibility);

    assert!(public.bio.is_none());
    assert!(public.skills.is_empty());
    assert!(public.experience.is_empty());
    // Untouched flags still pass through
    assert_eq!(public.name.as_deref(), Some("Alice"));
    assert_eq!(public.location.as_deref(), Some("Berlin"));
}

#[test]
fn email_is_private_by_default() {
    let doc = sample_document();
    let visibility = VisibilitySettings::default();

    let public = project_public(&doc, &visibility);

    assert!(public.email.is_none());
}

#[test]
fn private_fields_never_reach_serialized_output() {
    let doc = sample_document();
    let visibility = VisibilitySettings {
        location: Visibility::Private,
        ..Default::default()
    };

    let public = project_public(&doc, &visibility);
    let json = serde_json::to_string(&public).unwrap();

    assert!(!json.contains("Berlin"));
    assert!(!json.contains("alice@example.com"));
}

#[test]
fn content_hash_is_deterministic() {
    let a = sample_document();
    let b = sample_document();

    assert_eq!(content_hash(&a), content_hash(&b));
}

#[test]
fn content_hash_changes_with_content() {
    let a = sample_document();
    let mut b = sample_document();
    b.skills.push("SQL".to_string());

    assert_ne!(content_hash(&a), content_hash(&b));
}

#[test]
fn content_hash_ignores_visibility() {
    // The hash covers the canonical document only; visibility changes
    // alone must not look like new content.
    let doc = sample_document();
    let hash = content_hash(&doc);

    let _ = VisibilitySettings {
        email: Visibility::Public,
        ..Default::default()
    };

    assert_eq!(content_hash(&doc), hash);
}

#[test]
fn visibility_settings_deserialize_with_defaults() {
    let visibility: VisibilitySettings = serde_json::from_str("{}").unwrap();

    assert_eq!(visibility.name, Visibility::Public);
    assert_eq!(visibility.email, Visibility::Private);

    let visibility: VisibilitySettings =
        serde_json::from_str(r#"{"bio": "private", "email": "public"}"#).unwrap();

    assert_eq!(visibility.bio, Visibility::Private);
    assert_eq!(visibility.email, Visibility::Public);
}
