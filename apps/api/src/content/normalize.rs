//! Content normalization: turns whatever the résumé row stores into `StructuredContent`.
//!
//! Stored content arrives either as a JSON object (the form editor) or as a string
//! (legacy free text, sometimes itself a JSON document). Normalization never fails:
//! any shape it does not recognise falls through to the free-text path so that every
//! résumé stays renderable.

use serde_json::{Map, Value};

use crate::content::model::{
    CertificationEntry, EducationEntry, ExperienceEntry, LanguageEntry, PersonalInfo,
    ProjectEntry, SkillEntry, StructuredContent,
};

/// Keys that mark an object as structured résumé content.
const KNOWN_KEYS: &[&str] = &[
    "personal",
    "personalInfo",
    "personal_info",
    "summary",
    "headline",
    "experience",
    "education",
    "skills",
    "projects",
    "certifications",
    "languages",
];

/// Output of [`normalize_content`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedContent {
    pub content: StructuredContent,
    /// Name printed in the page header: `personal.fullName`, else the owner's display name.
    pub display_name: String,
    /// True when the stored value was treated as plain text.
    pub is_legacy_text: bool,
}

/// Normalizes a stored content value.
///
/// `owner_name` backs the header name when the content has none; `title` backs the
/// headline when neither the content nor its first experience entry provides one.
pub fn normalize_content(raw: &Value, owner_name: &str, title: &str) -> NormalizedContent {
    let (mut content, is_legacy_text) = match raw {
        Value::Object(map) if has_known_keys(map) => (map_structured(map), false),
        Value::Object(map) => (free_text_from_object(map), true),
        Value::Array(items) => (map_array(items), false),
        Value::String(s) => normalize_string(s),
        Value::Null => (StructuredContent::default(), false),
        Value::Bool(_) | Value::Number(_) => (free_text_from_str(&raw.to_string()), true),
    };

    if content.headline.trim().is_empty() {
        content.headline = content
            .experience
            .iter()
            .map(|e| e.position.trim())
            .find(|p| !p.is_empty())
            .unwrap_or_else(|| title.trim())
            .to_string();
    }

    let display_name = if content.personal.full_name.trim().is_empty() {
        owner_name.trim().to_string()
    } else {
        content.personal.full_name.trim().to_string()
    };

    NormalizedContent {
        content,
        display_name,
        is_legacy_text,
    }
}

/// Strings are tried as JSON first, then split into free-text lines.
fn normalize_string(s: &str) -> (StructuredContent, bool) {
    let trimmed = s.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) if has_known_keys(&map) => return (map_structured(&map), false),
            Ok(Value::Array(items)) => return (map_array(&items), false),
            _ => {}
        }
    }
    (free_text_from_str(s), true)
}

fn has_known_keys(map: &Map<String, Value>) -> bool {
    KNOWN_KEYS.iter().any(|k| map.contains_key(*k))
}

fn free_text_from_str(s: &str) -> StructuredContent {
    StructuredContent {
        free_text: s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect(),
        ..StructuredContent::default()
    }
}

/// Unknown object shapes are flattened to `key: value` lines.
fn free_text_from_object(map: &Map<String, Value>) -> StructuredContent {
    let mut content = StructuredContent::default();
    for (key, value) in map {
        if let Some(text) = scalar_text(value) {
            if !text.is_empty() {
                content.free_text.push(format!("{key}: {text}"));
            }
        }
    }
    content
}

/// Arrays mix section fragments (objects) and bare lines (strings).
fn map_array(items: &[Value]) -> StructuredContent {
    let mut merged = StructuredContent::default();
    for item in items {
        match item {
            Value::Object(map) if has_known_keys(map) => merge(&mut merged, map_structured(map)),
            Value::Object(map) => merged.free_text.extend(free_text_from_object(map).free_text),
            other => {
                if let Some(text) = scalar_text(other) {
                    merged
                        .free_text
                        .extend(text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from));
                }
            }
        }
    }
    merged
}

fn merge(into: &mut StructuredContent, from: StructuredContent) {
    if !from.personal.is_empty() {
        into.personal = from.personal;
    }
    if !from.headline.is_empty() {
        into.headline = from.headline;
    }
    if !from.summary.is_empty() {
        into.summary = from.summary;
    }
    into.experience.extend(from.experience);
    into.education.extend(from.education);
    into.skills.extend(from.skills);
    into.projects.extend(from.projects);
    into.certifications.extend(from.certifications);
    into.languages.extend(from.languages);
    into.free_text.extend(from.free_text);
}

fn map_structured(map: &Map<String, Value>) -> StructuredContent {
    let personal = ["personal", "personalInfo", "personal_info"]
        .iter()
        .find_map(|k| map.get(*k))
        .and_then(Value::as_object)
        .map(|p| PersonalInfo {
            full_name: text(p, &["fullName", "full_name", "name"]),
            email: text(p, &["email"]),
            phone: text(p, &["phone", "phoneNumber", "phone_number"]),
            location: text(p, &["location", "address", "city"]),
        })
        .unwrap_or_default();

    StructuredContent {
        personal,
        headline: text(map, &["headline"]),
        summary: text(map, &["summary"]),
        experience: entries(map, "experience", |e| ExperienceEntry {
            company: text(e, &["company", "employer"]),
            position: text(e, &["position", "role", "title"]),
            duration: text(e, &["duration", "period", "dates"]),
            description: text(e, &["description", "details"]),
        }),
        education: entries(map, "education", |e| EducationEntry {
            institution: text(e, &["institution", "school"]),
            degree: text(e, &["degree"]),
            field: text(e, &["field", "fieldOfStudy", "field_of_study", "major"]),
            year: text(e, &["year", "graduationYear", "graduation_year"]),
        }),
        skills: list(map, "skills", |v| match v {
            Value::Object(e) => Some(SkillEntry {
                skill: text(e, &["skill", "name"]),
                proficiency_level: text(e, &["proficiencyLevel", "proficiency_level", "level"]),
            }),
            other => scalar_text(other).map(|skill| SkillEntry {
                skill,
                proficiency_level: String::new(),
            }),
        }),
        projects: entries(map, "projects", |e| ProjectEntry {
            title: text(e, &["title", "name"]),
            description: text(e, &["description", "details"]),
            link: text(e, &["link", "url"]),
        }),
        certifications: entries(map, "certifications", |e| CertificationEntry {
            name: text(e, &["name", "title"]),
            issuer: text(e, &["issuer", "organization"]),
            date: text(e, &["date", "issued", "year"]),
        }),
        languages: list(map, "languages", |v| match v {
            Value::Object(e) => Some(LanguageEntry {
                language: text(e, &["language", "name"]),
                proficiency_level: text(e, &["proficiencyLevel", "proficiency_level", "level"]),
            }),
            other => scalar_text(other).map(|language| LanguageEntry {
                language,
                proficiency_level: String::new(),
            }),
        }),
        free_text: Vec::new(),
    }
}

/// Maps every object element of `map[key]`, dropping entries whose fields are all blank.
fn entries<T, F>(map: &Map<String, Value>, key: &str, f: F) -> Vec<T>
where
    T: Default + PartialEq,
    F: Fn(&Map<String, Value>) -> T,
{
    list(map, key, |v| v.as_object().map(&f))
}

fn list<T, F>(map: &Map<String, Value>, key: &str, f: F) -> Vec<T>
where
    T: Default + PartialEq,
    F: Fn(&Value) -> Option<T>,
{
    map.get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(&f)
                .filter(|entry| *entry != T::default())
                .collect()
        })
        .unwrap_or_default()
}

/// First present alias wins; numbers and booleans are stringified.
fn text(map: &Map<String, Value>, aliases: &[&str]) -> String {
    aliases
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(scalar_text)
        .unwrap_or_default()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
