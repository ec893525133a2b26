//! Internal helpers for input normalization and model conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every service enforces the same invariants.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

pub(crate) fn parse_optional_uuid(value: Option<&str>, label: &str) -> ResultEngine<Option<Uuid>> {
    value.map(|raw| parse_uuid(raw, label)).transpose()
}

/// Trim a title and collapse inner whitespace; empty titles are rejected.
pub(crate) fn normalize_title(value: &str, label: &str) -> ResultEngine<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} title must not be empty"
        )));
    }
    if collapsed.chars().count() > 255 {
        return Err(EngineError::InvalidName(format!(
            "{label} title must be at most 255 characters"
        )));
    }
    Ok(collapsed)
}

/// Case- and accent-insensitive key used for uniqueness checks.
///
/// `"  Café  Bar "` and `"cafe bar"` share the key `"cafe bar"`.
pub(crate) fn normalize_key(value: &str) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    for ch in value.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// URL-friendly slug derived from the normalized key.
pub(crate) fn slugify(value: &str) -> String {
    let mut slug = String::new();
    for ch in normalize_key(value).chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("n-a");
    }
    slug
}

/// Split free-text tag input (`"food, Food ,rent"`) into distinct titles.
///
/// Duplicates are detected on the normalized key; the first spelling wins.
pub(crate) fn split_tag_titles(input: &str) -> Vec<String> {
    let mut seen = Vec::new();
    let mut titles = Vec::new();
    for raw in input.split(',') {
        let Ok(title) = normalize_title(raw, "tag") else {
            continue;
        };
        let key = normalize_key(&title);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        titles.push(title);
    }
    titles
}

pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        })
        && !email.chars().any(char::is_whitespace);
    if !valid {
        return Err(EngineError::InvalidEmail(format!("{value:?} is not an email")));
    }
    Ok(email)
}
