//! Recovery of structured payloads from free-form model output.
//!
//! Models wrap JSON in prose, code fences, and grounding citations like
//! `[3]`. Everything here is total: unusable input yields an empty or
//! placeholder value, never an error.

use std::sync::LazyLock;

use leadgen_core::{ContactInfo, LeadCandidate, TargetType};
use regex::Regex;

pub(crate) const DEFAULT_CONTACT_NAME: &str = "Founder";
pub(crate) const NOT_FOUND_EMAIL: &str = "not found";
pub(crate) const DEFAULT_CONTACT_SOURCE: &str = "Web Search";
pub(crate) const FALLBACK_CONTACT_SOURCE: &str = "Semantic Fallback";
pub(crate) const FALLBACK_DRAFT: &str = "Failed to generate pitch.";

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"));
static OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));
static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("valid citation regex"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});

/// Outermost `[...]` span with citation markers removed.
fn extract_array(text: &str) -> Option<String> {
    ARRAY_RE
        .find(text)
        .map(|m| CITATION_RE.replace_all(m.as_str(), "").into_owned())
}

/// Outermost `{...}` span with citation markers removed.
fn extract_object(text: &str) -> Option<String> {
    OBJECT_RE
        .find(text)
        .map(|m| CITATION_RE.replace_all(m.as_str(), "").into_owned())
}

/// Parse a discovery response into active candidates.
///
/// Entries that are not objects or fail to deserialize are skipped one by
/// one; a response without a parseable array yields an empty list.
pub(crate) fn parse_candidates(text: &str) -> Vec<LeadCandidate> {
    let Some(json) = extract_array(text) else {
        tracing::warn!("discovery response contained no JSON array");
        return Vec::new();
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&json) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse discovery JSON");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<LeadCandidate>(v) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed candidate");
                None
            }
        })
        .filter(|c| c.is_active)
        .collect()
}

/// Parse a single-brand lookup response.
///
/// Missing fields fall back to lookup defaults: active, not verified, D2C.
pub(crate) fn parse_lookup(text: &str) -> Option<LeadCandidate> {
    let json = extract_object(text)?;
    let value: serde_json::Value = match serde_json::from_str(&json) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse lookup JSON");
            return None;
        }
    };
    let mut candidate: LeadCandidate = match serde_json::from_value(value) {
        Ok(candidate) => candidate,
        Err(e) => {
            tracing::warn!(error = %e, "lookup JSON had an unexpected shape");
            return None;
        }
    };
    candidate.is_active = true;
    candidate.target_type.get_or_insert(TargetType::D2c);
    Some(candidate)
}

/// Parse a contact-finding response.
///
/// Prefers a JSON object; otherwise scans the text for anything shaped like
/// an email address. Never fails.
pub(crate) fn parse_contact(text: &str) -> ContactInfo {
    let parsed = extract_object(text)
        .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
        .filter(serde_json::Value::is_object);

    if let Some(value) = parsed {
        let field = |key: &str, default: &str| -> String {
            value
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        return ContactInfo {
            name: field("name", DEFAULT_CONTACT_NAME),
            email: field("email", NOT_FOUND_EMAIL),
            source: field("source", DEFAULT_CONTACT_SOURCE),
        };
    }

    ContactInfo {
        name: DEFAULT_CONTACT_NAME.to_string(),
        email: find_email(text).unwrap_or(NOT_FOUND_EMAIL).to_string(),
        source: FALLBACK_CONTACT_SOURCE.to_string(),
    }
}

/// First email-shaped substring of `text`.
pub(crate) fn find_email(text: &str) -> Option<&str> {
    EMAIL_RE.find(text).map(|m| m.as_str())
}

/// Trimmed draft text, or the fixed fallback sentence when empty.
pub(crate) fn draft_or_fallback(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        FALLBACK_DRAFT.to_string()
    } else {
        trimmed.to_string()
    }
}
