//! `mailto:` links with a pre-filled subject and body.

use leadgen_core::Lead;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const FOLLOW_UP_FALLBACK_BODY: &str = "Checking in!";

fn encode(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

fn compose(to: &str, subject: &str, body: &str) -> String {
    format!("mailto:{to}?subject={}&body={}", encode(subject), encode(body))
}

/// Link for the first outreach email, or `None` without a contact email.
#[must_use]
pub(crate) fn initial_email_link(lead: &Lead) -> Option<String> {
    let to = contact_email(lead)?;
    Some(compose(
        to,
        &format!("Question about {}", lead.name),
        lead.generated_email.as_deref().unwrap_or_default(),
    ))
}

/// Link for a follow-up bump, or `None` without a contact email.
#[must_use]
pub(crate) fn follow_up_link(lead: &Lead) -> Option<String> {
    let to = contact_email(lead)?;
    let body = lead
        .follow_up_email
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or(FOLLOW_UP_FALLBACK_BODY);
    Some(compose(
        to,
        &format!("Quick check: {} x UGC partnership", lead.name),
        body,
    ))
}

fn contact_email(lead: &Lead) -> Option<&str> {
    lead.contact_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
}
