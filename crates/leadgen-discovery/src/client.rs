use async_trait::async_trait;
use leadgen_core::{BrandSearchPreference, ContactInfo, DraftKind, Lead, LeadCandidate};

use crate::error::DiscoveryError;

/// Candidates found by a discovery search, plus the backend's opaque
/// grounding sources.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    pub leads: Vec<LeadCandidate>,
    pub sources: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct LookupResult {
    pub lead: Option<LeadCandidate>,
    pub sources: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ContactResult {
    pub contact: ContactInfo,
    pub sources: Vec<serde_json::Value>,
}

/// A generative search backend that finds brands, contacts, and drafts
/// outreach copy.
///
/// Implementations must degrade gracefully on output they cannot parse:
/// an empty `leads` list, a `None` lookup, a placeholder contact, or a
/// fallback draft. `Err` is reserved for transport failures.
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Search for brands matching `query`. Inactive candidates are already
    /// filtered out of the result.
    async fn discover(
        &self,
        query: &str,
        pref: &BrandSearchPreference,
    ) -> Result<DiscoveryResult, DiscoveryError>;

    /// Fetch details for one named brand.
    async fn lookup(&self, brand_name: &str) -> Result<LookupResult, DiscoveryError>;

    /// Find a decision maker's name and email for a brand.
    async fn find_contact(
        &self,
        brand_name: &str,
        website: &str,
    ) -> Result<ContactResult, DiscoveryError>;

    /// Draft a plain-text email body (no subject line) for `lead`.
    async fn draft_email(
        &self,
        lead: &Lead,
        sender_name: &str,
        kind: DraftKind,
    ) -> Result<String, DiscoveryError>;
}
