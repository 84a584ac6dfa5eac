use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// Outreach lifecycle status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Investigating,
    Ready,
    Contacted,
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadStatus::New => write!(f, "new"),
            LeadStatus::Investigating => write!(f, "investigating"),
            LeadStatus::Ready => write!(f, "ready"),
            LeadStatus::Contacted => write!(f, "contacted"),
        }
    }
}

/// Business model classification of a brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    #[serde(rename = "B2B")]
    B2b,
    #[serde(rename = "D2C")]
    D2c,
}

impl TargetType {
    /// Case-insensitive parse that tolerates the loose labels generative
    /// backends tend to emit (`b2b`, `D2C`, `DTC`, `B2C`).
    #[must_use]
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "B2B" => Some(TargetType::B2b),
            "D2C" | "DTC" | "B2C" => Some(TargetType::D2c),
            _ => None,
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::B2b => write!(f, "B2B"),
            TargetType::D2c => write!(f, "D2C"),
        }
    }
}

/// Target-type constraint for a discovery search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetPreference {
    #[serde(rename = "B2B")]
    B2b,
    #[serde(rename = "D2C")]
    D2c,
    #[default]
    Both,
}

impl std::fmt::Display for TargetPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetPreference::B2b => write!(f, "B2B"),
            TargetPreference::D2c => write!(f, "D2C"),
            TargetPreference::Both => write!(f, "Both"),
        }
    }
}

/// Per-call discovery input. Not persisted; its effect lives on in the leads
/// it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandSearchPreference {
    pub target_type: TargetPreference,
    pub niche: String,
}

/// A raw brand candidate as returned by the discovery backend.
///
/// Deserialization is deliberately lenient: `null` strings become empty,
/// unknown target types become `None`, and a missing `isActive` counts as
/// active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCandidate {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tagline: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub website: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub industry: String,
    #[serde(default, deserialize_with = "loose_target_type")]
    pub target_type: Option<TargetType>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_url: String,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_ph_verified: bool,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
}

/// Contact details discovered for a brand's decision maker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub source: String,
}

/// Medium of a follow-up touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpKind {
    Email,
    Video,
    Mixed,
}

/// One recorded follow-up touch on a contacted lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpLog {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: FollowUpKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// How a lead entered the collection. Determines its id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadOrigin {
    Discovery,
    Lookup,
}

impl LeadOrigin {
    /// Generate a fresh, never-reused lead id for this origin.
    #[must_use]
    pub fn new_id(self) -> String {
        let prefix = match self {
            LeadOrigin::Discovery => "lead",
            LeadOrigin::Lookup => "manual",
        };
        format!("{prefix}-{}", Uuid::new_v4())
    }
}

/// A tracked candidate company and its outreach state.
///
/// Field names serialize in camelCase so the persisted document stays
/// readable by the browser dashboard that shares it. Decoding is as lenient
/// as for [`LeadCandidate`], since that dashboard stores raw model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tagline: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub website: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub industry: String,
    #[serde(
        default,
        deserialize_with = "loose_target_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_type: Option<TargetType>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_url: String,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_ph_verified: bool,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_asset_url: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacted_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_archived: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub follow_up_logs: Vec<FollowUpLog>,
}

impl Lead {
    /// Build a fresh `new` lead from a candidate.
    #[must_use]
    pub fn from_candidate(candidate: LeadCandidate, origin: LeadOrigin) -> Self {
        Self {
            id: origin.new_id(),
            name: candidate.name,
            tagline: candidate.tagline,
            website: candidate.website,
            description: candidate.description,
            industry: candidate.industry,
            target_type: candidate.target_type,
            source_url: candidate.source_url,
            is_ph_verified: candidate.is_ph_verified,
            is_active: candidate.is_active,
            contact_name: None,
            contact_name_source: None,
            contact_email: None,
            generated_email: None,
            follow_up_email: None,
            follow_up_asset_url: None,
            status: LeadStatus::New,
            contacted_at: None,
            is_archived: false,
            follow_up_logs: Vec::new(),
        }
    }
}

/// Which email draft on a lead an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    Initial,
    FollowUp,
}

impl std::str::FromStr for DraftKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(DraftKind::Initial),
            "follow-up" | "followup" => Ok(DraftKind::FollowUp),
            other => Err(CoreError::InvalidValue {
                kind: "draft kind",
                value: other.to_string(),
            }),
        }
    }
}

fn default_true() -> bool {
    true
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn loose_target_type<'de, D>(deserializer: D) -> Result<Option<TargetType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .as_deref()
        .and_then(TargetType::parse_loose))
}
