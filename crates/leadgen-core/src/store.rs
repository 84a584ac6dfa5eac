//! The canonical lead collection.
//!
//! A [`LeadStore`] is a snapshot: every mutation builds a fresh collection
//! and swaps it in, so anyone still holding the previous snapshot sees it
//! unchanged. Collection order is most-recently-ingested first.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::lead::{
    DraftKind, FollowUpLog, Lead, LeadCandidate, LeadOrigin, LeadStatus, TargetType,
};
use crate::lifecycle::{transition, LeadEvent};
use crate::normalize::{normalize_name, normalize_url};
use crate::CoreError;

/// Lifecycle grouping used to partition leads for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bucket {
    #[default]
    Active,
    Contacted,
    FollowUp,
    Archive,
}

impl Bucket {
    /// Whether `lead` belongs to this bucket.
    #[must_use]
    pub fn contains(self, lead: &Lead) -> bool {
        match self {
            Bucket::Active => !lead.is_archived && lead.status != LeadStatus::Contacted,
            Bucket::Contacted => !lead.is_archived && lead.status == LeadStatus::Contacted,
            Bucket::FollowUp => {
                Bucket::Contacted.contains(lead) && lead.follow_up_asset_url.is_some()
            }
            Bucket::Archive => lead.is_archived,
        }
    }

    /// The one bucket among active / contacted / archive that holds `lead`.
    #[must_use]
    pub fn home_of(lead: &Lead) -> Self {
        if lead.is_archived {
            Bucket::Archive
        } else if lead.status == LeadStatus::Contacted {
            Bucket::Contacted
        } else {
            Bucket::Active
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bucket::Active => write!(f, "active"),
            Bucket::Contacted => write!(f, "contacted"),
            Bucket::FollowUp => write!(f, "followup"),
            Bucket::Archive => write!(f, "archive"),
        }
    }
}

impl std::str::FromStr for Bucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" | "discovery" => Ok(Bucket::Active),
            "contacted" | "history" => Ok(Bucket::Contacted),
            "followup" | "follow-up" => Ok(Bucket::FollowUp),
            "archive" | "archived" => Ok(Bucket::Archive),
            _ => Err(CoreError::InvalidValue {
                kind: "bucket",
                value: s.to_string(),
            }),
        }
    }
}

/// Target-type restriction applied on top of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetFilter {
    #[default]
    All,
    B2b,
    D2c,
}

impl TargetFilter {
    #[must_use]
    pub fn matches(self, lead: &Lead) -> bool {
        match self {
            TargetFilter::All => true,
            TargetFilter::B2b => lead.target_type == Some(TargetType::B2b),
            TargetFilter::D2c => lead.target_type == Some(TargetType::D2c),
        }
    }
}

impl std::fmt::Display for TargetFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetFilter::All => write!(f, "ALL"),
            TargetFilter::B2b => write!(f, "B2B"),
            TargetFilter::D2c => write!(f, "D2C"),
        }
    }
}

impl std::str::FromStr for TargetFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Ok(TargetFilter::All),
            "B2B" => Ok(TargetFilter::B2b),
            "D2C" => Ok(TargetFilter::D2c),
            _ => Err(CoreError::InvalidValue {
                kind: "target filter",
                value: s.to_string(),
            }),
        }
    }
}

/// Result of a single-brand lookup ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The brand was already tracked; nothing changed. `bucket` is where the
    /// existing lead lives so the caller can navigate to it.
    Existing { lead: Lead, bucket: Bucket },
    /// A new lead was created and prepended.
    Created(Lead),
}

impl LookupOutcome {
    #[must_use]
    pub fn lead(&self) -> &Lead {
        match self {
            LookupOutcome::Existing { lead, .. } | LookupOutcome::Created(lead) => lead,
        }
    }
}

/// Dedup keys already present in a collection.
///
/// Empty keys are never recorded, so two leads without a website (or
/// without a name) never match each other on that key.
#[derive(Debug, Default)]
struct DedupIndex {
    names: HashSet<String>,
    urls: HashSet<String>,
}

impl DedupIndex {
    fn from_leads(leads: &[Lead]) -> Self {
        let mut index = Self::default();
        for lead in leads {
            index.insert(&lead.name, &lead.website);
        }
        index
    }

    fn insert(&mut self, name: &str, website: &str) {
        let name_key = normalize_name(name);
        if !name_key.is_empty() {
            self.names.insert(name_key);
        }
        let url_key = normalize_url(website);
        if !url_key.is_empty() {
            self.urls.insert(url_key);
        }
    }

    fn contains(&self, name: &str, website: &str) -> bool {
        let name_key = normalize_name(name);
        let url_key = normalize_url(website);
        (!name_key.is_empty() && self.names.contains(&name_key))
            || (!url_key.is_empty() && self.urls.contains(&url_key))
    }
}

/// In-memory lead collection plus its derived views.
#[derive(Debug, Clone, Default)]
pub struct LeadStore {
    leads: Arc<Vec<Lead>>,
}

impl LeadStore {
    #[must_use]
    pub fn new(leads: Vec<Lead>) -> Self {
        Self {
            leads: Arc::new(leads),
        }
    }

    #[must_use]
    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    /// Shared handle to the current snapshot. Two calls return pointer-equal
    /// handles until the next mutation.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Lead>> {
        Arc::clone(&self.leads)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.leads.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    /// First lead whose name key or non-empty URL key matches.
    #[must_use]
    pub fn find_duplicate(&self, name: &str, website: &str) -> Option<&Lead> {
        let name_key = normalize_name(name);
        let url_key = normalize_url(website);
        self.leads.iter().find(|l| {
            (!name_key.is_empty() && normalize_name(&l.name) == name_key)
                || (!url_key.is_empty() && normalize_url(&l.website) == url_key)
        })
    }

    /// Replace the whole collection, e.g. with a remote document's value.
    pub fn replace(&mut self, leads: Vec<Lead>) {
        self.leads = Arc::new(leads);
    }

    /// Ingest a discovery batch, dropping every candidate whose name or URL
    /// already exists anywhere in the collection (archived leads included)
    /// or earlier in the same batch. Inactive candidates are dropped too.
    ///
    /// Accepted leads get fresh ids, status `new`, and are prepended in batch
    /// order. Returns the accepted leads.
    pub fn ingest_discovery_batch(&mut self, candidates: Vec<LeadCandidate>) -> Vec<Lead> {
        let mut index = DedupIndex::from_leads(&self.leads);
        let mut accepted = Vec::new();

        for candidate in candidates {
            if !candidate.is_active {
                tracing::debug!(name = %candidate.name, "dropping inactive candidate");
                continue;
            }
            if index.contains(&candidate.name, &candidate.website) {
                tracing::debug!(
                    name = %candidate.name,
                    website = %candidate.website,
                    "dropping duplicate candidate"
                );
                continue;
            }
            index.insert(&candidate.name, &candidate.website);
            accepted.push(Lead::from_candidate(candidate, LeadOrigin::Discovery));
        }

        if !accepted.is_empty() {
            let mut next = Vec::with_capacity(accepted.len() + self.leads.len());
            next.extend(accepted.iter().cloned());
            next.extend(self.leads.iter().cloned());
            self.leads = Arc::new(next);
        }

        accepted
    }

    /// Ingest a single looked-up brand.
    ///
    /// If the brand is already tracked the existing lead is returned and the
    /// collection is left untouched.
    pub fn ingest_single_lookup(&mut self, candidate: LeadCandidate) -> LookupOutcome {
        if let Some(existing) = self.find_duplicate(&candidate.name, &candidate.website) {
            return LookupOutcome::Existing {
                bucket: Bucket::home_of(existing),
                lead: existing.clone(),
            };
        }

        let lead = Lead::from_candidate(candidate, LeadOrigin::Lookup);
        let mut next = Vec::with_capacity(self.leads.len() + 1);
        next.push(lead.clone());
        next.extend(self.leads.iter().cloned());
        self.leads = Arc::new(next);
        LookupOutcome::Created(lead)
    }

    /// Leads in `bucket` matching `filter`, in collection order.
    #[must_use]
    pub fn derive_view(&self, bucket: Bucket, filter: TargetFilter) -> Vec<&Lead> {
        self.leads
            .iter()
            .filter(|l| bucket.contains(l) && filter.matches(l))
            .collect()
    }

    /// Lead counts for the navigation tabs, unfiltered by target type.
    #[must_use]
    pub fn bucket_counts(&self) -> BucketCounts {
        let mut counts = BucketCounts::default();
        for lead in self.leads.iter() {
            match Bucket::home_of(lead) {
                Bucket::Active => counts.active += 1,
                Bucket::Contacted => counts.contacted += 1,
                Bucket::Archive | Bucket::FollowUp => counts.archived += 1,
            }
            if Bucket::FollowUp.contains(lead) {
                counts.follow_up += 1;
            }
        }
        counts
    }

    /// Apply a lifecycle event to one lead.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LeadNotFound`] for an unknown id, or
    /// [`CoreError::Transition`] when the event is invalid for the lead's
    /// status. The collection is unchanged on error.
    pub fn apply(&mut self, id: &str, event: LeadEvent) -> Result<&Lead, CoreError> {
        self.update(id, |lead| transition(lead, event))
    }

    /// Start investigating every active `new` lead in one step.
    ///
    /// Returns the leads now in `investigating`; an empty result means there
    /// was nothing to investigate and the collection is unchanged.
    pub fn begin_bulk_investigation(&mut self) -> Vec<Lead> {
        let targets: Vec<String> = self
            .leads
            .iter()
            .filter(|l| Bucket::Active.contains(l) && l.status == LeadStatus::New)
            .map(|l| l.id.clone())
            .collect();
        if targets.is_empty() {
            return Vec::new();
        }

        let mut started = Vec::with_capacity(targets.len());
        let next: Vec<Lead> = self
            .leads
            .iter()
            .map(|lead| {
                if targets.contains(&lead.id) {
                    if let Ok(moved) = transition(lead, LeadEvent::InvestigateRequested) {
                        started.push(moved.clone());
                        return moved;
                    }
                }
                lead.clone()
            })
            .collect();
        self.leads = Arc::new(next);
        started
    }

    /// Merge independently computed per-lead events into the collection in
    /// one swap, matching by id against the current snapshot.
    ///
    /// Each event succeeds or fails on its own; failures are returned and do
    /// not block the others.
    pub fn apply_batch(&mut self, events: Vec<(String, LeadEvent)>) -> Vec<CoreError> {
        let mut next: Vec<Lead> = self.leads.as_ref().clone();
        let mut errors = Vec::new();
        for (id, event) in events {
            match next.iter_mut().find(|l| l.id == id) {
                Some(slot) => match transition(slot, event) {
                    Ok(updated) => *slot = updated,
                    Err(e) => errors.push(e),
                },
                None => errors.push(CoreError::LeadNotFound(id)),
            }
        }
        self.leads = Arc::new(next);
        errors
    }

    /// Replace a draft email's text. Allowed in every status.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LeadNotFound`] for an unknown id.
    pub fn set_draft(
        &mut self,
        id: &str,
        kind: DraftKind,
        text: String,
    ) -> Result<&Lead, CoreError> {
        self.update(id, |lead| {
            let mut next = lead.clone();
            match kind {
                DraftKind::Initial => next.generated_email = Some(text),
                DraftKind::FollowUp => next.follow_up_email = Some(text),
            }
            Ok(next)
        })
    }

    /// Toggle the follow-up asset: selecting the currently set URL clears
    /// it, any other URL replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LeadNotFound`] for an unknown id.
    pub fn toggle_follow_up_asset(&mut self, id: &str, url: &str) -> Result<&Lead, CoreError> {
        self.update(id, |lead| {
            let mut next = lead.clone();
            next.follow_up_asset_url = if lead.follow_up_asset_url.as_deref() == Some(url) {
                None
            } else {
                Some(url.to_string())
            };
            Ok(next)
        })
    }

    /// Record a follow-up touch on a lead.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LeadNotFound`] for an unknown id.
    pub fn log_follow_up(&mut self, id: &str, log: FollowUpLog) -> Result<&Lead, CoreError> {
        self.update(id, |lead| {
            let mut next = lead.clone();
            next.follow_up_logs.push(log);
            Ok(next)
        })
    }

    /// Mark a ready lead as contacted at `at`.
    ///
    /// # Errors
    ///
    /// See [`LeadStore::apply`].
    pub fn mark_contacted(&mut self, id: &str, at: DateTime<Utc>) -> Result<&Lead, CoreError> {
        self.apply(id, LeadEvent::InitialEmailSent { at })
    }

    fn update<F>(&mut self, id: &str, f: F) -> Result<&Lead, CoreError>
    where
        F: FnOnce(&Lead) -> Result<Lead, CoreError>,
    {
        let idx = self
            .leads
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| CoreError::LeadNotFound(id.to_string()))?;
        let updated = f(&self.leads[idx])?;

        let mut next: Vec<Lead> = self.leads.as_ref().clone();
        next[idx] = updated;
        self.leads = Arc::new(next);
        Ok(&self.leads[idx])
    }
}

/// Per-bucket lead counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub active: usize,
    pub contacted: usize,
    pub follow_up: usize,
    pub archived: usize,
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
