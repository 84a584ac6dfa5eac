//! Controller behind every user-facing action.
//!
//! Each action follows the same shape: call the discovery backend if needed,
//! commit the resulting change to [`LeadState`] against its latest snapshot,
//! then push the whole collection through the [`SyncEngine`]. Action failures
//! are logged and leave the collection as it was.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use leadgen_core::{
    BrandSearchPreference, CoreError, DraftKind, FollowUpKind, FollowUpLog, Lead, LeadEvent,
    LeadState, LeadStatus, LeadStore, LookupOutcome,
};
use leadgen_discovery::DiscoveryClient;
use leadgen_sync::SyncEngine;

use crate::mailto;

/// What a bulk investigation did.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BulkOutcome {
    pub started: usize,
    pub ready: Vec<String>,
    pub reverted: Vec<String>,
}

pub(crate) struct Dashboard {
    sync: SyncEngine,
    discovery: Option<Arc<dyn DiscoveryClient>>,
    selected: Option<String>,
}

impl Dashboard {
    pub(crate) fn new(sync: SyncEngine, discovery: Option<Arc<dyn DiscoveryClient>>) -> Self {
        Self {
            sync,
            discovery,
            selected: None,
        }
    }

    pub(crate) fn state(&self) -> &LeadState {
        self.sync.state()
    }

    pub(crate) fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select `id` if it names a lead; clears the selection for `None`.
    pub(crate) fn select(&mut self, id: Option<String>) -> bool {
        match id {
            Some(id) if self.state().snapshot().get(&id).is_none() => {
                tracing::warn!(lead_id = %id, "cannot select unknown lead");
                false
            }
            other => {
                self.selected = other;
                true
            }
        }
    }

    fn discovery(&self) -> anyhow::Result<&Arc<dyn DiscoveryClient>> {
        self.discovery
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY is not set"))
    }

    /// Apply `f` to the latest store; push on success, log on failure.
    async fn commit<T, F>(&self, action: &'static str, f: F) -> Option<T>
    where
        F: FnOnce(&mut LeadStore) -> Result<T, CoreError>,
    {
        let (result, store) = self.state().mutate(f);
        match result {
            Ok(value) => {
                self.sync.push(store.leads()).await;
                Some(value)
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "action left leads unchanged");
                None
            }
        }
    }

    /// Run a discovery search and merge new, unique brands into the front of
    /// the collection. Returns the leads actually added.
    ///
    /// # Errors
    ///
    /// Returns an error only when no discovery backend is configured.
    pub(crate) async fn discover(
        &self,
        query: &str,
        pref: &BrandSearchPreference,
    ) -> anyhow::Result<Vec<Lead>> {
        let client = self.discovery()?;
        let result = match client.discover(query, pref).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(query, error = %e, "discovery failed");
                return Ok(Vec::new());
            }
        };

        let received = result.leads.len();
        let (accepted, store) = self
            .state()
            .mutate(|store| store.ingest_discovery_batch(result.leads));
        tracing::info!(query, received, accepted = accepted.len(), "discovery merged");
        if !accepted.is_empty() {
            self.sync.push(store.leads()).await;
        }
        Ok(accepted)
    }

    /// Look up one named brand. An already tracked brand is selected and
    /// reported with its bucket; a new one is added and selected.
    ///
    /// # Errors
    ///
    /// Returns an error only when no discovery backend is configured.
    pub(crate) async fn lookup(
        &mut self,
        brand_name: &str,
    ) -> anyhow::Result<Option<LookupOutcome>> {
        let client = self.discovery()?;
        let candidate = match client.lookup(brand_name).await {
            Ok(result) => result.lead,
            Err(e) => {
                tracing::warn!(brand_name, error = %e, "lookup failed");
                return Ok(None);
            }
        };
        let Some(candidate) = candidate else {
            return Ok(None);
        };

        let (outcome, store) = self
            .state()
            .mutate(|store| store.ingest_single_lookup(candidate));
        if matches!(outcome, LookupOutcome::Created(_)) {
            self.sync.push(store.leads()).await;
        }
        self.selected = Some(outcome.lead().id.clone());
        Ok(Some(outcome))
    }

    /// Find the decision maker for one lead.
    ///
    /// The lead shows `investigating` while the call is in flight and ends
    /// in `ready` on success or back in `new` on failure.
    ///
    /// # Errors
    ///
    /// Returns an error only when no discovery backend is configured.
    pub(crate) async fn investigate(&self, id: &str) -> anyhow::Result<Option<Lead>> {
        let client = self.discovery()?;
        let Some(lead) = self
            .commit("investigate", |store| {
                store.apply(id, LeadEvent::InvestigateRequested).cloned()
            })
            .await
        else {
            return Ok(None);
        };

        let event = contact_event(&**client, &lead).await;
        Ok(self
            .commit("investigate", |store| store.apply(id, event).cloned())
            .await)
    }

    /// Investigate every active `new` lead concurrently.
    ///
    /// All leads move to `investigating` in one step. Contact lookups then
    /// run in parallel and their results are merged by id in a single
    /// commit, so one failure never affects the others.
    ///
    /// # Errors
    ///
    /// Returns an error only when no discovery backend is configured.
    pub(crate) async fn investigate_all(&self) -> anyhow::Result<BulkOutcome> {
        let client = self.discovery()?;
        let (started, store) = self.state().mutate(LeadStore::begin_bulk_investigation);
        if started.is_empty() {
            tracing::info!("no new leads to investigate");
            return Ok(BulkOutcome::default());
        }
        self.sync.push(store.leads()).await;

        let events = join_all(started.iter().map(|lead| async move {
            (lead.id.clone(), contact_event(&**client, lead).await)
        }))
        .await;

        let mut outcome = BulkOutcome {
            started: started.len(),
            ..BulkOutcome::default()
        };
        for (id, event) in &events {
            match event {
                LeadEvent::InvestigationSucceeded(_) => outcome.ready.push(id.clone()),
                _ => outcome.reverted.push(id.clone()),
            }
        }

        let (errors, store) = self.state().mutate(|store| store.apply_batch(events));
        for e in &errors {
            tracing::warn!(error = %e, "bulk investigation result not applied");
        }
        self.sync.push(store.leads()).await;
        Ok(outcome)
    }

    /// Archive a lead; clears the selection if it was the archived one.
    pub(crate) async fn archive(&mut self, id: &str) -> Option<Lead> {
        let lead = self
            .commit("archive", |store| store.apply(id, LeadEvent::Archive).cloned())
            .await?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Some(lead)
    }

    pub(crate) async fn unarchive(&self, id: &str) -> Option<Lead> {
        self.commit("unarchive", |store| {
            store.apply(id, LeadEvent::Unarchive).cloned()
        })
        .await
    }

    pub(crate) async fn toggle_asset(&self, id: &str, url: &str) -> Option<Lead> {
        self.commit("toggle_asset", |store| {
            store.toggle_follow_up_asset(id, url).cloned()
        })
        .await
    }

    /// Generate and store a draft email for a lead.
    ///
    /// # Errors
    ///
    /// Returns an error only when no discovery backend is configured.
    pub(crate) async fn draft(
        &self,
        id: &str,
        kind: DraftKind,
        sender_name: &str,
    ) -> anyhow::Result<Option<String>> {
        let client = self.discovery()?;
        let Some(lead) = self.state().snapshot().get(id).cloned() else {
            tracing::warn!(lead_id = %id, "cannot draft for unknown lead");
            return Ok(None);
        };

        let text = match client.draft_email(&lead, sender_name, kind).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(lead_id = %id, error = %e, "email drafting failed");
                return Ok(None);
            }
        };

        Ok(self
            .commit("draft", |store| store.set_draft(id, kind, text.clone()).map(|_| ()))
            .await
            .map(|()| text))
    }

    pub(crate) async fn edit_draft(&self, id: &str, kind: DraftKind, text: String) -> Option<Lead> {
        self.commit("edit_draft", |store| store.set_draft(id, kind, text).cloned())
            .await
    }

    /// Build the initial outreach link and mark the lead contacted.
    ///
    /// A lead that was already contacted keeps its original `contactedAt`.
    pub(crate) async fn send_initial(&self, id: &str, at: DateTime<Utc>) -> Option<String> {
        let lead = self.lead_with_contact(id)?;
        let link = mailto::initial_email_link(&lead)?;
        match lead.status {
            LeadStatus::Contacted => Some(link),
            _ => {
                self.commit("send_initial", |store| store.mark_contacted(id, at).map(|_| ()))
                    .await?;
                Some(link)
            }
        }
    }

    /// Build a follow-up link and record the touch. Status is unchanged.
    pub(crate) async fn send_follow_up(
        &self,
        id: &str,
        kind: FollowUpKind,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> Option<String> {
        let lead = self.lead_with_contact(id)?;
        let link = mailto::follow_up_link(&lead)?;
        let log = FollowUpLog {
            date: at,
            kind,
            note,
        };
        self.commit("send_follow_up", |store| {
            store.log_follow_up(id, log).map(|_| ())
        })
        .await?;
        Some(link)
    }

    fn lead_with_contact(&self, id: &str) -> Option<Lead> {
        let Some(lead) = self.state().snapshot().get(id).cloned() else {
            tracing::warn!(lead_id = %id, "unknown lead");
            return None;
        };
        if lead.contact_email.as_deref().is_none_or(|e| e.trim().is_empty()) {
            tracing::warn!(lead_id = %id, "lead has no contact email; investigate it first");
            return None;
        }
        Some(lead)
    }
}

async fn contact_event(client: &dyn DiscoveryClient, lead: &Lead) -> LeadEvent {
    match client.find_contact(&lead.name, &lead.website).await {
        Ok(result) => {
            tracing::info!(lead_id = %lead.id, email = %result.contact.email, "contact found");
            LeadEvent::InvestigationSucceeded(result.contact)
        }
        Err(e) => {
            tracing::warn!(lead_id = %lead.id, error = %e, "investigation failed");
            LeadEvent::InvestigationFailed
        }
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
