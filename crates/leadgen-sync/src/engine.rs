//! Keeps the shared lead state consistent with the signed-in user's document.
//!
//! The model is last-writer-wins over the whole `leads` array: remote
//! changes replace the local collection wholesale, and every committed local
//! change pushes the full collection back as a merge-write.

use std::sync::Arc;
use std::time::Duration;

use leadgen_core::{Lead, LeadState};
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::document::{leads_document, leads_from_value, DocumentStore};
use crate::error::SyncError;
use crate::session::UserIdentity;

struct ActiveSession {
    uid: String,
    poller: Option<JoinHandle<()>>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

struct Inner {
    documents: Arc<dyn DocumentStore>,
    state: LeadState,
    poll_interval: Duration,
    session: Mutex<Option<ActiveSession>>,
}

/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<Inner>,
}

impl SyncEngine {
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        state: LeadState,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                documents,
                state,
                poll_interval,
                session: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> &LeadState {
        &self.inner.state
    }

    /// Bind to `user` and load their document once, without a live
    /// subscription. Later pushes go to this user.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the document cannot be fetched or its
    /// `leads` field cannot be decoded. The engine stays detached in that
    /// case so an empty local copy is never pushed over the remote one.
    pub async fn attach(&self, user: &UserIdentity) -> Result<(), SyncError> {
        self.begin(user, false).await
    }

    /// Bind to `user`, load their document, and keep polling it until
    /// [`SyncEngine::stop`] or the session ends.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the initial fetch fails.
    pub async fn start(&self, user: &UserIdentity) -> Result<(), SyncError> {
        self.begin(user, true).await
    }

    async fn begin(&self, user: &UserIdentity, live: bool) -> Result<(), SyncError> {
        let mut session = self.inner.session.lock().await;
        *session = None;

        let last = hydrate(&self.inner, &user.uid).await?;
        let poller = live.then(|| {
            tokio::spawn(poll_document(
                Arc::clone(&self.inner),
                user.uid.clone(),
                last,
            ))
        });

        tracing::info!(uid = %user.uid, live, "sync session started");
        *session = Some(ActiveSession {
            uid: user.uid.clone(),
            poller,
        });
        Ok(())
    }

    /// Tear down the live subscription. Local state is kept.
    pub async fn stop(&self) {
        if let Some(session) = self.inner.session.lock().await.take() {
            tracing::info!(uid = %session.uid, "sync session stopped");
        }
    }

    pub async fn is_active(&self) -> bool {
        self.inner.session.lock().await.is_some()
    }

    /// Push the whole collection to the bound user's document.
    ///
    /// Failures are logged and swallowed; local state stays authoritative for
    /// the rest of the session. Returns whether the write was accepted.
    pub async fn push(&self, leads: &[Lead]) -> bool {
        let Some(uid) = self
            .inner
            .session
            .lock()
            .await
            .as_ref()
            .map(|s| s.uid.clone())
        else {
            tracing::debug!("no active sync session, skipping push");
            return false;
        };

        let fields = match leads_document(leads) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "failed to encode leads for push");
                return false;
            }
        };

        match self.inner.documents.merge(&uid, fields).await {
            Ok(()) => {
                tracing::debug!(uid = %uid, count = leads.len(), "pushed leads");
                true
            }
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "push to remote document failed");
                false
            }
        }
    }

    /// Start and stop with the session: a signed-in user starts a live
    /// subscription, signing out tears it down.
    pub fn follow(&self, mut users: watch::Receiver<Option<UserIdentity>>) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            loop {
                let user = users.borrow_and_update().clone();
                match user {
                    Some(user) => {
                        if let Err(e) = engine.start(&user).await {
                            tracing::warn!(uid = %user.uid, error = %e, "failed to start sync");
                        }
                    }
                    None => engine.stop().await,
                }
                if users.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

/// Fetch the user's document and replace local state with its `leads`.
/// Returns the raw `leads` value seen, for change detection.
async fn hydrate(inner: &Inner, uid: &str) -> Result<Option<Value>, SyncError> {
    let Some(mut doc) = inner.documents.fetch(uid).await? else {
        tracing::debug!(uid, "no remote document yet");
        return Ok(None);
    };
    let Some(raw) = doc.remove("leads") else {
        return Ok(None);
    };
    let leads = leads_from_value(&raw)?;
    tracing::info!(uid, count = leads.len(), "hydrated leads from remote");
    inner.state.replace(leads);
    Ok(Some(raw))
}

async fn poll_document(inner: Arc<Inner>, uid: String, mut last: Option<Value>) {
    let mut ticker = tokio::time::interval(inner.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately and hydration already covered it.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let doc = match inner.documents.fetch(&uid).await {
            Ok(Some(doc)) => doc,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "subscription fetch failed");
                continue;
            }
        };
        let Some(raw) = doc.get("leads") else {
            continue;
        };
        if last.as_ref() == Some(raw) {
            continue;
        }
        match leads_from_value(raw) {
            Ok(leads) => {
                tracing::debug!(uid = %uid, count = leads.len(), "remote leads changed");
                inner.state.replace(leads);
            }
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "undecodable remote leads ignored");
            }
        }
        last = Some(raw.clone());
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
