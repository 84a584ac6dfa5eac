//! Who is signed in, and notification when that changes.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Authentication boundary that gates remote sync.
pub trait SessionGate: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;

    /// Receiver that is woken whenever the signed-in user changes.
    fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>>;

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the session change cannot be persisted.
    fn sign_out(&self) -> Result<(), SyncError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    #[serde(default)]
    user: Option<UserIdentity>,
    #[serde(default)]
    selected_lead_id: Option<String>,
}

/// Session persisted to `<data_dir>/session.json`.
///
/// Besides the identity it remembers the selected lead so that a command
/// line session can `select` once and act on that lead afterwards.
#[derive(Debug)]
pub struct LocalSessionGate {
    path: PathBuf,
    user: watch::Sender<Option<UserIdentity>>,
    selected: Mutex<Option<String>>,
}

impl LocalSessionGate {
    /// Load the session file, or start signed out when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`] or [`SyncError::Json`] if an existing
    /// session file cannot be read or parsed.
    pub fn open(data_dir: &Path) -> Result<Self, SyncError> {
        let path = data_dir.join("session.json");
        let file = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| SyncError::Json {
                context: path.display().to_string(),
                source: e,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionFile::default(),
            Err(e) => return Err(SyncError::io(&path, e)),
        };

        let (user, _rx) = watch::channel(file.user);
        Ok(Self {
            path,
            user,
            selected: Mutex::new(file.selected_lead_id),
        })
    }

    /// Sign in as `identity`, replacing any previous user.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the session file cannot be written.
    pub fn sign_in(&self, identity: UserIdentity) -> Result<(), SyncError> {
        tracing::info!(uid = %identity.uid, "signed in");
        self.user.send_replace(Some(identity));
        self.persist()
    }

    #[must_use]
    pub fn selected_lead(&self) -> Option<String> {
        self.selected
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// # Errors
    ///
    /// Returns [`SyncError`] if the session file cannot be written.
    pub fn set_selected_lead(&self, id: Option<String>) -> Result<(), SyncError> {
        *self
            .selected
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = id;
        self.persist()
    }

    fn persist(&self) -> Result<(), SyncError> {
        let file = SessionFile {
            user: self.user.borrow().clone(),
            selected_lead_id: self.selected_lead(),
        };
        let body = serde_json::to_vec_pretty(&file).map_err(|e| SyncError::Json {
            context: self.path.display().to_string(),
            source: e,
        })?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))?;
        }
        std::fs::write(&self.path, body).map_err(|e| SyncError::io(&self.path, e))
    }
}

impl SessionGate for LocalSessionGate {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.user.subscribe()
    }

    fn sign_out(&self) -> Result<(), SyncError> {
        if let Some(user) = self.user.send_replace(None) {
            tracing::info!(uid = %user.uid, "signed out");
        }
        *self
            .selected
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        self.persist()
    }
}
