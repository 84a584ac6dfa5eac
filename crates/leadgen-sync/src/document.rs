//! Per-user remote documents holding the lead collection.
//!
//! A document is a JSON object with at least a `leads` array. Writes are
//! merges: only the top-level fields supplied are replaced, everything else
//! in the stored document survives.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use leadgen_core::Lead;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::SyncError;

pub type UserDocument = Map<String, Value>;

/// Storage for one JSON document per user id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The user's document, or `None` if nothing has been written yet.
    async fn fetch(&self, uid: &str) -> Result<Option<UserDocument>, SyncError>;

    /// Overlay `fields` onto the user's document, creating it if absent.
    async fn merge(&self, uid: &str, fields: UserDocument) -> Result<(), SyncError>;
}

/// Build the merge payload for a full-collection push.
///
/// # Errors
///
/// Returns [`SyncError::Json`] if a lead fails to serialize.
pub fn leads_document(leads: &[Lead]) -> Result<UserDocument, SyncError> {
    let value = serde_json::to_value(leads).map_err(|e| SyncError::Json {
        context: "leads".to_string(),
        source: e,
    })?;
    let mut doc = UserDocument::new();
    doc.insert("leads".to_string(), value);
    Ok(doc)
}

/// Decode the `leads` field of a document.
///
/// # Errors
///
/// Returns [`SyncError::Json`] if the value is not an array of leads.
pub fn leads_from_value(value: &Value) -> Result<Vec<Lead>, SyncError> {
    Vec::<Lead>::deserialize(value).map_err(|e| SyncError::Json {
        context: "remote leads field".to_string(),
        source: e,
    })
}

fn validate_uid(uid: &str) -> Result<(), SyncError> {
    let ok = !uid.is_empty()
        && uid != "."
        && uid != ".."
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if ok {
        Ok(())
    } else {
        Err(SyncError::InvalidUserId(uid.to_string()))
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Documents stored as `<root>/users/<uid>.json`.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, uid: &str) -> Result<PathBuf, SyncError> {
        validate_uid(uid)?;
        Ok(self.root.join("users").join(format!("{uid}.json")))
    }

    async fn read(path: &Path, uid: &str) -> Result<Option<UserDocument>, SyncError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::io(path, e)),
        };
        let value: Value = serde_json::from_str(&content).map_err(|e| SyncError::Json {
            context: path.display().to_string(),
            source: e,
        })?;
        match value {
            Value::Object(doc) => Ok(Some(doc)),
            _ => Err(SyncError::NotAnObject(uid.to_string())),
        }
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn fetch(&self, uid: &str) -> Result<Option<UserDocument>, SyncError> {
        let path = self.path_for(uid)?;
        Self::read(&path, uid).await
    }

    async fn merge(&self, uid: &str, fields: UserDocument) -> Result<(), SyncError> {
        let path = self.path_for(uid)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| SyncError::io(dir, e))?;
        }

        let mut doc = Self::read(&path, uid).await?.unwrap_or_default();
        doc.extend(fields);

        let body = serde_json::to_vec_pretty(&doc).map_err(|e| SyncError::Json {
            context: path.display().to_string(),
            source: e,
        })?;

        // Readers never observe a half-written document.
        static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}-{seq}.tmp", std::process::id()));
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| SyncError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| SyncError::io(&path, e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HTTP-backed store
// ---------------------------------------------------------------------------

/// Documents served by a small REST service:
/// `GET {base}/users/{uid}` and `PATCH {base}/users/{uid}` with merge semantics.
pub struct HttpDocumentStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpDocumentStore {
    /// # Errors
    ///
    /// Returns [`SyncError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SyncError::InvalidBaseUrl`] if `base_url` cannot carry a path.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("leadgen/0.1 (document-sync)")
            .build()?;

        let invalid = |reason: String| SyncError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_string()));
        }

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn user_url(&self, uid: &str) -> Result<Url, SyncError> {
        validate_uid(uid)?;
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SyncError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push("users")
            .push(uid);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn fetch(&self, uid: &str) -> Result<Option<UserDocument>, SyncError> {
        let url = self.user_url(uid)?;
        let response = self.authorize(self.client.get(url.clone())).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus {
                status: status.as_u16(),
                context: format!("GET {url}"),
            });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|e| SyncError::Json {
            context: url.to_string(),
            source: e,
        })?;
        match value {
            Value::Object(doc) => Ok(Some(doc)),
            _ => Err(SyncError::NotAnObject(uid.to_string())),
        }
    }

    async fn merge(&self, uid: &str, fields: UserDocument) -> Result<(), SyncError> {
        let url = self.user_url(uid)?;
        let response = self
            .authorize(self.client.patch(url.clone()))
            .json(&fields)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus {
                status: status.as_u16(),
                context: format!("PATCH {url}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("leadgen-doc-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn uid_validation() {
        assert!(validate_uid("user-123").is_ok());
        assert!(validate_uid("sam@example.com").is_ok());
        assert!(validate_uid("").is_err());
        assert!(validate_uid("..").is_err());
        assert!(validate_uid("a/b").is_err());
    }

    #[test]
    fn user_url_appends_segments() {
        let store = HttpDocumentStore::new("http://localhost:8080/api", None, 5).unwrap();
        assert_eq!(
            store.user_url("user-1").unwrap().as_str(),
            "http://localhost:8080/api/users/user-1"
        );
    }

    #[test]
    fn leads_document_wraps_array() {
        let doc = leads_document(&[]).unwrap();
        assert_eq!(doc.get("leads"), Some(&Value::Array(Vec::new())));
    }

    #[test]
    fn malformed_leads_value_is_an_error() {
        let err = leads_from_value(&serde_json::json!({"not": "an array"})).unwrap_err();
        assert!(matches!(err, SyncError::Json { .. }));
        assert!(leads_from_value(&serde_json::json!([{"name": 42}])).is_err());
        assert!(leads_from_value(&serde_json::json!([])).unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_missing_document_is_none() {
        let store = FileDocumentStore::new(temp_root());
        assert!(store.fetch("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_merge_preserves_other_fields() {
        let root = temp_root();
        let store = FileDocumentStore::new(&root);

        let mut first = UserDocument::new();
        first.insert("displayName".into(), Value::String("Sam".into()));
        first.insert("leads".into(), serde_json::json!([]));
        store.merge("user-1", first).await.unwrap();

        let mut second = UserDocument::new();
        second.insert("leads".into(), serde_json::json!([{"placeholder": true}]));
        store.merge("user-1", second).await.unwrap();

        let doc = store.fetch("user-1").await.unwrap().unwrap();
        assert_eq!(doc["displayName"], "Sam");
        assert_eq!(doc["leads"], serde_json::json!([{"placeholder": true}]));
        let leftovers = std::fs::read_dir(root.join("users"))
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .is_ok_and(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            })
            .count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn file_store_rejects_non_object_document() {
        let root = temp_root();
        std::fs::create_dir_all(root.join("users")).unwrap();
        std::fs::write(root.join("users").join("u.json"), "[1, 2, 3]").unwrap();

        let store = FileDocumentStore::new(&root);
        let err = store.fetch("u").await.unwrap_err();
        assert!(matches!(err, SyncError::NotAnObject(_)));

        let _ = std::fs::remove_dir_all(root);
    }
}
