use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use leadgen_core::{LeadCandidate, LeadOrigin, LeadStore};

use super::*;
use crate::document::UserDocument;

#[derive(Default)]
struct MemoryStore {
    docs: StdMutex<HashMap<String, UserDocument>>,
    fail_merge: bool,
    fail_fetch: bool,
}

impl MemoryStore {
    fn with_leads(uid: &str, leads: &[Lead]) -> Self {
        let store = Self::default();
        store.put_leads(uid, leads);
        store
    }

    fn put_leads(&self, uid: &str, leads: &[Lead]) {
        let mut docs = self.docs.lock().unwrap();
        let doc = docs.entry(uid.to_string()).or_default();
        doc.extend(leads_document(leads).unwrap());
    }

    fn doc(&self, uid: &str) -> Option<UserDocument> {
        self.docs.lock().unwrap().get(uid).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, uid: &str) -> Result<Option<UserDocument>, SyncError> {
        if self.fail_fetch {
            return Err(SyncError::UnexpectedStatus {
                status: 500,
                context: "fetch".into(),
            });
        }
        Ok(self.doc(uid))
    }

    async fn merge(&self, uid: &str, fields: UserDocument) -> Result<(), SyncError> {
        if self.fail_merge {
            return Err(SyncError::UnexpectedStatus {
                status: 403,
                context: "merge".into(),
            });
        }
        self.docs
            .lock()
            .unwrap()
            .entry(uid.to_string())
            .or_default()
            .extend(fields);
        Ok(())
    }
}

fn lead(name: &str) -> Lead {
    Lead::from_candidate(candidate(name), LeadOrigin::Discovery)
}

fn candidate(name: &str) -> LeadCandidate {
    LeadCandidate {
        name: name.to_owned(),
        tagline: String::new(),
        website: format!("{}.com", name.to_lowercase()),
        description: String::new(),
        industry: String::new(),
        target_type: None,
        source_url: String::new(),
        is_ph_verified: false,
        is_active: true,
    }
}

fn user(uid: &str) -> UserIdentity {
    UserIdentity {
        uid: uid.to_string(),
        display_name: None,
    }
}

fn engine(store: Arc<MemoryStore>) -> SyncEngine {
    SyncEngine::new(store, LeadState::default(), Duration::from_millis(10))
}

fn names(state: &LeadState) -> Vec<String> {
    state.snapshot().leads().iter().map(|l| l.name.clone()).collect()
}

#[tokio::test]
async fn attach_hydrates_local_state() {
    let store = Arc::new(MemoryStore::with_leads("u1", &[lead("Acme"), lead("Globex")]));
    let engine = engine(Arc::clone(&store));

    engine.attach(&user("u1")).await.unwrap();

    assert!(engine.is_active().await);
    assert_eq!(names(engine.state()), vec!["Acme", "Globex"]);
}

#[tokio::test]
async fn attach_without_document_keeps_local_state() {
    let store = Arc::new(MemoryStore::default());
    let state = LeadState::new(LeadStore::new(vec![lead("Local")]));
    let engine = SyncEngine::new(store, state, Duration::from_millis(10));

    engine.attach(&user("u1")).await.unwrap();
    assert_eq!(names(engine.state()), vec!["Local"]);
}

#[tokio::test]
async fn failed_hydration_leaves_engine_detached() {
    let store = Arc::new(MemoryStore {
        fail_fetch: true,
        ..MemoryStore::default()
    });
    let engine = engine(Arc::clone(&store));

    assert!(engine.attach(&user("u1")).await.is_err());
    assert!(!engine.is_active().await);
    assert!(!engine.push(&[lead("Acme")]).await);
    assert!(store.doc("u1").is_none());
}

#[tokio::test]
async fn undecodable_remote_leads_leave_engine_detached() {
    let store = Arc::new(MemoryStore::default());
    let remote = serde_json::json!([{ "id": "lead-1", "name": 42 }]);
    store
        .docs
        .lock()
        .unwrap()
        .entry("u1".into())
        .or_default()
        .insert("leads".into(), remote.clone());
    let state = LeadState::new(LeadStore::new(vec![lead("Local")]));
    let engine = SyncEngine::new(Arc::<MemoryStore>::clone(&store), state, Duration::from_millis(10));

    let err = engine.attach(&user("u1")).await.unwrap_err();
    assert!(matches!(err, SyncError::Json { .. }));
    assert!(!engine.is_active().await);
    assert_eq!(names(engine.state()), vec!["Local"]);

    assert!(!engine.push(&[lead("Acme")]).await);
    assert_eq!(store.doc("u1").unwrap()["leads"], remote);
}

#[tokio::test]
async fn loosely_typed_remote_leads_survive_the_next_push() {
    let store = Arc::new(MemoryStore::default());
    store
        .docs
        .lock()
        .unwrap()
        .entry("u1".into())
        .or_default()
        .insert(
            "leads".into(),
            serde_json::json!([
                { "id": "lead-1", "name": "Acme", "tagline": null },
                { "id": "lead-2", "name": "Globex", "targetType": "B2C" }
            ]),
        );
    let engine = engine(Arc::clone(&store));
    engine.attach(&user("u1")).await.unwrap();
    assert_eq!(names(engine.state()), vec!["Acme", "Globex"]);

    let (_, snapshot) = engine
        .state()
        .mutate(|s| s.ingest_discovery_batch(vec![candidate("Initech")]));
    assert!(engine.push(snapshot.leads()).await);

    let doc = store.doc("u1").unwrap();
    assert_eq!(doc["leads"].as_array().unwrap().len(), 3);
    assert_eq!(doc["leads"][2]["targetType"], "D2C");
}

#[tokio::test]
async fn push_merges_and_preserves_other_fields() {
    let store = Arc::new(MemoryStore::default());
    store
        .docs
        .lock()
        .unwrap()
        .entry("u1".into())
        .or_default()
        .insert("plan".into(), Value::String("pro".into()));
    let engine = engine(Arc::clone(&store));
    engine.attach(&user("u1")).await.unwrap();

    assert!(engine.push(&[lead("Acme")]).await);

    let doc = store.doc("u1").unwrap();
    assert_eq!(doc["plan"], "pro");
    assert_eq!(doc["leads"].as_array().unwrap().len(), 1);
    assert_eq!(doc["leads"][0]["name"], "Acme");
}

#[tokio::test]
async fn push_without_session_is_skipped() {
    let store = Arc::new(MemoryStore::default());
    let engine = engine(Arc::clone(&store));
    assert!(!engine.push(&[lead("Acme")]).await);
    assert!(store.doc("u1").is_none());
}

#[tokio::test]
async fn push_failure_is_swallowed_and_local_state_kept() {
    let store = Arc::new(MemoryStore {
        fail_merge: true,
        ..MemoryStore::default()
    });
    let state = LeadState::new(LeadStore::new(vec![lead("Local")]));
    let engine = SyncEngine::new(store, state, Duration::from_millis(10));
    engine.attach(&user("u1")).await.unwrap();

    let leads = engine.state().snapshot().leads().to_vec();
    assert!(!engine.push(&leads).await);
    assert_eq!(names(engine.state()), vec!["Local"]);
}

#[tokio::test]
async fn live_subscription_replaces_on_remote_change() {
    let store = Arc::new(MemoryStore::with_leads("u1", &[lead("Acme")]));
    let engine = engine(Arc::clone(&store));
    engine.start(&user("u1")).await.unwrap();
    assert_eq!(names(engine.state()), vec!["Acme"]);

    let mut rx = engine.state().subscribe();
    store.put_leads("u1", &[lead("Initech"), lead("Acme")]);

    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("remote change should be observed")
        .unwrap();
    assert_eq!(names(engine.state()), vec!["Initech", "Acme"]);

    engine.stop().await;
}

#[tokio::test]
async fn unchanged_remote_does_not_wake_observers() {
    let store = Arc::new(MemoryStore::with_leads("u1", &[lead("Acme")]));
    let engine = engine(Arc::clone(&store));
    engine.start(&user("u1")).await.unwrap();

    let rx = engine.state().subscribe();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!rx.has_changed().unwrap());

    engine.stop().await;
}

#[tokio::test]
async fn stop_tears_down_subscription_and_keeps_state() {
    let store = Arc::new(MemoryStore::with_leads("u1", &[lead("Acme")]));
    let engine = engine(Arc::clone(&store));
    engine.start(&user("u1")).await.unwrap();
    engine.stop().await;
    assert!(!engine.is_active().await);

    store.put_leads("u1", &[lead("Globex")]);
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(names(engine.state()), vec!["Acme"]);
}

#[tokio::test]
async fn follow_tracks_session_changes() {
    let store = Arc::new(MemoryStore::with_leads("u1", &[lead("Acme")]));
    let engine = engine(Arc::clone(&store));
    let (tx, rx) = watch::channel(None);

    let follower = engine.follow(rx);
    tx.send_replace(Some(user("u1")));

    let mut active = false;
    for _ in 0..100 {
        if engine.is_active().await {
            active = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(active, "sign-in should start sync");
    assert_eq!(names(engine.state()), vec!["Acme"]);

    tx.send_replace(None);
    let mut stopped = false;
    for _ in 0..100 {
        if !engine.is_active().await {
            stopped = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(stopped, "sign-out should stop sync");
    assert_eq!(names(engine.state()), vec!["Acme"]);

    drop(tx);
    tokio::time::timeout(Duration::from_secs(1), follower)
        .await
        .expect("follower exits when the session gate goes away")
        .unwrap();
}
