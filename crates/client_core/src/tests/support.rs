use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use identity::{
    FederatedTokenSource, IdentityProvider, IdentitySubscription, InMemoryIdentityProvider,
    SessionChange,
};
use serde_json::Value;
use shared::{
    domain::Identity,
    error::{AuthFailure, FederatedSignInError},
};
use storage::{DirectoryStore, MemoryStore, StoredDocument};
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::{directory, App, ClientEvent, ClientSettings, Notice};

/// Memory-backed store whose reads and writes can be made to fail on demand.
#[derive(Default)]
pub struct TestStore {
    pub inner: MemoryStore,
    fail_reads: AtomicBool,
    failing_writes: AtomicUsize,
    writes: AtomicUsize,
}

impl TestStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn seed_users(&self, emails: &[&str]) {
        for email in emails {
            directory::register_user_if_absent(&self.inner, email)
                .await
                .expect("seed user");
        }
    }
}

#[async_trait]
impl DirectoryStore for TestStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("backend unavailable"));
        }
        self.inner.get_all(collection).await
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("backend unavailable"));
        }
        self.inner.get(collection, key).await
    }

    async fn set(&self, collection: &str, key: &str, document: &Value) -> Result<()> {
        let remaining = self.failing_writes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_writes.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("write rejected"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(collection, key, document).await
    }
}

/// Provider that accepts subscriptions but never reports a session state.
#[derive(Default)]
pub struct SilentIdentityProvider {
    held: Mutex<Vec<mpsc::UnboundedSender<SessionChange>>>,
}

impl SilentIdentityProvider {
    pub async fn announce(&self, change: SessionChange) {
        for tx in self.held.lock().await.iter() {
            let _ = tx.send(change.clone());
        }
    }
}

#[async_trait]
impl IdentityProvider for SilentIdentityProvider {
    async fn subscribe(&self) -> IdentitySubscription {
        let (tx, subscription) = IdentitySubscription::channel();
        self.held.lock().await.push(tx);
        subscription
    }

    async fn sign_in_with_password(&self, _: &str, _: &str) -> Result<Identity, AuthFailure> {
        Err(AuthFailure::Other("provider offline".into()))
    }

    async fn sign_up_with_password(&self, _: &str, _: &str) -> Result<Identity, AuthFailure> {
        Err(AuthFailure::Other("provider offline".into()))
    }

    async fn send_verification_email(&self, _: &Identity) -> Result<(), AuthFailure> {
        Err(AuthFailure::Other("provider offline".into()))
    }

    async fn sign_out(&self) -> Result<(), AuthFailure> {
        Ok(())
    }

    async fn sign_in_with_federated_credential(&self, _: &str) -> Result<Identity, AuthFailure> {
        Err(AuthFailure::Other("provider offline".into()))
    }
}

pub struct ScriptedTokenSource(pub Result<Option<String>, FederatedSignInError>);

#[async_trait]
impl FederatedTokenSource for ScriptedTokenSource {
    async fn request_id_token(&self) -> Result<Option<String>, FederatedSignInError> {
        self.0.clone()
    }
}

pub fn me() -> Identity {
    Identity::new("uid-me", "me@x.com").verified()
}

pub fn start_app(store: Arc<dyn DirectoryStore>, provider: Arc<dyn IdentityProvider>) -> App {
    App::start(ClientSettings::default(), store, provider)
}

/// App whose session has already resolved to `identity`.
pub async fn signed_in_app(store: Arc<dyn DirectoryStore>, identity: Identity) -> App {
    let provider = Arc::new(InMemoryIdentityProvider::default());
    provider.restore_session(identity).await;
    let app = start_app(store, provider);
    app.session().resolved().await.expect("session resolves");
    app
}

pub fn drain_notices(rx: &mut broadcast::Receiver<ClientEvent>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ClientEvent::Notice(notice) = event {
            notices.push(notice);
        }
    }
    notices
}
