use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use shared::{domain::Identity, error::AuthFailure};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    token::{verify_federated_token, FederatedTokenConfig},
    IdentityProvider, IdentitySubscription, SessionChange,
};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    identity: Identity,
    salt: [u8; 16],
    /// Absent for accounts that only ever signed in through a federated credential.
    password_digest: Option<[u8; 32]>,
}

#[derive(Default)]
struct ProviderState {
    accounts: HashMap<String, Account>,
    current: Option<Identity>,
    subscribers: Vec<mpsc::UnboundedSender<SessionChange>>,
    verification_outbox: Vec<String>,
}

impl ProviderState {
    fn set_current(&mut self, identity: Option<Identity>) {
        self.current = identity.clone();
        let change = match identity {
            Some(identity) => SessionChange::SignedIn(identity),
            None => SessionChange::SignedOut,
        };
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

/// Development identity provider that keeps every account in process memory.
pub struct InMemoryIdentityProvider {
    state: Mutex<ProviderState>,
    federated: FederatedTokenConfig,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new(FederatedTokenConfig::default())
    }
}

impl InMemoryIdentityProvider {
    pub fn new(federated: FederatedTokenConfig) -> Self {
        Self {
            state: Mutex::new(ProviderState::default()),
            federated,
        }
    }

    pub fn federated_config(&self) -> &FederatedTokenConfig {
        &self.federated
    }

    /// Simulates a session persisted from an earlier run, creating the account when unknown.
    pub async fn restore_session(&self, identity: Identity) -> Identity {
        let mut state = self.state.lock().await;
        let key = account_key(&identity.email);
        let identity = state
            .accounts
            .entry(key)
            .or_insert_with(|| Account {
                identity: identity.clone(),
                salt: new_salt(),
                password_digest: None,
            })
            .identity
            .clone();
        info!(email = %identity.email, "restored persisted session");
        state.set_current(Some(identity.clone()));
        identity
    }

    /// Provider-side verification event, as if the user followed the e-mailed link.
    pub async fn mark_email_verified(&self, email: &str) -> Result<(), AuthFailure> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(&account_key(email))
            .ok_or(AuthFailure::UserNotFound)?;
        account.identity.email_verified = true;
        let verified = account.identity.clone();
        if let Some(current) = state.current.as_mut() {
            if current.id == verified.id {
                *current = verified;
            }
        }
        Ok(())
    }

    pub async fn current_identity(&self) -> Option<Identity> {
        self.state.lock().await.current.clone()
    }

    pub async fn verification_outbox(&self) -> Vec<String> {
        self.state.lock().await.verification_outbox.clone()
    }

    pub async fn subscriber_count(&self) -> usize {
        let mut state = self.state.lock().await;
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn subscribe(&self) -> IdentitySubscription {
        let (tx, subscription) = IdentitySubscription::channel();
        let mut state = self.state.lock().await;
        let initial = match state.current.clone() {
            Some(identity) => SessionChange::SignedIn(identity),
            None => SessionChange::SignedOut,
        };
        if tx.send(initial).is_ok() {
            state.subscribers.push(tx);
        }
        subscription
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthFailure> {
        if !is_valid_email(email) {
            return Err(AuthFailure::InvalidEmail);
        }

        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get(&account_key(email))
            .ok_or(AuthFailure::UserNotFound)?;
        let Some(expected) = account.password_digest else {
            return Err(AuthFailure::WrongPassword);
        };
        if password_digest(&account.salt, password) != expected {
            return Err(AuthFailure::WrongPassword);
        }

        let identity = account.identity.clone();
        debug!(email = %identity.email, "password sign-in accepted");
        state.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthFailure> {
        if !is_valid_email(email) {
            return Err(AuthFailure::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthFailure::WeakPassword {
                min_len: MIN_PASSWORD_LEN,
            });
        }

        let mut state = self.state.lock().await;
        let key = account_key(email);
        if state.accounts.contains_key(&key) {
            return Err(AuthFailure::EmailAlreadyInUse);
        }

        let salt = new_salt();
        let identity = Identity::new(Uuid::new_v4().simple().to_string(), key.clone());
        state.accounts.insert(
            key,
            Account {
                identity: identity.clone(),
                salt,
                password_digest: Some(password_digest(&salt, password)),
            },
        );
        info!(email = %identity.email, "account created");
        // A fresh account is signed in immediately, like hosted providers do.
        state.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn send_verification_email(&self, identity: &Identity) -> Result<(), AuthFailure> {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(&account_key(&identity.email)) {
            return Err(AuthFailure::UserNotFound);
        }
        state.verification_outbox.push(identity.email.clone());
        debug!(email = %identity.email, "verification e-mail queued");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthFailure> {
        let mut state = self.state.lock().await;
        if state.current.is_some() {
            state.set_current(None);
        }
        Ok(())
    }

    async fn sign_in_with_federated_credential(
        &self,
        id_token: &str,
    ) -> Result<Identity, AuthFailure> {
        let claims = verify_federated_token(&self.federated, id_token)
            .map_err(|err| AuthFailure::InvalidCredential(err.to_string()))?;
        if !is_valid_email(&claims.email) {
            return Err(AuthFailure::InvalidEmail);
        }

        let mut state = self.state.lock().await;
        let key = account_key(&claims.email);
        let account = state.accounts.entry(key.clone()).or_insert_with(|| {
            let mut identity = Identity::new(format!("federated:{}", claims.sub), key);
            identity.display_name = claims.name.clone();
            identity.photo_url = claims.picture.clone();
            Account {
                identity,
                salt: new_salt(),
                password_digest: None,
            }
        });
        if claims.email_verified {
            account.identity.email_verified = true;
        }
        let identity = account.identity.clone();
        debug!(email = %identity.email, "federated sign-in accepted");
        state.set_current(Some(identity.clone()));
        Ok(identity)
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn new_salt() -> [u8; 16] {
    Uuid::new_v4().into_bytes()
}

fn password_digest(salt: &[u8; 16], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
