//! Identity provider boundary: session notifications, password and federated sign-in.

use async_trait::async_trait;
use shared::{
    domain::Identity,
    error::{AuthFailure, FederatedSignInError},
};
use tokio::sync::mpsc;

mod memory;
mod token;

pub use memory::InMemoryIdentityProvider;
pub use token::{mint_federated_token, verify_federated_token, FederatedClaims, FederatedTokenConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(Identity),
    SignedOut,
}

impl SessionChange {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionChange::SignedIn(identity) => Some(identity),
            SessionChange::SignedOut => None,
        }
    }

    pub fn into_identity(self) -> Option<Identity> {
        match self {
            SessionChange::SignedIn(identity) => Some(identity),
            SessionChange::SignedOut => None,
        }
    }
}

/// Stream of session changes for one subscriber. Dropping it unsubscribes.
pub struct IdentitySubscription {
    rx: mpsc::UnboundedReceiver<SessionChange>,
}

impl IdentitySubscription {
    pub fn channel() -> (mpsc::UnboundedSender<SessionChange>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Next change, or `None` once the provider has dropped every sender.
    pub async fn next(&mut self) -> Option<SessionChange> {
        self.rx.recv().await
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Providers deliver the current session state as the first notification once it is known.
    async fn subscribe(&self) -> IdentitySubscription;
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthFailure>;
    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthFailure>;
    async fn send_verification_email(&self, identity: &Identity) -> Result<(), AuthFailure>;
    async fn sign_out(&self) -> Result<(), AuthFailure>;
    async fn sign_in_with_federated_credential(
        &self,
        id_token: &str,
    ) -> Result<Identity, AuthFailure>;
}

/// Interactive federated login (e.g. a platform account picker) that yields an ID token.
#[async_trait]
pub trait FederatedTokenSource: Send + Sync {
    /// `Ok(None)` when the flow finished without producing a token.
    async fn request_id_token(&self) -> Result<Option<String>, FederatedSignInError>;
}

pub struct MissingFederatedTokenSource;

#[async_trait]
impl FederatedTokenSource for MissingFederatedTokenSource {
    async fn request_id_token(&self) -> Result<Option<String>, FederatedSignInError> {
        Err(FederatedSignInError::ServiceUnavailable)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
