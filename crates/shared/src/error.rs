use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Auth,
    Store,
    Cancelled,
    NotSignedIn,
    Navigation,
}

/// Credential and account failures reported by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("the email address is badly formatted")]
    InvalidEmail,
    #[error("there is no user record corresponding to this identifier")]
    UserNotFound,
    #[error("the password is invalid")]
    WrongPassword,
    #[error("the email address is already in use by another account")]
    EmailAlreadyInUse,
    #[error("password should be at least {min_len} characters")]
    WeakPassword { min_len: usize },
    #[error("invalid federated credential: {0}")]
    InvalidCredential(String),
    #[error("{0}")]
    Other(String),
}

impl AuthFailure {
    /// Fixed user-facing wording for the well-known failures; the raw provider message otherwise.
    pub fn user_message(&self) -> String {
        match self {
            AuthFailure::InvalidEmail => "The email address is not valid.".to_string(),
            AuthFailure::UserNotFound => "No account found with this email.".to_string(),
            AuthFailure::WrongPassword => "Incorrect password.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Failures of the federated token source that runs before the provider exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FederatedSignInError {
    #[error("federated sign-in was cancelled by the user")]
    Cancelled,
    #[error("federated sign-in is already in progress")]
    InProgress,
    #[error("federated sign-in service is unavailable")]
    ServiceUnavailable,
    #[error("{0}")]
    Other(String),
}
