use shared::error::{AuthFailure, ErrorCode};
use thiserror::Error;

use crate::{events::Notice, navigation::NavigationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// A required field is missing; handled locally and blocks the action.
    #[error("{title}: {message}")]
    Validation { title: String, message: String },
    #[error("{title}: {message}")]
    Auth { title: String, message: String },
    #[error("{title}: {message}")]
    Store { title: String, message: String },
    /// The user backed out of a federated sign-in. Not shown to the user.
    #[error("cancelled by user")]
    Cancelled,
    #[error("no signed-in identity")]
    NotSignedIn,
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

impl AppError {
    pub fn validation(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn auth(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn auth_failure(title: impl Into<String>, failure: &AuthFailure) -> Self {
        Self::auth(title, failure.user_message())
    }

    pub fn store(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::Validation,
            AppError::Auth { .. } => ErrorCode::Auth,
            AppError::Store { .. } => ErrorCode::Store,
            AppError::Cancelled => ErrorCode::Cancelled,
            AppError::NotSignedIn => ErrorCode::NotSignedIn,
            AppError::Navigation(_) => ErrorCode::Navigation,
        }
    }

    /// The notice to show the user, if this failure is user-visible at all.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            AppError::Validation { title, message }
            | AppError::Auth { title, message }
            | AppError::Store { title, message } => Some(Notice::new(title, message)),
            AppError::NotSignedIn => Some(Notice::new(
                "Not Signed In",
                "Please sign in to view your dashboard.",
            )),
            AppError::Cancelled | AppError::Navigation(_) => None,
        }
    }
}
