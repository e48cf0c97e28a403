//! Client events published to whichever front end drives the workflows.

use shared::domain::Group;

use crate::navigation::{Screen, TransitionKind};

/// A dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Notice(Notice),
    Navigated {
        screen: Screen,
        kind: TransitionKind,
    },
    DirectoryLoaded {
        candidates: usize,
    },
    UserRegistered {
        email: String,
    },
    GroupCreated(Group),
}
