use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(UserId, String);
id_newtype!(GroupId, Uuid);

impl GroupId {
    /// Mints a random v4 identifier. Uniqueness is probabilistic; the store does not enforce it.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_key(&self) -> String {
        self.0.to_string()
    }
}

/// Account identity as reported by the identity provider. Read-only to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            email: email.into(),
            display_name: None,
            photo_url: None,
            email_verified: false,
            phone_number: None,
        }
    }

    pub fn verified(mut self) -> Self {
        self.email_verified = true;
        self
    }
}

/// Directory entry, keyed by email in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: GroupId,
    pub group_name: String,
    /// Email snapshot taken at creation time; the creator is always first.
    pub members: Vec<String>,
    pub admin: String,
}
