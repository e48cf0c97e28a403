//! Document layout shared by every directory store backend.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::domain::{Group, UserRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Groups,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Groups => "groups",
        }
    }
}

/// A typed record that lives in a fixed collection under a natural key.
pub trait DirectoryDocument: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn document_key(&self) -> String;

    fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    fn from_document(document: Value) -> serde_json::Result<Self> {
        serde_json::from_value(document)
    }
}

impl DirectoryDocument for UserRecord {
    const COLLECTION: Collection = Collection::Users;

    fn document_key(&self) -> String {
        self.email.clone()
    }
}

impl DirectoryDocument for Group {
    const COLLECTION: Collection = Collection::Groups;

    fn document_key(&self) -> String {
        self.group_id.as_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GroupId;

    #[test]
    fn group_document_uses_camel_case_fields() {
        let group = Group {
            group_id: GroupId::new_random(),
            group_name: "Trip".into(),
            members: vec!["me@x.com".into(), "a@x.com".into()],
            admin: "me@x.com".into(),
        };
        let doc = group.to_document().expect("serialize");
        assert_eq!(doc["groupName"], "Trip");
        assert_eq!(doc["admin"], "me@x.com");
        assert_eq!(doc["groupId"], group.group_id.as_key());
        assert_eq!(group.document_key(), group.group_id.as_key());
    }

    #[test]
    fn user_record_is_keyed_by_email() {
        let record = UserRecord {
            email: "a@x.com".into(),
        };
        assert_eq!(record.document_key(), "a@x.com");
        assert_eq!(Collection::Users.as_str(), "users");
    }
}
