//! Typed access to the `users` and `groups` collections.

use anyhow::{Context, Result};
use shared::{
    domain::{Group, UserRecord},
    protocol::{Collection, DirectoryDocument},
};
use storage::DirectoryStore;
use tracing::warn;

pub async fn list_user_emails(store: &dyn DirectoryStore) -> Result<Vec<String>> {
    Ok(load_all::<UserRecord>(store)
        .await?
        .into_iter()
        .map(|record| record.email)
        .collect())
}

/// Writes `users/<email>` unless it already exists. Returns whether a record was created.
pub async fn register_user_if_absent(store: &dyn DirectoryStore, email: &str) -> Result<bool> {
    let collection = Collection::Users.as_str();
    if store.get(collection, email).await?.is_some() {
        return Ok(false);
    }
    put(
        store,
        &UserRecord {
            email: email.to_string(),
        },
    )
    .await?;
    Ok(true)
}

pub async fn put_group(store: &dyn DirectoryStore, group: &Group) -> Result<()> {
    put(store, group).await
}

pub async fn list_groups(store: &dyn DirectoryStore) -> Result<Vec<Group>> {
    load_all::<Group>(store).await
}

async fn put<T: DirectoryDocument + Sync>(store: &dyn DirectoryStore, record: &T) -> Result<()> {
    let key = record.document_key();
    let document = record
        .to_document()
        .with_context(|| format!("failed to encode {}/{key}", T::COLLECTION.as_str()))?;
    store.set(T::COLLECTION.as_str(), &key, &document).await
}

/// Loads a whole collection in store order, skipping documents that do not decode.
async fn load_all<T: DirectoryDocument>(store: &dyn DirectoryStore) -> Result<Vec<T>> {
    let collection = T::COLLECTION.as_str();
    let documents = store.get_all(collection).await?;
    Ok(documents
        .into_iter()
        .filter_map(|doc| match T::from_document(doc.body) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(collection, key = %doc.key, %error, "skipping malformed document");
                None
            }
        })
        .collect())
}
