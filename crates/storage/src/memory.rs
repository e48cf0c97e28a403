use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{DirectoryStore, StoredDocument};

/// Process-local store with the same ordering as [`crate::Storage`] (by key).
#[derive(Default, Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<BTreeMap<String, BTreeMap<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, body)| StoredDocument {
                        key: key.clone(),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    async fn set(&self, collection: &str, key: &str, document: &Value) -> Result<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), document.clone());
        Ok(())
    }
}
