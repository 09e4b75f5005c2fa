use crate::error::StoreError;
use crate::Store;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

const NOTIFY_CAPACITY: usize = 256;

/// A process-local store.
///
/// Every write is published on a broadcast channel so readers waiting on a
/// key can wake up as soon as it lands instead of sleeping out their backoff.
#[derive(Debug)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    writes: broadcast::Sender<String>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        let (writes, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            writes,
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// A point-in-time copy of every key, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        // No subscribers is the common case and not an error.
        let _ = self.writes.send(key.to_string());
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<String>> {
        Some(self.writes.subscribe())
    }
}
