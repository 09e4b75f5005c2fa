use crate::error::StoreError;
use crate::Store;
use configuration::RetrySettings;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Reads keys from a store that may not yet show a value written elsewhere.
///
/// A miss is retried with a decaying backoff: with the default policy there
/// are up to 10 retries after the first read, waiting 500ms before the first
/// and 0.8x the previous wait before each following one. When the store
/// publishes writes, a wait ends early as soon as the awaited key is written;
/// the attempt budget stays the same either way.
#[derive(Clone)]
pub struct StoreReader {
    store: Arc<dyn Store>,
    policy: RetrySettings,
}

impl StoreReader {
    pub fn new(store: Arc<dyn Store>, policy: RetrySettings) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RetrySettings {
        &self.policy
    }

    /// Returns the value under `key`, or `None` once the retry budget is spent.
    ///
    /// Attempts are strictly sequential. Backend errors are returned as-is and
    /// are not retried.
    pub async fn await_key(&self, key: &str) -> Result<Option<Value>, StoreError> {
        // Subscribe before the first read so a write racing with it is not missed.
        let mut writes = self.store.subscribe();

        if let Some(value) = self.store.get(key).await? {
            return Ok(Some(value));
        }

        let mut delay = self.policy.initial_delay();
        for attempt in 1..=self.policy.max_attempts {
            wait_for_write(key, delay, writes.as_mut()).await;

            if let Some(value) = self.store.get(key).await? {
                tracing::debug!(key, attempt, "Store key became visible.");
                return Ok(Some(value));
            }
            delay = delay.mul_f64(self.policy.decay);
        }

        tracing::debug!(key, attempts = self.policy.max_attempts, "Store key still absent after all retries.");
        Ok(None)
    }
}

async fn wait_for_write(key: &str, delay: Duration, writes: Option<&mut broadcast::Receiver<String>>) {
    match writes {
        Some(writes) => {
            // Elapsing is the normal polling path, not a failure.
            let _ = tokio::time::timeout(delay, key_written(key, writes)).await;
        }
        None => tokio::time::sleep(delay).await,
    }
}

async fn key_written(key: &str, writes: &mut broadcast::Receiver<String>) {
    loop {
        match writes.recv().await {
            Ok(written) if written == key => return,
            Ok(_) => continue,
            // Notifications were dropped; one of them may have been ours.
            Err(RecvError::Lagged(_)) => return,
            // No more notifications; fall back to plain polling.
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
