//! # Tally Store Crate
//!
//! The key-value store the engine caches raw inputs and persists outputs in,
//! and the tools for addressing and reading it.
//!
//! ## Architectural Principles
//!
//! - **Narrow contract:** A store only offers single-key `get` and `set`. There
//!   are no cross-key transactions and concurrent writers race with
//!   last-writer-wins semantics.
//! - **Eventual consistency:** A value written by one process may not be
//!   visible to another yet. [`StoreReader`] absorbs this with bounded polling,
//!   shortened by write notifications when the backend offers them.
//!
//! ## Public API
//!
//! - `Store`: The trait every backend implements.
//! - `InMemoryStore`, `PgStore`: The bundled backends.
//! - `StoreReader`: Bounded, decaying-backoff reads.
//! - `fingerprint`, `input_key`, `output_key`: The cache-key conventions.

// Declare the modules that constitute this crate.
pub mod cache_key;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod reader;

// Re-export the key components to create a clean, public-facing API.
pub use cache_key::{fingerprint, input_key, output_key};
pub use error::{FingerprintError, StoreError};
pub use memory::InMemoryStore;
pub use postgres::{connect, run_migrations, PgStore};
pub use reader::StoreReader;

use async_trait::async_trait;
use configuration::{StoreBackend, StoreSettings};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A shared key-value map holding opaque JSON values.
///
/// `get` never waits for a value to appear; retrying is the reader's job.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// A feed of written keys, for backends that can notify readers.
    fn subscribe(&self) -> Option<broadcast::Receiver<String>> {
        None
    }
}

/// Builds the store selected in the configuration.
pub async fn open_store(settings: &StoreSettings) -> Result<Arc<dyn Store>, StoreError> {
    match settings.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
        StoreBackend::Postgres => {
            let pool = connect(settings.database_url.as_deref()).await?;
            run_migrations(&pool).await?;
            tracing::info!("Connected to the PostgreSQL store.");
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}
