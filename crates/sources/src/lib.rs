//! # Tally Sources
//!
//! Where raw data comes from. The engine only sees the [`DataSource`] trait;
//! [`HttpSource`] is the bundled adapter that fetches from an HTTP endpoint.

pub mod error;
pub mod http;

// --- Public API ---
pub use error::SourceError;
pub use http::{HttpSource, Transformer};

use async_trait::async_trait;
use core_types::InputData;
use serde_json::Value;

/// The generic interface for anything that can produce raw input data.
///
/// `Ok(None)` means the source has no data for this input, which is not a
/// failure. Errors are reserved for a source that could not answer at all.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, input: &Value) -> Result<Option<InputData>, SourceError>;
}
