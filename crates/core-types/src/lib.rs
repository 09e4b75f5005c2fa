//! # Tally Core Types
//!
//! The shared vocabulary of the workspace: the calculation tree, the raw data
//! returned by sources and the results produced by the engine. Every other
//! crate depends on this one; it depends on nothing but `serde`.

pub mod calculation;
pub mod data;
pub mod enums;

// Re-export the core types to provide a clean public API.
pub use calculation::Calculation;
pub use data::{DataElement, DataGroup, InputData, KeyedSeries, OutputData, SeriesOutput};
pub use enums::{NodeOperation, SeriesOperation, SingleOperation, UnsupportedInputPolicy};
