//! # Tally Calculators
//!
//! The pure numeric transforms applied by the engine: the series aggregator,
//! the scalar reductions used by `single` leaves, and the arithmetic used to
//! combine the children of a `tree` node.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** Nothing here performs I/O. Every function takes raw data
//!   and returns a result, which makes the crate easy to test in isolation.
//! - **Replaceable families:** The engine talks to the calculators through the
//!   [`LeafCalculator`] and [`NodeEvaluator`] traits, so a caller can plug in
//!   their own operation vocabulary.

// Declare the modules that constitute this crate.
pub mod error;
pub mod node;
pub mod series;
pub mod single;

// Re-export the key components to create a clean, public-facing API.
pub use error::CalculationError;
pub use node::{ArithmeticEvaluator, NodeEvaluator};
pub use series::{aggregate, aggregate_grouped, calculate_series};
pub use single::calculate_single;

use core_types::{InputData, OutputData, SeriesOperation, SingleOperation, UnsupportedInputPolicy};

/// The transforms applied to fetched data at the leaves of a calculation tree.
pub trait LeafCalculator: Send + Sync {
    fn single(&self, operation: SingleOperation, data: &InputData) -> Result<OutputData, CalculationError>;

    fn series(&self, operation: SeriesOperation, data: &InputData) -> Result<OutputData, CalculationError>;
}

/// The built-in leaf calculators, parameterised by how unknown input is treated.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCalculators {
    policy: UnsupportedInputPolicy,
}

impl StandardCalculators {
    pub fn new(policy: UnsupportedInputPolicy) -> Self {
        Self { policy }
    }
}

impl LeafCalculator for StandardCalculators {
    fn single(&self, operation: SingleOperation, data: &InputData) -> Result<OutputData, CalculationError> {
        calculate_single(operation, data, self.policy)
    }

    fn series(&self, operation: SeriesOperation, data: &InputData) -> Result<OutputData, CalculationError> {
        calculate_series(operation, data, self.policy)
    }
}
