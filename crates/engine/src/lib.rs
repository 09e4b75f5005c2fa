//! # Tally Engine
//!
//! Runs calculations: [`Evaluator`] walks a calculation tree and resolves each
//! node, [`DataEngine`] wraps one run end to end (resolve, persist, format).

use crate::error::EngineError;
use calculators::{CalculationError, LeafCalculator, NodeEvaluator};
use configuration::EngineSettings;
use core_types::Calculation;
use sources::DataSource;
use std::sync::Arc;
use store::{output_key, Store};
use tracing::Instrument;
use uuid::Uuid;

pub mod error;
pub mod evaluator;
pub mod output;

pub use evaluator::Evaluator;
pub use output::{IdentityFormatter, JsonFormatter, OutputFormatter};

/// The single entry point for running a calculation.
///
/// Binds a data source, a store and an output formatter. The source and store
/// are shared and owned elsewhere; the engine only calls through them.
pub struct DataEngine<F: OutputFormatter> {
    evaluator: Evaluator,
    store: Arc<dyn Store>,
    formatter: F,
}

impl<F: OutputFormatter> DataEngine<F> {
    pub fn new(
        source: Arc<dyn DataSource>,
        store: Arc<dyn Store>,
        formatter: F,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            evaluator: Evaluator::new(source, Arc::clone(&store), settings),
            store,
            formatter,
        }
    }

    pub fn with_node_evaluator(mut self, nodes: Arc<dyn NodeEvaluator>) -> Self {
        self.evaluator = self.evaluator.with_node_evaluator(nodes);
        self
    }

    pub fn with_leaf_calculator(mut self, leaves: Arc<dyn LeafCalculator>) -> Self {
        self.evaluator = self.evaluator.with_leaf_calculator(leaves);
        self
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Resolves `calculation`, persists the result and formats it.
    ///
    /// A calculation without a result fails with [`EngineError::NoResult`], and
    /// one whose result holds a non-finite number fails without writing anything.
    /// When the calculation has a key, its result is written to
    /// `output-{key}` every time, even if it was itself read from the store,
    /// so later calculations can reference it.
    pub async fn run(&self, calculation: &Calculation) -> Result<F::Output, EngineError> {
        let run_id = Uuid::new_v4();
        let key = calculation.key().unwrap_or("<anonymous>").to_string();
        let span = tracing::info_span!("calculation", %run_id, key = %key, kind = calculation.kind());

        async move {
            let Some(result) = self.evaluator.resolve(calculation).await? else {
                tracing::warn!("Calculation produced no result.");
                return Err(EngineError::NoResult(key));
            };
            // JSON has no representation for these; a persisted copy would be unreadable.
            if !result.is_finite() {
                return Err(CalculationError::NonFinite(calculation.kind()).into());
            }

            match calculation.key() {
                Some(key) => {
                    self.store.set(&output_key(key), serde_json::to_value(&result)?).await?;
                }
                None => tracing::debug!("Anonymous calculation; result not persisted."),
            }

            tracing::info!(result = result.kind(), "Calculation complete.");
            Ok(self.formatter.format(&result))
        }
        .instrument(span)
        .await
    }
}
