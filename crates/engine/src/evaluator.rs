use crate::error::EngineError;
use calculators::{ArithmeticEvaluator, LeafCalculator, NodeEvaluator, StandardCalculators};
use configuration::EngineSettings;
use core_types::{Calculation, InputData, NodeOperation, OutputData};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use sources::DataSource;
use std::sync::Arc;
use store::{input_key, output_key, Store, StoreReader};

/// Recursively resolves a calculation tree to a result.
///
/// `Ok(None)` is the "no result" outcome: a reference that never showed up in
/// the store, a source with no data, or a tree whose children are not both
/// scalars. It is passed upward untouched. Errors are reserved for faults.
pub struct Evaluator {
    source: Arc<dyn DataSource>,
    store: Arc<dyn Store>,
    reader: StoreReader,
    nodes: Arc<dyn NodeEvaluator>,
    leaves: Arc<dyn LeafCalculator>,
}

impl Evaluator {
    pub fn new(source: Arc<dyn DataSource>, store: Arc<dyn Store>, settings: &EngineSettings) -> Self {
        Self {
            reader: StoreReader::new(Arc::clone(&store), settings.retry.clone()),
            source,
            store,
            nodes: Arc::new(ArithmeticEvaluator),
            leaves: Arc::new(StandardCalculators::new(settings.unsupported_input)),
        }
    }

    /// Replaces the arithmetic used to combine tree children.
    pub fn with_node_evaluator(mut self, nodes: Arc<dyn NodeEvaluator>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Replaces the transforms applied to fetched leaf data.
    pub fn with_leaf_calculator(mut self, leaves: Arc<dyn LeafCalculator>) -> Self {
        self.leaves = leaves;
        self
    }

    pub fn reader(&self) -> &StoreReader {
        &self.reader
    }

    pub fn resolve<'a>(
        &'a self,
        calculation: &'a Calculation,
    ) -> BoxFuture<'a, Result<Option<OutputData>, EngineError>> {
        async move {
            match calculation {
                Calculation::Static { value, .. } => Ok(Some(OutputData::Single { value: *value })),
                Calculation::Reference { reference, .. } => self.resolve_reference(reference).await,
                Calculation::Tree { left, right, operation, .. } => {
                    self.resolve_tree(left, right, *operation).await
                }
                Calculation::Single { key, input, operation } => {
                    let Some(data) = self.fetch_input(key, input).await? else {
                        return Ok(None);
                    };
                    Ok(Some(self.leaves.single(*operation, &data)?))
                }
                Calculation::Series { key, input, operation } => {
                    let Some(data) = self.fetch_input(key, input).await? else {
                        return Ok(None);
                    };
                    Ok(Some(self.leaves.series(*operation, &data)?))
                }
            }
        }
        .boxed()
    }

    /// Waits for the persisted output of the calculation keyed `reference`.
    pub async fn resolve_reference(&self, reference: &str) -> Result<Option<OutputData>, EngineError> {
        let key = output_key(reference);
        match self.reader.await_key(&key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| EngineError::MalformedStoredValue { key, source }),
            None => {
                tracing::debug!(key = %key, "Reference did not resolve.");
                Ok(None)
            }
        }
    }

    // Children are resolved one after the other; the right side is never
    // started when the left side has no result.
    async fn resolve_tree(
        &self,
        left: &Calculation,
        right: &Calculation,
        operation: NodeOperation,
    ) -> Result<Option<OutputData>, EngineError> {
        let Some(left) = self.resolve(left).await? else {
            return Ok(None);
        };
        let Some(right) = self.resolve(right).await? else {
            return Ok(None);
        };

        match (left.as_single(), right.as_single()) {
            (Some(l), Some(r)) => Ok(Some(self.nodes.combine(l, r, operation)?)),
            _ => {
                tracing::debug!(
                    left = left.kind(),
                    right = right.kind(),
                    %operation,
                    "Tree children are not both scalars."
                );
                Ok(None)
            }
        }
    }

    async fn fetch_input(&self, key: &str, input: &Value) -> Result<Option<InputData>, EngineError> {
        let Some(data) = self.source.fetch(input).await? else {
            tracing::debug!(key, "Data source returned no data.");
            return Ok(None);
        };

        let cache_key = input_key(key, input)?;
        self.cache_input(&cache_key, &data).await;

        Ok(Some(data))
    }

    /// Best-effort write of the raw input. A failure is logged and never
    /// changes the outcome of the resolution.
    async fn cache_input(&self, cache_key: &str, data: &InputData) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = cache_key, error = %e, "Could not serialize raw input for caching.");
                return;
            }
        };

        if let Err(e) = self.store.set(cache_key, value).await {
            tracing::warn!(key = cache_key, error = %e, "Failed to cache raw input.");
        }
    }
}
