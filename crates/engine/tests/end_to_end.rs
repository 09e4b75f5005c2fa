//! End-to-end runs of the engine against stub sources and stores.

use async_trait::async_trait;
use configuration::{EngineSettings, RetrySettings};
use calculators::CalculationError;
use core_types::{Calculation, DataElement, InputData, NodeOperation, OutputData, SeriesOutput};
use engine::error::EngineError;
use engine::{DataEngine, IdentityFormatter, JsonFormatter};
use serde_json::{json, Value};
use sources::{DataSource, SourceError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use store::{fingerprint, InMemoryStore, Store, StoreError};
use tokio::time::Instant;

/// Answers from a fixed table keyed by the serialized input and records every
/// input it was asked for.
#[derive(Default)]
struct TableSource {
    responses: HashMap<String, InputData>,
    fetched: Mutex<Vec<Value>>,
}

impl TableSource {
    fn with(mut self, input: Value, data: InputData) -> Self {
        self.responses.insert(input.to_string(), data);
        self
    }

    fn fetched(&self) -> Vec<Value> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for TableSource {
    async fn fetch(&self, input: &Value) -> Result<Option<InputData>, SourceError> {
        self.fetched.lock().unwrap().push(input.clone());
        Ok(self.responses.get(&input.to_string()).cloned())
    }
}

/// Rejects every write except persisted outputs.
#[derive(Default)]
struct OutputOnlyStore {
    inner: InMemoryStore,
}

#[async_trait]
impl Store for OutputOnlyStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if key.starts_with("output-") {
            self.inner.set(key, value).await
        } else {
            Err(StoreError::ConnectionConfigError("read-only replica".to_string()))
        }
    }
}

fn series(values: &[f64]) -> InputData {
    InputData::Series {
        data: values.iter().copied().map(DataElement::new).collect(),
    }
}

fn calculation(value: Value) -> Calculation {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn series_sum_is_cached_and_persisted() {
    let input = json!({ "metric": "signups", "window": "7d" });
    let source = Arc::new(TableSource::default().with(input.clone(), series(&[1.0, 2.0, 3.0])));
    let store = Arc::new(InMemoryStore::new());
    let engine = DataEngine::new(source, store.clone(), IdentityFormatter, &EngineSettings::default());

    let calc = calculation(json!({ "type": "series", "key": "k", "input": input, "operation": "sum" }));
    let result = engine.run(&calc).await.unwrap();

    let expected = OutputData::Series(SeriesOutput { values: vec![1.0, 3.0, 6.0], metadata: vec![] });
    assert_eq!(result, expected);

    let raw_key = format!("k-{}", fingerprint(&input).unwrap());
    let raw = store.get(&raw_key).await.unwrap().expect("raw input is cached");
    assert_eq!(serde_json::from_value::<InputData>(raw).unwrap(), series(&[1.0, 2.0, 3.0]));

    let output = store.get("output-k").await.unwrap().expect("output is persisted");
    assert_eq!(output, json!({ "type": "series", "values": [1.0, 3.0, 6.0], "metadata": [] }));
    assert_eq!(store.keys().await, {
        let mut keys = vec![raw_key, "output-k".to_string()];
        keys.sort();
        keys
    });
}

#[tokio::test]
async fn json_formatter_renders_the_result() {
    let input = json!({ "metric": "signups" });
    let source = Arc::new(TableSource::default().with(input.clone(), series(&[1.0, 2.0, 3.0])));
    let engine = DataEngine::new(
        source,
        Arc::new(InMemoryStore::new()),
        JsonFormatter::compact(),
        &EngineSettings::default(),
    );

    let calc = calculation(json!({ "type": "series", "key": "k", "input": input, "operation": "sum" }));
    let rendered = engine.run(&calc).await.unwrap().unwrap();
    assert_eq!(rendered, r#"{"type":"series","values":[1.0,3.0,6.0],"metadata":[]}"#);
}

#[tokio::test]
async fn static_tree_adds() {
    let engine = DataEngine::new(
        Arc::new(TableSource::default()),
        Arc::new(InMemoryStore::new()),
        IdentityFormatter,
        &EngineSettings::default(),
    );

    let calc = calculation(json!({
        "type": "tree",
        "operation": "add",
        "left": { "type": "static", "value": 2 },
        "right": { "type": "static", "value": 3 }
    }));
    assert_eq!(engine.run(&calc).await.unwrap(), OutputData::Single { value: 5.0 });
}

#[tokio::test(start_paused = true)]
async fn missing_reference_fails_after_the_retry_budget() {
    let store = Arc::new(InMemoryStore::new());
    let engine = DataEngine::new(
        Arc::new(TableSource::default()),
        store.clone(),
        IdentityFormatter,
        &EngineSettings::default(),
    );

    let calc = calculation(json!({ "type": "reference", "reference": "missing-key", "key": "copy" }));
    let started = Instant::now();
    let err = engine.run(&calc).await.unwrap_err();

    assert!(matches!(err, EngineError::NoResult(ref key) if key == "copy"));
    assert!(started.elapsed() >= Duration::from_millis(2230));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn tree_short_circuits_on_absent_left() {
    let left_input = json!({ "metric": "nothing" });
    let right_input = json!({ "metric": "revenue" });
    let source = Arc::new(TableSource::default().with(right_input.clone(), series(&[10.0])));
    let engine = DataEngine::new(
        source.clone(),
        Arc::new(InMemoryStore::new()),
        IdentityFormatter,
        &EngineSettings::default(),
    );

    let calc = calculation(json!({
        "type": "tree",
        "key": "ratio",
        "operation": "divide",
        "left": { "type": "single", "key": "l", "input": left_input, "operation": "sum" },
        "right": { "type": "single", "key": "r", "input": right_input, "operation": "sum" }
    }));

    assert!(matches!(engine.run(&calc).await, Err(EngineError::NoResult(_))));
    assert_eq!(source.fetched(), vec![left_input]);
}

#[tokio::test]
async fn tree_rejects_series_children() {
    let input = json!({ "metric": "visits" });
    let source = Arc::new(TableSource::default().with(input.clone(), series(&[1.0, 2.0])));
    let engine = DataEngine::new(
        source,
        Arc::new(InMemoryStore::new()),
        IdentityFormatter,
        &EngineSettings::default(),
    );

    let calc = calculation(json!({
        "type": "tree",
        "operation": "add",
        "left": { "type": "series", "key": "v", "input": input, "operation": "sum" },
        "right": { "type": "static", "value": 1 }
    }));

    assert!(matches!(engine.run(&calc).await, Err(EngineError::NoResult(_))));
}

#[tokio::test]
async fn later_calculations_reference_earlier_outputs() {
    let input = json!({ "metric": "revenue" });
    let source = Arc::new(TableSource::default().with(input.clone(), series(&[4.0, 6.0])));
    let store = Arc::new(InMemoryStore::new());
    let engine = DataEngine::new(source, store.clone(), IdentityFormatter, &EngineSettings::default());

    let revenue = calculation(json!({ "type": "single", "key": "revenue", "input": input, "operation": "sum" }));
    assert_eq!(engine.run(&revenue).await.unwrap(), OutputData::Single { value: 10.0 });

    let doubled = Calculation::Tree {
        left: Box::new(Calculation::Reference { reference: "revenue".to_string(), key: None }),
        right: Box::new(Calculation::constant(2.0)),
        operation: NodeOperation::Multiply,
        key: Some("doubled".to_string()),
    };
    assert_eq!(engine.run(&doubled).await.unwrap(), OutputData::Single { value: 20.0 });
    assert_eq!(
        store.get("output-doubled").await.unwrap(),
        Some(json!({ "type": "single", "value": 20.0 }))
    );
}

#[tokio::test]
async fn reference_output_is_persisted_again() {
    let store = Arc::new(InMemoryStore::new());
    store.set("output-base", json!({ "type": "single", "value": 3.0 })).await.unwrap();
    let engine = DataEngine::new(
        Arc::new(TableSource::default()),
        store.clone(),
        IdentityFormatter,
        &EngineSettings::default(),
    );

    let calc = calculation(json!({ "type": "reference", "reference": "base", "key": "alias" }));
    assert_eq!(engine.run(&calc).await.unwrap(), OutputData::Single { value: 3.0 });
    assert_eq!(
        store.get("output-alias").await.unwrap(),
        Some(json!({ "type": "single", "value": 3.0 }))
    );
}

#[tokio::test(start_paused = true)]
async fn reference_waits_for_a_concurrent_writer() {
    let store = Arc::new(InMemoryStore::new());
    let engine = DataEngine::new(
        Arc::new(TableSource::default()),
        store.clone(),
        IdentityFormatter,
        &EngineSettings::default(),
    );

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(700)).await;
            store.set("output-late", json!({ "type": "single", "value": 42.0 })).await.unwrap();
        })
    };

    let calc = calculation(json!({ "type": "reference", "reference": "late" }));
    let started = Instant::now();
    assert_eq!(engine.run(&calc).await.unwrap(), OutputData::Single { value: 42.0 });
    writer.await.unwrap();

    // Woken by the write notification rather than the next poll at 900ms.
    assert!(started.elapsed() < Duration::from_millis(900));
}

#[tokio::test]
async fn failed_input_cache_write_does_not_fail_the_run() {
    let input = json!({ "metric": "orders" });
    let source = Arc::new(TableSource::default().with(input.clone(), series(&[1.0, 1.0])));
    let store = Arc::new(OutputOnlyStore::default());
    let engine = DataEngine::new(source, store.clone(), IdentityFormatter, &EngineSettings::default());

    let calc = calculation(json!({ "type": "single", "key": "orders", "input": input, "operation": "count" }));
    assert_eq!(engine.run(&calc).await.unwrap(), OutputData::Single { value: 2.0 });
    assert_eq!(store.inner.keys().await, vec!["output-orders".to_string()]);
}

#[tokio::test]
async fn grouped_input_produces_multi_series() {
    let input = json!({ "metric": "sales", "by": "region" });
    let grouped: InputData = serde_json::from_value(json!({
        "type": "grouped",
        "data": [
            { "key": "eu", "data": [{ "value": 1 }, { "value": 2, "metadata": { "t": 2 } }] },
            { "key": "us", "data": [{ "value": 5 }] }
        ]
    }))
    .unwrap();
    let source = Arc::new(TableSource::default().with(input.clone(), grouped));
    let engine = DataEngine::new(
        source,
        Arc::new(InMemoryStore::new()),
        JsonFormatter::compact(),
        &EngineSettings::default(),
    );

    let calc = calculation(json!({ "type": "series", "key": "sales", "input": input, "operation": "sum" }));
    let rendered: Value = serde_json::from_str(&engine.run(&calc).await.unwrap().unwrap()).unwrap();
    assert_eq!(
        rendered,
        json!({
            "type": "multi-series",
            "series": [
                { "key": "eu", "values": { "type": "series", "values": [1.0, 3.0], "metadata": [{ "t": 2 }] } },
                { "key": "us", "values": { "type": "series", "values": [5.0], "metadata": [] } }
            ]
        })
    );
}

#[tokio::test]
async fn concurrent_runs_share_one_engine() {
    let input = json!({ "metric": "signups" });
    let source = Arc::new(TableSource::default().with(input.clone(), series(&[1.0, 2.0])));
    let store = Arc::new(InMemoryStore::new());
    let settings = EngineSettings {
        retry: RetrySettings { max_attempts: 0, ..RetrySettings::default() },
        ..EngineSettings::default()
    };
    let engine = DataEngine::new(source.clone(), store.clone(), IdentityFormatter, &settings);

    let calc = calculation(json!({ "type": "single", "key": "s", "input": input, "operation": "sum" }));
    let (a, b) = tokio::join!(engine.run(&calc), engine.run(&calc));

    assert_eq!(a.unwrap(), OutputData::Single { value: 3.0 });
    assert_eq!(b.unwrap(), OutputData::Single { value: 3.0 });
    // Both runs fetch; nothing deduplicates concurrent work.
    assert_eq!(source.fetched().len(), 2);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn overflowing_tree_is_rejected_and_not_persisted() {
    let store = Arc::new(InMemoryStore::new());
    let engine = DataEngine::new(
        Arc::new(TableSource::default()),
        store.clone(),
        IdentityFormatter,
        &EngineSettings::default(),
    );

    let big = calculation(json!({
        "type": "tree",
        "key": "big",
        "operation": "multiply",
        "left": { "type": "static", "value": 1e308 },
        "right": { "type": "static", "value": 10 }
    }));
    let err = engine.run(&big).await.unwrap_err();
    assert!(matches!(err, EngineError::Calculation(CalculationError::NonFinite("tree"))));
    assert_eq!(store.get("output-big").await.unwrap(), None);
}

#[tokio::test]
async fn non_finite_constant_is_never_written() {
    let store = Arc::new(InMemoryStore::new());
    let engine = DataEngine::new(
        Arc::new(TableSource::default()),
        store.clone(),
        IdentityFormatter,
        &EngineSettings::default(),
    );

    let calc = Calculation::Static { value: f64::INFINITY, key: Some("inf".to_string()) };
    let err = engine.run(&calc).await.unwrap_err();
    assert!(matches!(err, EngineError::Calculation(CalculationError::NonFinite("static"))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn persisted_outputs_read_back_through_references() {
    let input = json!({ "metric": "sales", "by": "region" });
    let grouped: InputData = serde_json::from_value(json!({
        "type": "grouped",
        "data": [{ "key": "eu", "data": [{ "value": 1 }, { "value": 2 }] }]
    }))
    .unwrap();
    let source = Arc::new(TableSource::default().with(input.clone(), grouped));
    let engine = DataEngine::new(source, Arc::new(InMemoryStore::new()), IdentityFormatter, &EngineSettings::default());

    let sales = calculation(json!({ "type": "series", "key": "sales", "input": input, "operation": "sum" }));
    let first = engine.run(&sales).await.unwrap();

    let alias = calculation(json!({ "type": "reference", "reference": "sales" }));
    assert_eq!(engine.run(&alias).await.unwrap(), first);
}
