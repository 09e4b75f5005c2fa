use crate::error::CalculationError;
use core_types::{
    DataElement, DataGroup, InputData, KeyedSeries, OutputData, SeriesOperation, SeriesOutput,
    UnsupportedInputPolicy,
};
use serde_json::Value;

/// Applies a series operation to whatever a data source returned.
///
/// A `series` input yields a `series` result and a `grouped` input yields a
/// `multi-series` result with one entry per group. Input of an unknown shape
/// is handled according to `policy`.
pub fn calculate_series(
    operation: SeriesOperation,
    data: &InputData,
    policy: UnsupportedInputPolicy,
) -> Result<OutputData, CalculationError> {
    let output = match data {
        InputData::Series { data } => OutputData::Series(aggregate(operation, data)),
        InputData::Grouped { data } => aggregate_grouped(operation, data),
        InputData::Unsupported => match policy {
            UnsupportedInputPolicy::Zero => {
                tracing::warn!("Series calculation received an unsupported input shape; returning 0.");
                OutputData::Single { value: 0.0 }
            }
            UnsupportedInputPolicy::Reject => return Err(CalculationError::UnsupportedInput("series")),
        },
    };

    if output.is_finite() {
        Ok(output)
    } else {
        Err(CalculationError::NonFinite("series"))
    }
}


/// Maps every group through [`aggregate`] independently, keeping keys and order.
pub fn aggregate_grouped(operation: SeriesOperation, groups: &[DataGroup]) -> OutputData {
    OutputData::MultiSeries {
        series: groups
            .iter()
            .map(|group| KeyedSeries {
                key: group.key.clone(),
                values: aggregate(operation, &group.data),
            })
            .collect(),
    }
}

/// Transforms one sequence of points.
pub fn aggregate(operation: SeriesOperation, points: &[DataElement]) -> SeriesOutput {
    let values = match operation {
        SeriesOperation::Sum => points
            .iter()
            .scan(0.0, |total, point| {
                *total += point.value;
                Some(*total)
            })
            .collect(),
        SeriesOperation::None => points.iter().map(|point| point.value).collect(),
    };

    SeriesOutput {
        values,
        metadata: collect_metadata(points),
    }
}

// Only points that carry metadata contribute an entry; there are no placeholders.
fn collect_metadata(points: &[DataElement]) -> Vec<Value> {
    points
        .iter()
        .filter_map(|point| point.metadata.as_ref())
        .filter(|metadata| is_present(metadata))
        .cloned()
        .collect()
}

// `false`, `0` and `""` count as absent metadata. Empty objects and arrays do not.
fn is_present(metadata: &Value) -> bool {
    match metadata {
        Value::Null | Value::Bool(false) => false,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
