use crate::error::CalculationError;
use core_types::{DataElement, InputData, OutputData, SingleOperation, UnsupportedInputPolicy};

/// Reduces all points of the input to a single scalar.
///
/// Grouped input is flattened in group order first. Empty input reduces to `0`
/// for every operation.
pub fn calculate_single(
    operation: SingleOperation,
    data: &InputData,
    policy: UnsupportedInputPolicy,
) -> Result<OutputData, CalculationError> {
    if let InputData::Unsupported = data {
        return match policy {
            UnsupportedInputPolicy::Zero => {
                tracing::warn!("Single calculation received an unsupported input shape; returning 0.");
                Ok(OutputData::Single { value: 0.0 })
            }
            UnsupportedInputPolicy::Reject => Err(CalculationError::UnsupportedInput("single")),
        };
    }

    let value = reduce(operation, &data.points());
    if !value.is_finite() {
        return Err(CalculationError::NonFinite("single"));
    }
    Ok(OutputData::Single { value })
}

fn reduce(operation: SingleOperation, points: &[&DataElement]) -> f64 {
    let values = points.iter().map(|p| p.value);

    match operation {
        SingleOperation::Sum => values.sum(),
        SingleOperation::Average => {
            if points.is_empty() {
                0.0
            } else {
                values.sum::<f64>() / points.len() as f64
            }
        }
        SingleOperation::Min => values.reduce(f64::min).unwrap_or(0.0),
        SingleOperation::Max => values.reduce(f64::max).unwrap_or(0.0),
        SingleOperation::Count => points.len() as f64,
        SingleOperation::First => points.first().map_or(0.0, |p| p.value),
        SingleOperation::Last | SingleOperation::None => points.last().map_or(0.0, |p| p.value),
    }
}
