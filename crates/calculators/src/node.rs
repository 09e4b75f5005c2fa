use crate::error::CalculationError;
use core_types::{NodeOperation, OutputData};

/// Combines the scalar results of a tree node's two children.
pub trait NodeEvaluator: Send + Sync {
    fn combine(
        &self,
        left: f64,
        right: f64,
        operation: NodeOperation,
    ) -> Result<OutputData, CalculationError>;
}

/// Plain floating-point arithmetic.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArithmeticEvaluator;

impl NodeEvaluator for ArithmeticEvaluator {
    fn combine(
        &self,
        left: f64,
        right: f64,
        operation: NodeOperation,
    ) -> Result<OutputData, CalculationError> {
        let value = match operation {
            NodeOperation::Add => left + right,
            NodeOperation::Subtract => left - right,
            NodeOperation::Multiply => left * right,
            NodeOperation::Divide => {
                if right == 0.0 {
                    return Err(CalculationError::DivisionByZero(left));
                }
                left / right
            }
            NodeOperation::Min => left.min(right),
            NodeOperation::Max => left.max(right),
        };

        if !value.is_finite() {
            return Err(CalculationError::NonFinite("tree"));
        }
        Ok(OutputData::Single { value })
    }
}
