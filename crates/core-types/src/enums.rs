use serde::{Deserialize, Serialize};
use std::fmt;

/// The transform applied by the series aggregator to each sequence of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SeriesOperation {
    /// Running cumulative total.
    Sum,
    /// Identity pass-through. Unknown operation names land here as well.
    #[default]
    None,
}

impl From<String> for SeriesOperation {
    fn from(name: String) -> Self {
        match name.as_str() {
            "sum" => SeriesOperation::Sum,
            _ => SeriesOperation::None,
        }
    }
}

/// Reductions that collapse a set of points into a single scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SingleOperation {
    Sum,
    Average,
    Min,
    Max,
    Count,
    First,
    Last,
    /// The latest observation. Unknown operation names land here as well.
    #[default]
    None,
}

impl From<String> for SingleOperation {
    fn from(name: String) -> Self {
        match name.as_str() {
            "sum" => SingleOperation::Sum,
            "average" => SingleOperation::Average,
            "min" => SingleOperation::Min,
            "max" => SingleOperation::Max,
            "count" => SingleOperation::Count,
            "first" => SingleOperation::First,
            "last" => SingleOperation::Last,
            _ => SingleOperation::None,
        }
    }
}

/// Binary combinators for `tree` nodes.
///
/// Unlike the leaf operations there is no catch-all: a tree naming an
/// operation outside this set is a malformed calculation and fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeOperation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Min,
    Max,
}

impl fmt::Display for NodeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeOperation::Add => "add",
            NodeOperation::Subtract => "subtract",
            NodeOperation::Multiply => "multiply",
            NodeOperation::Divide => "divide",
            NodeOperation::Min => "min",
            NodeOperation::Max => "max",
        };
        f.write_str(name)
    }
}

/// What the calculators do with raw input whose shape they do not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedInputPolicy {
    /// Fail with an explicit error.
    #[default]
    Reject,
    /// Degrade to a `single` result of `0`.
    Zero,
}
