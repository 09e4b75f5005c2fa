use crate::enums::{NodeOperation, SeriesOperation, SingleOperation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node of the calculation tree.
///
/// Trees are built up front and never mutated while they are being evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Calculation {
    /// A literal scalar.
    Static {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    /// The persisted output of an earlier calculation, addressed by that calculation's key.
    Reference {
        reference: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    /// Fetch raw data and reduce it to a scalar.
    Single {
        key: String,
        input: Value,
        #[serde(default)]
        operation: SingleOperation,
    },
    /// Fetch raw data and transform it into one or more sequences.
    Series {
        key: String,
        input: Value,
        #[serde(default)]
        operation: SeriesOperation,
    },
    /// Combine two scalar sub-results.
    Tree {
        left: Box<Calculation>,
        right: Box<Calculation>,
        operation: NodeOperation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
}

impl Calculation {
    /// The identity key of this node, used to address its persisted output.
    pub fn key(&self) -> Option<&str> {
        match self {
            Calculation::Static { key, .. }
            | Calculation::Reference { key, .. }
            | Calculation::Tree { key, .. } => key.as_deref(),
            Calculation::Single { key, .. } | Calculation::Series { key, .. } => Some(key),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Calculation::Static { .. } => "static",
            Calculation::Reference { .. } => "reference",
            Calculation::Single { .. } => "single",
            Calculation::Series { .. } => "series",
            Calculation::Tree { .. } => "tree",
        }
    }

    pub fn tree(left: Calculation, right: Calculation, operation: NodeOperation) -> Self {
        Calculation::Tree {
            left: Box::new(left),
            right: Box::new(right),
            operation,
            key: None,
        }
    }

    pub fn constant(value: f64) -> Self {
        Calculation::Static { value, key: None }
    }
}
