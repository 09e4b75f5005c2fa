use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single raw data point produced by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataElement {
    pub value: f64,
    /// Opaque side data attached by the source (a timestamp, a tag, ...).
    /// A JSON `null` is treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl DataElement {
    pub fn new(value: f64) -> Self {
        Self { value, metadata: None }
    }

    pub fn with_metadata(value: f64, metadata: Value) -> Self {
        Self {
            value,
            metadata: Some(metadata),
        }
    }
}

/// One independent sub-series inside a grouped input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataGroup {
    pub key: String,
    pub data: Vec<DataElement>,
}

/// The raw payload returned by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InputData {
    Series { data: Vec<DataElement> },
    Grouped { data: Vec<DataGroup> },
    /// Any payload tagged with a type the calculators do not know.
    #[serde(other)]
    Unsupported,
}

impl InputData {
    /// Every point of the payload, groups flattened in order.
    pub fn points(&self) -> Vec<&DataElement> {
        match self {
            InputData::Series { data } => data.iter().collect(),
            InputData::Grouped { data } => data.iter().flat_map(|g| g.data.iter()).collect(),
            InputData::Unsupported => Vec::new(),
        }
    }
}

/// A computed sequence. `metadata` only holds the entries that were present on
/// the input points, so it is not index-aligned with `values`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesOutput {
    pub values: Vec<f64>,
    pub metadata: Vec<Value>,
}

impl SeriesOutput {
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// One group of a `multi-series` result. `values` is written as a full
/// `series` output, `type` tag included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedSeries {
    pub key: String,
    #[serde(with = "tagged_series")]
    pub values: SeriesOutput,
}

mod tagged_series {
    use super::SeriesOutput;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    #[serde(tag = "type", rename_all = "kebab-case")]
    enum Borrowed<'a> {
        Series(&'a SeriesOutput),
    }

    #[derive(Deserialize)]
    #[serde(tag = "type", rename_all = "kebab-case")]
    enum Owned {
        Series(SeriesOutput),
    }

    pub fn serialize<S: Serializer>(series: &SeriesOutput, serializer: S) -> Result<S::Ok, S::Error> {
        Borrowed::Series(series).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SeriesOutput, D::Error> {
        let Owned::Series(series) = Owned::deserialize(deserializer)?;
        Ok(series)
    }
}

/// The result of resolving any calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutputData {
    Single { value: f64 },
    Series(SeriesOutput),
    MultiSeries { series: Vec<KeyedSeries> },
}

impl OutputData {
    /// The scalar value, if this is a `single` result.
    pub fn as_single(&self) -> Option<f64> {
        match self {
            OutputData::Single { value } => Some(*value),
            _ => None,
        }
    }

    /// Whether every number in the result can be written as JSON.
    pub fn is_finite(&self) -> bool {
        match self {
            OutputData::Single { value } => value.is_finite(),
            OutputData::Series(series) => series.is_finite(),
            OutputData::MultiSeries { series } => series.iter().all(|keyed| keyed.values.is_finite()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutputData::Single { .. } => "single",
            OutputData::Series(_) => "series",
            OutputData::MultiSeries { .. } => "multi-series",
        }
    }
}
