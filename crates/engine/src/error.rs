use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No result could be produced for calculation '{0}'")]
    NoResult(String),

    #[error("The value stored under '{key}' is not a valid calculation output: {source}")]
    MalformedStoredValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] store::FingerprintError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Data source error: {0}")]
    Source(#[from] sources::SourceError),

    #[error("Calculation error: {0}")]
    Calculation(#[from] calculators::CalculationError),

    #[error("Serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
