use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to build or send the HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid source configuration: {0}")]
    InvalidConfig(String),

    #[error("The data source returned status {0}: {1}")]
    Status(u16, String),

    #[error("Failed to deserialize the data source response: {0}")]
    Deserialization(String),
}
