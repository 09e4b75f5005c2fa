use crate::error::SourceError;
use crate::DataSource;
use async_trait::async_trait;
use configuration::SourceSettings;
use core_types::InputData;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Converts a response body that is not already in `InputData` form.
pub type Transformer = Arc<dyn Fn(Value) -> Result<InputData, SourceError> + Send + Sync>;

/// A data source backed by an HTTP endpoint.
///
/// Each fetch POSTs the calculation input as a JSON body. The response is
/// expected to be `InputData`, unless a transformer is installed.
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    transformer: Option<Transformer>,
}

impl HttpSource {
    pub fn new(settings: &SourceSettings) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &settings.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SourceError::InvalidConfig(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SourceError::InvalidConfig(format!("header value for '{name}': {e}")))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            transformer: None,
        })
    }

    /// Installs a transformer applied to every non-empty response body.
    pub fn with_transformer<F>(mut self, transformer: F) -> Self
    where
        F: Fn(Value) -> Result<InputData, SourceError> + Send + Sync + 'static,
    {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Interprets a response. An empty body, `204 No Content` or a JSON `null`
    /// mean the source has no data for this input.
    fn decode(&self, status: StatusCode, text: &str) -> Result<Option<InputData>, SourceError> {
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16(), text.to_string()));
        }
        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(None);
        }

        let body: Value = serde_json::from_str(text).map_err(|e| SourceError::Deserialization(e.to_string()))?;
        if body.is_null() {
            return Ok(None);
        }

        match &self.transformer {
            Some(transform) => transform(body).map(Some),
            None => serde_json::from_value(body)
                .map(Some)
                .map_err(|e| SourceError::Deserialization(e.to_string())),
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, input: &Value) -> Result<Option<InputData>, SourceError> {
        tracing::debug!(url = %self.url, "Fetching input data.");

        let response = self.client.post(&self.url).json(input).send().await?;
        let status = response.status();
        let text = response.text().await?;

        self.decode(status, &text)
    }
}
