use crate::error::ProviderError;
use crate::providers::{
    http_client, invalid_response, parse_json, send, status_error, Availability, PUBLIC_TIMEOUT,
};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "Lingva";
const DEFAULT_BASE_URL: &str = "https://lingva.ml/api/v1";

/// Lingva, an alternative front end for Google Translate.
pub struct LingvaProvider {
    client: Client,
    base_url: String,
    availability: Availability,
}

impl LingvaProvider {
    pub fn new() -> Self {
        Self {
            client: http_client(PUBLIC_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
            availability: Availability::new(),
        }
    }

    /// Point at another instance's API root, e.g. `https://lingva.example/api/v1`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// `{base}/{source}/{target}/{text}` with every segment percent-encoded.
    fn endpoint(&self, text: &str, options: &TranslationOptions) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::api(NAME, format!("Invalid base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ProviderError::api(NAME, "Base URL cannot carry a path"))?
            .pop_if_empty()
            .extend([options.source_or("auto"), options.target_language.as_str(), text]);

        Ok(url)
    }
}

impl Default for LingvaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize, Debug)]
struct LingvaResponse {
    translation: Option<String>,
}

#[async_trait]
impl Provider for LingvaProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<String, ProviderError> {
        let url = self.endpoint(text, options)?;
        let (status, body) = send(NAME, self.client.get(url)).await?;

        if !status.is_success() {
            return Err(status_error(NAME, status, &body, &self.availability));
        }

        let response: LingvaResponse = parse_json(NAME, &body)?;
        response
            .translation
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid_response(NAME))
    }

    fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}
