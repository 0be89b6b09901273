use crate::error::ProviderError;
use crate::providers::{
    http_client, invalid_response, parse_json, send, status_error, Availability, PUBLIC_TIMEOUT,
};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "HuggingFace";
const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Hugging Face inference API running the Helsinki-NLP opus-mt models.
///
/// Works without a key at a lower rate limit.
pub struct HuggingFaceProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    availability: Availability,
}

impl HuggingFaceProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: http_client(PUBLIC_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            availability: Availability::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// opus-mt models are per language pair; the source defaults to English.
    fn model(options: &TranslationOptions) -> String {
        format!(
            "Helsinki-NLP/opus-mt-{}-{}",
            options.source_or("en").to_lowercase(),
            options.target_language.to_lowercase()
        )
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize, Debug)]
struct InferenceOutput {
    translation_text: Option<String>,
}

#[async_trait]
impl Provider for HuggingFaceProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}", self.base_url, Self::model(options));
        let mut request = self.client.post(url).json(&InferenceRequest { inputs: text });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let (status, body) = send(NAME, request).await?;
        if !status.is_success() {
            return Err(status_error(NAME, status, &body, &self.availability));
        }

        let outputs: Vec<InferenceOutput> = parse_json(NAME, &body)?;
        outputs
            .into_iter()
            .next()
            .and_then(|o| o.translation_text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid_response(NAME))
    }

    fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_for_language_pair() {
        assert_eq!(
            HuggingFaceProvider::model(&TranslationOptions::new("es")),
            "Helsinki-NLP/opus-mt-en-es"
        );
        assert_eq!(
            HuggingFaceProvider::model(&TranslationOptions::new("EN").with_source("de")),
            "Helsinki-NLP/opus-mt-de-en"
        );
    }

    #[test]
    fn test_blank_key_ignored() {
        let provider = HuggingFaceProvider::new(Some("  ".to_string()));
        assert!(provider.api_key.is_none());
    }
}
