use crate::error::ProviderError;
use crate::providers::{
    http_client, invalid_response, parse_json, send, status_error, Availability, LLM_TIMEOUT,
};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const NAME: &str = "GoogleTranslate";
const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Google Translate through the unauthenticated `gtx` web client endpoint.
pub struct GoogleTranslateProvider {
    client: Client,
    base_url: String,
    availability: Availability,
}

impl GoogleTranslateProvider {
    pub fn new() -> Self {
        Self {
            client: http_client(LLM_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
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
}

impl Default for GoogleTranslateProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// The response is a nested array; `[0]` holds one `[translated, original, ...]`
/// entry per sentence.
fn extract_translation(response: &Value) -> Option<String> {
    let sentences = response.get(0)?.as_array()?;
    let translated: String = sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        None
    } else {
        Some(translated)
    }
}

#[async_trait]
impl Provider for GoogleTranslateProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<String, ProviderError> {
        let request = self
            .client
            .get(format!("{}/translate_a/single", self.base_url))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("client", "gtx"),
                ("sl", options.source_or("auto")),
                ("tl", options.target_language.as_str()),
                ("dt", "t"),
                ("q", text),
            ]);

        let (status, body) = send(NAME, request).await?;
        if !status.is_success() {
            return Err(status_error(NAME, status, &body, &self.availability));
        }

        let response: Value = parse_json(NAME, &body)?;
        extract_translation(&response).ok_or_else(|| invalid_response(NAME))
    }

    fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}
