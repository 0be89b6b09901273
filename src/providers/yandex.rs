use crate::error::ProviderError;
use crate::providers::{
    http_client, invalid_response, parse_json, send, status_error, Availability, PUBLIC_TIMEOUT,
};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "Yandex";
const DEFAULT_BASE_URL: &str = "https://translate.yandex.net";

/// Yandex Translate through its unauthenticated `tr.json` endpoint.
pub struct YandexProvider {
    client: Client,
    base_url: String,
    availability: Availability,
}

impl YandexProvider {
    pub fn new() -> Self {
        Self {
            client: http_client(PUBLIC_TIMEOUT),
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

    /// `src-tgt`, or just `tgt` to let Yandex detect the source.
    fn lang(options: &TranslationOptions) -> String {
        match options.source_or("") {
            "" => options.target_language.clone(),
            source => format!("{}-{}", source, options.target_language),
        }
    }
}

impl Default for YandexProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize, Debug)]
struct YandexResponse {
    text: Option<Vec<String>>,
}

#[async_trait]
impl Provider for YandexProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<String, ProviderError> {
        let lang = Self::lang(options);
        let request = self
            .client
            .post(format!("{}/api/v1/tr.json/translate", self.base_url))
            .form(&[("text", text), ("lang", lang.as_str())]);

        let (status, body) = send(NAME, request).await?;
        if !status.is_success() {
            return Err(status_error(NAME, status, &body, &self.availability));
        }

        let response: YandexResponse = parse_json(NAME, &body)?;
        response
            .text
            .filter(|parts| !parts.is_empty())
            .map(|parts| parts.join(" "))
            .ok_or_else(|| invalid_response(NAME))
    }

    fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}
