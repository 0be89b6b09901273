use crate::error::ProviderError;
use crate::providers::{
    http_client, invalid_response, parse_json, send, status_error, Availability, PUBLIC_TIMEOUT,
};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "LibreTranslate";
const DEFAULT_BASE_URL: &str = "https://libretranslate.de";

/// LibreTranslate instance, public or self-hosted.
pub struct LibreTranslateProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    availability: Availability,
}

impl LibreTranslateProvider {
    pub fn new() -> Self {
        Self {
            client: http_client(PUBLIC_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            availability: Availability::new(),
        }
    }

    /// Point at another instance, e.g. `http://localhost:5000`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }
}

impl Default for LibreTranslateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: Option<String>,
    error: Option<String>,
}

/// LibreTranslate reports quota problems as an error string mentioning the limit.
fn mentions_limit(body: &str) -> bool {
    serde_json::from_str::<LibreResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .is_some_and(|e| e.to_lowercase().contains("limit"))
}

#[async_trait]
impl Provider for LibreTranslateProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<String, ProviderError> {
        let payload = LibreRequest {
            q: text,
            source: options.source_or("auto"),
            target: &options.target_language,
            api_key: self.api_key.as_deref(),
        };

        let request = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&payload);

        let (status, body) = send(NAME, request).await?;

        if !status.is_success() {
            if mentions_limit(&body) {
                return Err(self.availability.rate_limited(NAME));
            }
            return Err(status_error(NAME, status, &body, &self.availability));
        }

        let response: LibreResponse = parse_json(NAME, &body)?;
        response
            .translated_text
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid_response(NAME))
    }

    fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}
