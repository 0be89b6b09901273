use crate::error::ProviderError;
use crate::providers::{
    http_client, invalid_response, parse_json, send, status_error, Availability, PUBLIC_TIMEOUT,
};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "MyMemory";
const DEFAULT_BASE_URL: &str = "https://api.mymemory.translated.net";

/// MyMemory public translation memory API.
pub struct MyMemoryProvider {
    client: Client,
    base_url: String,
    availability: Availability,
}

impl MyMemoryProvider {
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

    /// MyMemory has no auto-detect; the source defaults to English.
    fn lang_pair(options: &TranslationOptions) -> String {
        format!("{}|{}", options.source_or("en"), options.target_language)
    }
}

impl Default for MyMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: Option<MyMemoryData>,
    response_status: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    translated_text: Option<String>,
}

impl MyMemoryResponse {
    /// Quota exhaustion is reported in the payload, sometimes as a string.
    fn is_throttled(&self) -> bool {
        match &self.response_status {
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(429),
            Some(serde_json::Value::String(s)) => s == "429",
            _ => false,
        }
    }
}

#[async_trait]
impl Provider for MyMemoryProvider {
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
            .get(format!("{}/get", self.base_url))
            .query(&[("q", text), ("langpair", Self::lang_pair(options).as_str())]);

        let (status, body) = send(NAME, request).await?;

        // A throttled payload may arrive with either status.
        let parsed = serde_json::from_str::<MyMemoryResponse>(&body).ok();
        if parsed.as_ref().is_some_and(|r| r.is_throttled()) {
            return Err(self.availability.rate_limited(NAME));
        }

        if !status.is_success() {
            return Err(status_error(NAME, status, &body, &self.availability));
        }

        let response = match parsed {
            Some(response) => response,
            None => parse_json::<MyMemoryResponse>(NAME, &body)?,
        };

        response
            .response_data
            .and_then(|d| d.translated_text)
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
    fn test_lang_pair_defaults_to_english() {
        assert_eq!(
            MyMemoryProvider::lang_pair(&TranslationOptions::new("es")),
            "en|es"
        );
        assert_eq!(
            MyMemoryProvider::lang_pair(&TranslationOptions::new("es").with_source("de")),
            "de|es"
        );
    }

    #[test]
    fn test_throttled_payload() {
        let numeric: MyMemoryResponse =
            serde_json::from_str(r#"{"responseData":{"translatedText":"x"},"responseStatus":429}"#)
                .unwrap();
        assert!(numeric.is_throttled());

        let string: MyMemoryResponse =
            serde_json::from_str(r#"{"responseData":{"translatedText":"x"},"responseStatus":"429"}"#)
                .unwrap();
        assert!(string.is_throttled());

        let ok: MyMemoryResponse =
            serde_json::from_str(r#"{"responseData":{"translatedText":"Hola"},"responseStatus":200}"#)
                .unwrap();
        assert!(!ok.is_throttled());
    }

    #[test]
    fn test_provider_metadata() {
        let provider = MyMemoryProvider::new();
        assert_eq!(provider.name(), "MyMemory");
        assert!(provider.is_available());
    }
}
