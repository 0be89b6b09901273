use crate::error::ProviderError;
use crate::providers::{
    http_client, invalid_response, parse_json, require_key, send, status_error, Availability,
    PUBLIC_TIMEOUT,
};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "DeepL";
const FREE_API_URL: &str = "https://api-free.deepl.com";
const PRO_API_URL: &str = "https://api.deepl.com";

/// DeepL returns 456 when the account's character quota is used up.
const QUOTA_EXCEEDED: u16 = 456;

/// DeepL translation API, free or pro tier.
pub struct DeepLProvider {
    client: Client,
    api_key: String,
    base_url: String,
    availability: Availability,
}

impl DeepLProvider {
    pub fn new(api_key: String, use_free_api: bool) -> Self {
        let base_url = if use_free_api { FREE_API_URL } else { PRO_API_URL };
        Self {
            client: http_client(PUBLIC_TIMEOUT),
            api_key,
            base_url: base_url.to_string(),
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

    /// DeepL expects upper-case language codes and detects the source when omitted.
    fn form(text: &str, options: &TranslationOptions) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("text", text.to_string()),
            ("target_lang", options.target_language.to_uppercase()),
        ];
        if let Some(source) = options.source_language.as_deref().filter(|s| !s.is_empty()) {
            form.push(("source_lang", source.to_uppercase()));
        }
        form
    }
}

#[derive(Deserialize, Debug)]
struct DeepLResponse {
    translations: Option<Vec<DeepLTranslation>>,
}

#[derive(Deserialize, Debug)]
struct DeepLTranslation {
    text: Option<String>,
}

#[async_trait]
impl Provider for DeepLProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<String, ProviderError> {
        require_key(NAME, &self.api_key)?;

        let request = self
            .client
            .post(format!("{}/v2/translate", self.base_url))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&Self::form(text, options));

        let (status, body) = send(NAME, request).await?;

        if status.as_u16() == QUOTA_EXCEEDED {
            return Err(self.availability.rate_limited(NAME));
        }
        if !status.is_success() {
            return Err(status_error(NAME, status, &body, &self.availability));
        }

        let response: DeepLResponse = parse_json(NAME, &body)?;
        response
            .translations
            .and_then(|t| t.into_iter().next())
            .and_then(|t| t.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid_response(NAME))
    }

    fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}
