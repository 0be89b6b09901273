use crate::error::ProviderError;
use crate::providers::{
    http_client, invalid_response, parse_json, require_key, send, status_error,
    translation_prompt, Availability, LLM_TIMEOUT,
};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "Anthropic";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Anthropic Messages API.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    availability: Availability,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: http_client(LLM_TIMEOUT),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            availability: Availability::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
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

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    content: Option<Vec<ContentBlock>>,
}

#[derive(Deserialize, Debug)]
struct ContentBlock {
    text: Option<String>,
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<String, ProviderError> {
        require_key(NAME, &self.api_key)?;

        let payload = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: translation_prompt(text, options),
            }],
        };

        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&payload);

        let (status, body) = send(NAME, request).await?;
        if !status.is_success() {
            return Err(status_error(NAME, status, &body, &self.availability));
        }

        let response: MessagesResponse = parse_json(NAME, &body)?;
        response
            .content
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.text)
            .map(|t| t.trim().to_string())
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
    fn test_defaults() {
        let provider = AnthropicProvider::new("k".to_string());
        assert_eq!(provider.name(), "Anthropic");
        assert_eq!(provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_response_text() {
        let response: MessagesResponse =
            serde_json::from_str(r#"{"content":[{"type":"text","text":" Bonjour "}]}"#).unwrap();
        let text = response
            .content
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.text);
        assert_eq!(text.as_deref(), Some(" Bonjour "));
    }
}
