use crate::error::ProviderError;
use crate::providers::{
    http_client, invalid_response, parse_json, require_key, send, status_error,
    translation_prompt, Availability, LLM_TIMEOUT, TRANSLATOR_SYSTEM_PROMPT,
};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_MODEL: &str = "gpt-3.5-turbo";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const GROQ_MODEL: &str = "llama-3.1-70b-versatile";

/// Any OpenAI-compatible chat completions API. OpenAI and Groq are preset.
pub struct OpenAiProvider {
    client: Client,
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    availability: Availability,
}

impl OpenAiProvider {
    pub fn new(
        name: impl Into<String>,
        api_key: String,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: http_client(LLM_TIMEOUT),
            name: name.into(),
            api_key,
            model: model.into(),
            base_url: base_url.into(),
            availability: Availability::new(),
        }
    }

    pub fn openai(api_key: String) -> Self {
        Self::new("OpenAI", api_key, OPENAI_BASE_URL, OPENAI_MODEL)
    }

    pub fn groq(api_key: String) -> Self {
        Self::new("Groq", api_key, GROQ_BASE_URL, GROQ_MODEL)
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

    fn request_body(&self, text: &str, options: &TranslationOptions) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: TRANSLATOR_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: translation_prompt(text, options),
                },
            ],
            temperature: 0.3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<String, ProviderError> {
        require_key(&self.name, &self.api_key)?;

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text, options));

        let (status, body) = send(&self.name, request).await?;
        if !status.is_success() {
            return Err(status_error(&self.name, status, &body, &self.availability));
        }

        let response: ChatResponse = parse_json(&self.name, &body)?;
        response
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid_response(&self.name))
    }

    fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}
