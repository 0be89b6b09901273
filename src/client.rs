//! Client for a running translation server.

use crate::error::{AutotranslateError, Result};
use crate::translate::{ProviderStatus, TranslationOptions, TranslationResult};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest<'a> {
    text: &'a str,
    target_language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a str>,
}

impl<'a> TranslateRequest<'a> {
    fn new(text: &'a str, options: &'a TranslationOptions) -> Self {
        Self {
            text,
            target_language: &options.target_language,
            source_language: options.source_language.as_deref(),
            chunk_size: options.chunk_size,
            provider: options.specific_provider.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AllProviders {
    pub providers: Vec<ProviderStatus>,
    pub total: usize,
    pub available: usize,
}

#[derive(Deserialize)]
struct ProviderNames {
    providers: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to initialise HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<TranslationResult> {
        debug!("POST {}/translate", self.base_url);

        let body = TranslateRequest::new(text, options);
        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&body)
            .send()
            .await?;

        // `success` sits next to the result fields and is ignored.
        Self::read(response).await
    }

    pub async fn list_all(&self) -> Result<AllProviders> {
        let response = self
            .client
            .get(format!("{}/providers/all", self.base_url))
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn list_available(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/providers", self.base_url))
            .send()
            .await?;
        let names: ProviderNames = Self::read(response).await?;
        Ok(names.providers)
    }

    /// Rewind the server's rotation; returns the providers still available.
    pub async fn reset(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .post(format!("{}/providers/reset", self.base_url))
            .send()
            .await?;
        let names: ProviderNames = Self::read(response).await?;
        Ok(names.providers)
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("Server returned {}", status));
            return Err(AutotranslateError::Api(message));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(ApiClient::new("http://localhost:3000/").base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_request_body_shape() {
        let options = TranslationOptions::new("es").with_provider("Lingva");
        let body = serde_json::to_value(TranslateRequest::new("Hello", &options)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"text": "Hello", "targetLanguage": "es", "provider": "Lingva"})
        );
    }
}
