pub mod chunker;
pub mod mock;
pub mod orchestrator;

pub use chunker::{chunk_text, DEFAULT_CHUNK_SIZE};
pub use orchestrator::AutomaticTranslator;

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-call translation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOptions {
    pub target_language: String,
    /// `None` lets each provider apply its own auto-detect convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    /// Pin every chunk to this provider (matched case-insensitively) and disable fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_provider: Option<String>,
}

impl TranslationOptions {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = Some(source_language.into());
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.specific_provider = Some(provider.into());
        self
    }

    /// Chunk size to use for this call. Zero falls back to the default.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size
            .filter(|&size| size > 0)
            .unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    /// Source language, or `fallback` when the caller asked for auto-detection.
    pub fn source_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.source_language
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(fallback)
    }
}

/// Outcome of a successful translation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    /// Translated chunks joined with a single space.
    pub translated_text: String,
    /// Provider that produced the last chunk.
    pub provider: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub name: String,
    pub available: bool,
}

/// A translation backend backed by one external service.
///
/// Providers own their availability flag: a provider that detects remote
/// throttling marks itself unavailable and reports `ErrorKind::RateLimit`.
/// Nothing clears the flag automatically.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> std::result::Result<String, ProviderError>;
    fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = TranslationOptions::new("es")
            .with_source("en")
            .with_chunk_size(120)
            .with_provider("Lingva");
        assert_eq!(options.target_language, "es");
        assert_eq!(options.source_language.as_deref(), Some("en"));
        assert_eq!(options.chunk_size, Some(120));
        assert_eq!(options.specific_provider.as_deref(), Some("Lingva"));
    }

    #[test]
    fn test_effective_chunk_size() {
        assert_eq!(TranslationOptions::new("es").effective_chunk_size(), 300);
        assert_eq!(
            TranslationOptions::new("es").with_chunk_size(0).effective_chunk_size(),
            300
        );
        assert_eq!(
            TranslationOptions::new("es").with_chunk_size(50).effective_chunk_size(),
            50
        );
    }

    #[test]
    fn test_source_or() {
        assert_eq!(TranslationOptions::new("es").source_or("auto"), "auto");
        assert_eq!(
            TranslationOptions::new("es").with_source("fr").source_or("auto"),
            "fr"
        );
        assert_eq!(
            TranslationOptions::new("es").with_source("").source_or("en"),
            "en"
        );
    }

    #[test]
    fn test_options_wire_format() {
        let options: TranslationOptions = serde_json::from_str(
            r#"{"targetLanguage":"de","sourceLanguage":"en","specificProvider":"DeepL"}"#,
        )
        .unwrap();
        assert_eq!(options.target_language, "de");
        assert_eq!(options.source_language.as_deref(), Some("en"));
        assert_eq!(options.chunk_size, None);
        assert_eq!(options.specific_provider.as_deref(), Some("DeepL"));
    }

    #[test]
    fn test_result_wire_format() {
        let result = TranslationResult {
            translated_text: "Hola mundo".to_string(),
            provider: "MyMemory".to_string(),
            chunks: 1,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["translatedText"], "Hola mundo");
        assert_eq!(json["provider"], "MyMemory");
        assert_eq!(json["chunks"], 1);
    }
}
