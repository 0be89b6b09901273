//! Translation backends, one per external service.
//!
//! Every backend is a thin HTTP call: build the request, map the status and
//! payload onto [`ProviderError`], and flip its own availability flag when the
//! service signals throttling.

pub mod anthropic;
pub mod deepl;
pub mod gemini;
pub mod google;
pub mod huggingface;
pub mod libretranslate;
pub mod lingva;
pub mod mymemory;
pub mod openai;
pub mod yandex;

pub use anthropic::AnthropicProvider;
pub use deepl::DeepLProvider;
pub use gemini::GeminiProvider;
pub use google::GoogleTranslateProvider;
pub use huggingface::HuggingFaceProvider;
pub use libretranslate::LibreTranslateProvider;
pub use lingva::LingvaProvider;
pub use mymemory::MyMemoryProvider;
pub use openai::OpenAiProvider;
pub use yandex::YandexProvider;

use crate::config::Config;
use crate::error::ProviderError;
use crate::translate::{Provider, TranslationOptions};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Request timeout for the free public services.
pub const PUBLIC_TIMEOUT: Duration = Duration::from_secs(10);

/// Request timeout for LLM-backed services and Google.
pub const LLM_TIMEOUT: Duration = Duration::from_secs(15);

/// Availability flag owned by a single provider.
///
/// Starts available and only ever flips to unavailable, when the provider sees
/// the service throttling it.
#[derive(Debug)]
pub struct Availability(AtomicBool);

impl Availability {
    pub fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    pub fn is_available(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Mark unavailable and return the matching rate-limit error.
    pub fn rate_limited(&self, provider: &str) -> ProviderError {
        if self.0.swap(false, Ordering::SeqCst) {
            warn!("{} rate limited, marking unavailable", provider);
        }
        ProviderError::rate_limit(provider)
    }
}

impl Default for Availability {
    fn default() -> Self {
        Self::new()
    }
}

/// Panics only if the TLS backend cannot be initialised, the same condition
/// under which `Client::new` panics.
pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to initialise HTTP client")
}

/// Send a request and read the full body.
pub(crate) async fn send(
    provider: &str,
    request: RequestBuilder,
) -> Result<(StatusCode, String), ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, &e))?;

    let status = response.status();
    debug!("{} response status: {}", provider, status);

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, &e))?;

    Ok((status, body))
}

/// Map a non-success status onto a provider error.
///
/// 429 marks the provider unavailable.
pub(crate) fn status_error(
    provider: &str,
    status: StatusCode,
    body: &str,
    availability: &Availability,
) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => availability.rate_limited(provider),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::api(provider, "Invalid API key")
        }
        _ => ProviderError::api(
            provider,
            format!("{} API error ({}): {}", provider, status, truncate(body, 200)),
        ),
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(provider: &str, body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| {
        debug!("{} returned unparseable body: {}", provider, e);
        invalid_response(provider)
    })
}

pub(crate) fn invalid_response(provider: &str) -> ProviderError {
    ProviderError::api(provider, format!("Invalid response from {}", provider))
}

pub(crate) fn require_key(provider: &str, api_key: &str) -> Result<(), ProviderError> {
    if api_key.trim().is_empty() {
        return Err(ProviderError::api(
            provider,
            format!("{} API key is required", provider),
        ));
    }
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

/// Prompt shared by the LLM-backed providers.
pub(crate) fn translation_prompt(text: &str, options: &TranslationOptions) -> String {
    let source = match options.source_language.as_deref() {
        Some(code) if !code.trim().is_empty() => language_name(code).unwrap_or(code),
        _ => "auto-detect",
    };
    let target = language_name(&options.target_language).unwrap_or(&options.target_language);

    format!(
        "Translate the following text from {} to {}. Only return the translation, no explanations:\n\n{}",
        source, target, text
    )
}

pub(crate) const TRANSLATOR_SYSTEM_PROMPT: &str =
    "You are a professional translator. Translate text accurately and only return the translation.";

/// Human-readable name for a language code, for better prompting.
pub fn language_name(code: &str) -> Option<&'static str> {
    let name = match code.to_lowercase().as_str() {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        "ms" => "Malay",
        "tl" => "Tagalog",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "cs" => "Czech",
        "sv" => "Swedish",
        "da" => "Danish",
        "fi" => "Finnish",
        "no" => "Norwegian",
        "el" => "Greek",
        "he" => "Hebrew",
        "hu" => "Hungarian",
        "ro" => "Romanian",
        "bg" => "Bulgarian",
        "hr" => "Croatian",
        "sk" => "Slovak",
        "sl" => "Slovenian",
        "lt" => "Lithuanian",
        "lv" => "Latvian",
        "et" => "Estonian",
        "bn" => "Bengali",
        _ => return None,
    };
    Some(name)
}

/// The free services that work without an API key, in fallback order.
pub fn default_providers() -> Vec<Arc<dyn Provider>> {
    free_providers(&Config::default())
}

/// Free services configured from `config`, followed by every keyed service
/// whose API key is present.
pub fn create_providers(config: &Config) -> Vec<Arc<dyn Provider>> {
    let mut providers = free_providers(config);

    if let Some(ref key) = config.gemini_api_key {
        let mut gemini = GeminiProvider::new(key.clone());
        if let Some(ref model) = config.gemini_model {
            gemini = gemini.with_model(model.clone());
        }
        providers.push(Arc::new(gemini));
    }
    if let Some(ref key) = config.openai_api_key {
        let mut openai = OpenAiProvider::openai(key.clone());
        if let Some(ref model) = config.openai_model {
            openai = openai.with_model(model.clone());
        }
        providers.push(Arc::new(openai));
    }
    if let Some(ref key) = config.anthropic_api_key {
        let mut anthropic = AnthropicProvider::new(key.clone());
        if let Some(ref model) = config.anthropic_model {
            anthropic = anthropic.with_model(model.clone());
        }
        providers.push(Arc::new(anthropic));
    }
    if let Some(ref key) = config.groq_api_key {
        let mut groq = OpenAiProvider::groq(key.clone());
        if let Some(ref model) = config.groq_model {
            groq = groq.with_model(model.clone());
        }
        providers.push(Arc::new(groq));
    }
    if let Some(ref key) = config.deepl_api_key {
        providers.push(Arc::new(DeepLProvider::new(key.clone(), config.deepl_use_free_api)));
    }

    info!(
        "Registered {} providers: {}",
        providers.len(),
        providers
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    providers
}

/// The keyless services, with any endpoint overrides from `config` applied.
fn free_providers(config: &Config) -> Vec<Arc<dyn Provider>> {
    let mut libre = LibreTranslateProvider::new();
    if let Some(ref url) = config.libretranslate_url {
        libre = libre.with_base_url(url.clone());
    }
    if let Some(ref key) = config.libretranslate_api_key {
        libre = libre.with_api_key(key.clone());
    }

    let mut lingva = LingvaProvider::new();
    if let Some(ref url) = config.lingva_url {
        lingva = lingva.with_base_url(url.clone());
    }

    vec![
        Arc::new(MyMemoryProvider::new()),
        Arc::new(libre),
        Arc::new(HuggingFaceProvider::new(config.huggingface_api_key.clone())),
        Arc::new(lingva),
        Arc::new(GoogleTranslateProvider::new()),
        Arc::new(YandexProvider::new()),
    ]
}
