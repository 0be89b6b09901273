use crate::config::Config;
use crate::error::{AttemptFailure, AutotranslateError, ProviderError, Result};
use crate::providers;
use crate::translate::{chunk_text, Provider, ProviderStatus, TranslationOptions, TranslationResult};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of offering one chunk to one provider.
enum Attempt {
    Success(String),
    /// Provider reported itself unavailable and was not contacted.
    Skipped,
    RateLimited(ProviderError),
    Failed(ProviderError),
}

/// Translates text by chunking it and rotating through providers until one succeeds.
///
/// The rotation cursor persists across calls: after a success the next chunk
/// (and the next call) starts at the provider that just succeeded. The cursor
/// is atomic, so concurrent calls are safe, but their rotations interleave and
/// round-robin fairness across concurrent calls is best effort.
pub struct AutomaticTranslator {
    providers: Vec<Arc<dyn Provider>>,
    cursor: AtomicUsize,
}

impl AutomaticTranslator {
    /// Create a translator over the given providers, tried in order.
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            providers,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Translator over the free services that need no API key.
    pub fn with_defaults() -> Self {
        Self::new(providers::default_providers())
    }

    /// Free services plus every keyed service configured in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(providers::create_providers(config))
    }

    /// Append a provider. Registration order is fallback order.
    pub fn add_provider(&mut self, provider: Arc<dyn Provider>) {
        self.providers.push(provider);
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Index of the provider the next automatic attempt starts from.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Translate `text`, falling back across providers unless one is pinned.
    ///
    /// Either every chunk is translated or the call fails; partial
    /// translations are never returned.
    pub async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<TranslationResult> {
        if text.trim().is_empty() {
            return Err(AutotranslateError::EmptyText);
        }
        if options.target_language.trim().is_empty() {
            return Err(AutotranslateError::MissingTargetLanguage);
        }

        // A blank provider name means automatic mode.
        let requested = options
            .specific_provider
            .as_deref()
            .filter(|name| !name.trim().is_empty());
        let pinned = match requested {
            Some(requested) => Some(self.find_provider(requested)?),
            None => None,
        };

        let chunks = chunk_text(text, options.effective_chunk_size());
        let start_time = Instant::now();

        debug!(
            "Translating {} chars in {} chunk(s) to {}",
            text.chars().count(),
            chunks.len(),
            options.target_language
        );

        let (translated, provider) = match pinned {
            Some(provider) => self.translate_pinned(provider, &chunks, options).await?,
            None => self.translate_automatic(&chunks, options).await?,
        };

        info!(
            "Translated {} chunk(s) to {} using {} in {:.2}s",
            chunks.len(),
            options.target_language,
            provider,
            start_time.elapsed().as_secs_f64()
        );

        Ok(TranslationResult {
            translated_text: translated.join(" "),
            provider,
            chunks: chunks.len(),
        })
    }

    /// Translate independent texts concurrently, preserving input order.
    ///
    /// Fails as a whole if any text fails.
    pub async fn translate_batch<S>(
        &self,
        texts: &[S],
        options: &TranslationOptions,
        concurrency: usize,
    ) -> Result<Vec<TranslationResult>>
    where
        S: AsRef<str> + Sync,
    {
        self.translate_batch_with_progress(texts, options, concurrency, || {})
            .await
    }

    /// Like [`translate_batch`](Self::translate_batch), calling `on_done`
    /// after each text finishes successfully.
    pub async fn translate_batch_with_progress<S, F>(
        &self,
        texts: &[S],
        options: &TranslationOptions,
        concurrency: usize,
        on_done: F,
    ) -> Result<Vec<TranslationResult>>
    where
        S: AsRef<str> + Sync,
        F: Fn() + Sync,
    {
        info!(
            "Batch translating {} text(s) with {} concurrent calls",
            texts.len(),
            concurrency.max(1)
        );

        let on_done = &on_done;
        // Plain futures, no borrowing closure in the stream type, so the
        // returned future stays `Send` for server handlers.
        let mut pending = Vec::with_capacity(texts.len());
        for text in texts {
            let text: &str = text.as_ref();
            pending.push(async move {
                let result = self.translate(text, options).await;
                if result.is_ok() {
                    on_done();
                }
                result
            });
        }

        stream::iter(pending)
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }

    /// Rewind the rotation to the first provider.
    ///
    /// Availability flags belong to the providers and are left untouched.
    pub fn reset_rotation(&self) {
        self.cursor.store(0, Ordering::SeqCst);
        debug!("Provider rotation reset");
    }

    /// Names of providers currently reporting available, in registration order.
    pub fn list_available(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn list_all(&self) -> Vec<ProviderStatus> {
        self.providers
            .iter()
            .map(|p| ProviderStatus {
                name: p.name().to_string(),
                available: p.is_available(),
            })
            .collect()
    }

    fn find_provider(&self, requested: &str) -> Result<&dyn Provider> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(requested))
            .ok_or_else(|| AutotranslateError::UnknownProvider {
                requested: requested.to_string(),
                registered: self.providers.iter().map(|p| p.name().to_string()).collect(),
            })?;

        if !provider.is_available() {
            return Err(AutotranslateError::ProviderUnavailable(
                provider.name().to_string(),
            ));
        }

        Ok(provider.as_ref())
    }

    async fn translate_pinned(
        &self,
        provider: &dyn Provider,
        chunks: &[String],
        options: &TranslationOptions,
    ) -> Result<(Vec<String>, String)> {
        let mut translated = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            debug!("Chunk {} -> {}", index + 1, provider.name());
            match provider.translate(chunk, options).await {
                Ok(text) => translated.push(text),
                Err(e) if e.is_rate_limit() => {
                    warn!("{} rate limited on chunk {}", provider.name(), index + 1);
                    return Err(AutotranslateError::ProviderRateLimited(
                        provider.name().to_string(),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok((translated, provider.name().to_string()))
    }

    async fn translate_automatic(
        &self,
        chunks: &[String],
        options: &TranslationOptions,
    ) -> Result<(Vec<String>, String)> {
        let mut translated = Vec::with_capacity(chunks.len());
        let mut used_provider = String::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let (text, name) = self.dispatch_chunk(index, chunk, options).await?;
            translated.push(text);
            used_provider = name;
        }

        Ok((translated, used_provider))
    }

    /// Offer one chunk to up to one full rotation of providers.
    async fn dispatch_chunk(
        &self,
        index: usize,
        chunk: &str,
        options: &TranslationOptions,
    ) -> Result<(String, String)> {
        let total = self.providers.len();
        let mut failures = Vec::new();

        for _ in 0..total {
            let provider = &self.providers[self.cursor() % total];
            let name = provider.name();

            match attempt(provider.as_ref(), chunk, options).await {
                Attempt::Success(text) => {
                    debug!("Chunk {} translated by {}", index + 1, name);
                    return Ok((text, name.to_string()));
                }
                Attempt::Skipped => {
                    debug!("Skipping unavailable provider {}", name);
                    failures.push(AttemptFailure::skipped(name));
                }
                Attempt::RateLimited(e) => {
                    warn!("{} rate limited on chunk {}, rotating", name, index + 1);
                    failures.push(AttemptFailure::failed(name, &e));
                }
                Attempt::Failed(e) => {
                    warn!("Chunk {} failed on {}: {}", index + 1, name, e);
                    failures.push(AttemptFailure::failed(name, &e));
                }
            }

            self.advance(total);
        }

        Err(AutotranslateError::AllProvidersFailed {
            chunk: index,
            attempts: failures,
        })
    }

    fn advance(&self, total: usize) {
        let _ = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some((c + 1) % total));
    }
}

async fn attempt(provider: &dyn Provider, chunk: &str, options: &TranslationOptions) -> Attempt {
    if !provider.is_available() {
        return Attempt::Skipped;
    }

    match provider.translate(chunk, options).await {
        Ok(text) => Attempt::Success(text),
        Err(e) if e.is_rate_limit() => Attempt::RateLimited(e),
        Err(e) => Attempt::Failed(e),
    }
}
