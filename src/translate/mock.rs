//! Scripted provider for exercising the fallback logic without network access.

use crate::error::{ErrorKind, ProviderError};
use crate::translate::{Provider, TranslationOptions};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// How a [`MockProvider`] answers each call.
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the target language: "hello" → "hello_es".
    Suffix,
    /// Every call fails with this kind. `RateLimit` also marks the mock unavailable.
    Fail(ErrorKind),
    /// Succeed (as `Suffix`) for the first `n` calls, then fail with the given kind.
    FailAfter(usize, ErrorKind),
}

pub struct MockProvider {
    name: String,
    mode: MockMode,
    available: AtomicBool,
    calls: AtomicUsize,
    received: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>, mode: MockMode) -> Self {
        Self {
            name: name.into(),
            mode,
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Start out unavailable, as if throttled by an earlier call.
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of times `translate` was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts received, in call order.
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .map(|texts| texts.clone())
            .unwrap_or_default()
    }

    fn fail(&self, kind: ErrorKind) -> ProviderError {
        if kind == ErrorKind::RateLimit {
            self.available.store(false, Ordering::SeqCst);
            return ProviderError::rate_limit(&self.name);
        }
        ProviderError::new(kind, &self.name, "Mock failure")
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        text: &str,
        options: &TranslationOptions,
    ) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.push(text.to_string());
        }

        match self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, options.target_language)),
            MockMode::Fail(kind) => Err(self.fail(kind)),
            MockMode::FailAfter(n, _) if call < n => {
                Ok(format!("{}_{}", text, options.target_language))
            }
            MockMode::FailAfter(_, kind) => Err(self.fail(kind)),
        }
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_suffix_mode() {
        let mock = MockProvider::new("Mock", MockMode::Suffix);
        let result = mock
            .translate("hello", &TranslationOptions::new("fr"))
            .await
            .unwrap();
        assert_eq!(result, "hello_fr");
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.received(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_rate_limit_marks_unavailable() {
        let mock = MockProvider::new("Mock", MockMode::Fail(ErrorKind::RateLimit));
        assert!(mock.is_available());
        let err = mock
            .translate("hello", &TranslationOptions::new("fr"))
            .await
            .unwrap_err();
        assert!(err.is_rate_limit());
        assert!(!mock.is_available());
    }

    #[test]
    fn test_unavailable_still_answers_direct_calls() {
        let mock = MockProvider::new("Mock", MockMode::Suffix).unavailable();
        assert!(!mock.is_available());

        // Skipping unavailable providers is the orchestrator's job.
        let result = tokio_test::block_on(mock.translate("hi", &TranslationOptions::new("it")));
        assert_eq!(result.unwrap(), "hi_it");

        mock.set_available(true);
        assert!(mock.is_available());
    }

    #[tokio::test]
    async fn test_fail_after() {
        let mock = MockProvider::new("Mock", MockMode::FailAfter(1, ErrorKind::Network));
        let options = TranslationOptions::new("de");
        assert!(mock.translate("a", &options).await.is_ok());
        let err = mock.translate("b", &options).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(mock.is_available());
    }
}
