use serde::Serialize;
use thiserror::Error;

/// Failure category reported by a translation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Remote throttling. The provider marks itself unavailable when it raises this.
    RateLimit,
    /// Malformed response, rejected credentials, unexpected payload shape.
    Api,
    /// Transport timeout or connection failure.
    Network,
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::RateLimit => write!(f, "RATE_LIMIT"),
            ErrorKind::Api => write!(f, "API_ERROR"),
            ErrorKind::Network => write!(f, "NETWORK_ERROR"),
            ErrorKind::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Error raised by a single provider call, tagged with the provider's name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{provider} ({kind}): {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub provider: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limit(provider: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, provider, "Rate limit exceeded")
    }

    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, provider, message)
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, provider, message)
    }

    pub fn unknown(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, provider, message)
    }

    /// Categorize a transport-level reqwest failure.
    pub fn from_reqwest(provider: impl Into<String>, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(provider, "Request timeout")
        } else if err.is_connect() {
            Self::network(provider, format!("Connection failed: {}", err))
        } else if err.is_decode() || err.is_body() {
            Self::api(provider, format!("Failed to read response: {}", err))
        } else if err.is_request() {
            Self::network(provider, format!("Request failed: {}", err))
        } else {
            Self::unknown(provider, err.to_string())
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        self.kind == ErrorKind::RateLimit
    }
}

/// One exhausted attempt in automatic mode: the provider tried and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub provider: String,
    pub reason: String,
}

impl AttemptFailure {
    pub fn skipped(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            reason: "unavailable".to_string(),
        }
    }

    pub fn failed(provider: impl Into<String>, err: &ProviderError) -> Self {
        Self {
            provider: provider.into(),
            reason: format!("{}: {}", err.kind, err.message),
        }
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum AutotranslateError {
    #[error("Text to translate cannot be empty")]
    EmptyText,

    #[error("Target language must be specified")]
    MissingTargetLanguage,

    #[error("Provider \"{requested}\" not found. Available providers: {}", .registered.join(", "))]
    UnknownProvider {
        requested: String,
        registered: Vec<String>,
    },

    #[error("Provider \"{0}\" is currently unavailable (rate limit may have been reached)")]
    ProviderUnavailable(String),

    #[error("Provider \"{0}\" rate limit exceeded")]
    ProviderRateLimited(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("All translation providers failed or are unavailable for chunk {}: {}", .chunk + 1, format_attempts(.attempts))]
    AllProvidersFailed {
        chunk: usize,
        attempts: Vec<AttemptFailure>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AutotranslateError {
    /// Caller mistakes detected before any provider is contacted.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AutotranslateError::EmptyText
                | AutotranslateError::MissingTargetLanguage
                | AutotranslateError::UnknownProvider { .. }
                | AutotranslateError::ProviderUnavailable(_)
        )
    }
}

fn format_attempts(attempts: &[AttemptFailure]) -> String {
    if attempts.is_empty() {
        return "no providers registered".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, AutotranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorKind::Api.to_string(), "API_ERROR");
        assert_eq!(ErrorKind::Network.to_string(), "NETWORK_ERROR");
        assert_eq!(ErrorKind::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::api("Lingva", "Invalid response from Lingva");
        assert_eq!(err.to_string(), "Lingva (API_ERROR): Invalid response from Lingva");
        assert!(!err.is_rate_limit());
        assert!(ProviderError::rate_limit("Lingva").is_rate_limit());
    }

    #[test]
    fn test_unknown_provider_lists_registry() {
        let err = AutotranslateError::UnknownProvider {
            requested: "Nonexistent".to_string(),
            registered: vec!["MyMemory".to_string(), "Lingva".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Provider \"Nonexistent\" not found. Available providers: MyMemory, Lingva"
        );
        assert!(err.is_precondition());
    }

    #[test]
    fn test_all_providers_failed_lists_attempts() {
        let err = AutotranslateError::AllProvidersFailed {
            chunk: 0,
            attempts: vec![
                AttemptFailure {
                    provider: "A".to_string(),
                    reason: "unavailable".to_string(),
                },
                AttemptFailure {
                    provider: "B".to_string(),
                    reason: "API_ERROR: boom".to_string(),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("chunk 1"));
        assert!(message.contains("A: unavailable"));
        assert!(message.contains("B: API_ERROR: boom"));
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_all_providers_failed_empty_registry() {
        let err = AutotranslateError::AllProvidersFailed {
            chunk: 0,
            attempts: Vec::new(),
        };
        assert!(err.to_string().contains("no providers registered"));
    }
}
