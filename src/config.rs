use crate::error::{AutotranslateError, Result};
use crate::translate::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Runtime settings. Every field can come from `config.toml`, `.env` or the
/// process environment, in increasing order of precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub chunk_size: usize,
    pub concurrency: usize,

    pub huggingface_api_key: Option<String>,
    pub libretranslate_url: Option<String>,
    pub libretranslate_api_key: Option<String>,
    pub lingva_url: Option<String>,

    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: Option<String>,
    pub groq_api_key: Option<String>,
    pub groq_model: Option<String>,
    pub deepl_api_key: Option<String>,
    pub deepl_use_free_api: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            huggingface_api_key: None,
            libretranslate_url: None,
            libretranslate_api_key: None,
            lingva_url: None,
            gemini_api_key: None,
            gemini_model: None,
            openai_api_key: None,
            openai_model: None,
            anthropic_api_key: None,
            anthropic_model: None,
            groq_api_key: None,
            groq_model: None,
            deepl_api_key: None,
            deepl_use_free_api: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a TOML file. A malformed file is reported and ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        match toml::from_str::<Config>(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("Ignoring malformed config {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Override fields from `lookup`, which is `std::env::var` outside tests.
    /// Unparseable numbers and blank strings leave the current value alone.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = var("PORT").and_then(|v| v.trim().parse().ok()) {
            self.port = port;
        }
        if let Some(size) = var("AUTOTRANSLATE_CHUNK_SIZE").and_then(|v| v.trim().parse().ok()) {
            self.chunk_size = size;
        }
        if let Some(c) = var("AUTOTRANSLATE_CONCURRENCY").and_then(|v| v.trim().parse().ok()) {
            self.concurrency = c;
        }

        let strings: [(&str, &mut Option<String>); 13] = [
            ("HUGGINGFACE_API_KEY", &mut self.huggingface_api_key),
            ("LIBRETRANSLATE_URL", &mut self.libretranslate_url),
            ("LIBRETRANSLATE_API_KEY", &mut self.libretranslate_api_key),
            ("LINGVA_URL", &mut self.lingva_url),
            ("GEMINI_API_KEY", &mut self.gemini_api_key),
            ("GEMINI_MODEL", &mut self.gemini_model),
            ("OPENAI_API_KEY", &mut self.openai_api_key),
            ("OPENAI_MODEL", &mut self.openai_model),
            ("ANTHROPIC_API_KEY", &mut self.anthropic_api_key),
            ("ANTHROPIC_MODEL", &mut self.anthropic_model),
            ("GROQ_API_KEY", &mut self.groq_api_key),
            ("GROQ_MODEL", &mut self.groq_model),
            ("DEEPL_API_KEY", &mut self.deepl_api_key),
        ];
        for (key, slot) in strings {
            if let Some(value) = var(key) {
                *slot = Some(value);
            }
        }

        if let Some(flag) = var("DEEPL_USE_FREE_API") {
            self.deepl_use_free_api = flag.trim() != "false";
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(AutotranslateError::Config(
                "Chunk size must be greater than 0".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(AutotranslateError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(AutotranslateError::Config(
                "Port must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("autotranslate").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.chunk_size, 300);
        assert_eq!(config.concurrency, 4);
        assert!(config.deepl_use_free_api);
        assert!(config.gemini_api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("PORT", "8080"),
            ("AUTOTRANSLATE_CHUNK_SIZE", "120"),
            ("GEMINI_API_KEY", "g-key"),
            ("GROQ_MODEL", "llama-3.3-70b-versatile"),
            ("LIBRETRANSLATE_URL", "http://localhost:5000"),
        ]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.chunk_size, 120);
        assert_eq!(config.gemini_api_key.as_deref(), Some("g-key"));
        assert_eq!(config.groq_model.as_deref(), Some("llama-3.3-70b-versatile"));
        assert_eq!(config.libretranslate_url.as_deref(), Some("http://localhost:5000"));
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_env_ignores_blank_and_garbage() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("PORT", "not-a-port"),
            ("AUTOTRANSLATE_CONCURRENCY", "-2"),
            ("OPENAI_API_KEY", "   "),
        ]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.concurrency, 4);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_deepl_free_flag() {
        let mut config = Config::default();
        config.apply_env(env(&[("DEEPL_USE_FREE_API", "false")]));
        assert!(!config.deepl_use_free_api);

        config.apply_env(env(&[("DEEPL_USE_FREE_API", "0")]));
        assert!(config.deepl_use_free_api);
    }

    #[test]
    fn test_validate_rejects_zero() {
        let mut config = Config::default();
        config.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 4000\ndeepl_api_key = \"d-key\"\ndeepl_use_free_api = false").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.chunk_size, 300);
        assert_eq!(config.deepl_api_key.as_deref(), Some("d-key"));
        assert!(!config.deepl_use_free_api);
    }

    #[test]
    fn test_from_file_malformed_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"nope").unwrap();
        assert_eq!(Config::from_file(file.path()).unwrap(), Config::default());
    }
}
