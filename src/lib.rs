pub mod client;
pub mod config;
pub mod error;
pub mod providers;
pub mod server;
pub mod translate;

pub use client::ApiClient;
pub use config::Config;
pub use error::{AutotranslateError, ErrorKind, ProviderError, Result};
pub use translate::{
    chunk_text, AutomaticTranslator, Provider, ProviderStatus, TranslationOptions,
    TranslationResult,
};
