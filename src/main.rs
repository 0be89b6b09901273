use anyhow::{Context, Result};
use autotranslate::client::ApiClient;
use autotranslate::config::Config;
use autotranslate::server::{self, AppState};
use autotranslate::translate::{AutomaticTranslator, ProviderStatus, TranslationOptions, TranslationResult};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "autotranslate")]
#[command(version, about = "Translate text with automatic fallback across translation services")]
#[command(long_about = "Split text into chunks and translate it with free services (MyMemory, LibreTranslate, Lingva, ...) or AI models (Gemini, OpenAI, Anthropic, Groq, DeepL), moving to the next service whenever one fails.")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a piece of text
    Translate {
        /// Text to translate
        text: String,

        /// Target language code (e.g., es, fr, ja)
        target: String,

        /// Source language code (auto-detected when omitted)
        #[arg(short, long)]
        source: Option<String>,

        /// Use only this provider, without fallback
        #[arg(short, long)]
        provider: Option<String>,

        /// Maximum characters per chunk
        #[arg(short, long)]
        chunk_size: Option<usize>,

        /// Send the request to a running server instead of translating locally
        #[arg(long, env = "AUTOTRANSLATE_SERVER_URL")]
        server: Option<String>,
    },

    /// Translate every non-empty line of a file
    Batch {
        /// Input file, one text per line
        file: PathBuf,

        /// Target language code
        target: String,

        /// Source language code (auto-detected when omitted)
        #[arg(short, long)]
        source: Option<String>,

        /// Use only this provider, without fallback
        #[arg(short, long)]
        provider: Option<String>,

        /// Number of lines translated concurrently
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// List providers and their availability
    Providers {
        /// Query a running server instead of the local configuration
        #[arg(long, env = "AUTOTRANSLATE_SERVER_URL")]
        server: Option<String>,
    },

    /// Run the HTTP API server
    Serve {
        /// Port to listen on (defaults to $PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn build_options(
    target: String,
    source: Option<String>,
    provider: Option<String>,
    chunk_size: Option<usize>,
) -> TranslationOptions {
    let mut options = TranslationOptions::new(target);
    options.source_language = source;
    options.specific_provider = provider;
    options.chunk_size = chunk_size;
    options
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn print_translation(original: &str, result: &TranslationResult) {
    println!();
    println!("{}", style("Original:").blue().bold());
    println!("  {}", original);
    println!();
    println!("{}", style("Translation:").green().bold());
    println!("  {}", result.translated_text);
    println!();
    println!(
        "  {} {}   {} {}",
        style("Provider:").dim(),
        style(&result.provider).cyan(),
        style("Chunks:").dim(),
        result.chunks
    );
    println!();
}

fn print_providers(providers: &[ProviderStatus]) {
    let available = providers.iter().filter(|p| p.available).count();

    println!();
    println!("{}", style(format!("Total Providers: {}", providers.len())).green());
    println!("{}", style(format!("Available: {}", available)).green());
    println!();
    for p in providers {
        let status = if p.available {
            style("✓ Available").green()
        } else {
            style("✗ Unavailable").red()
        };
        println!("  {:<20} {}", p.name, status);
    }
    println!();
}

async fn run_translate(
    config: &Config,
    text: String,
    options: TranslationOptions,
    server_url: Option<String>,
) -> Result<()> {
    let result = match server_url {
        Some(url) => {
            info!("Using translation server at {}", url);
            ApiClient::new(url)
                .translate(&text, &options)
                .await
                .context("Remote translation failed")?
        }
        None => AutomaticTranslator::from_config(config)
            .translate(&text, &options)
            .await
            .context("Translation failed")?,
    };

    print_translation(&text, &result);
    Ok(())
}

async fn run_batch(
    config: &Config,
    file: &Path,
    options: TranslationOptions,
    concurrency: usize,
) -> Result<()> {
    let lines = read_lines(file)?;
    if lines.is_empty() {
        anyhow::bail!("No text found in {}", file.display());
    }

    let translator = AutomaticTranslator::from_config(config);

    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} texts ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let results = translator
        .translate_batch_with_progress(&lines, &options, concurrency, || pb.inc(1))
        .await;
    pb.finish_and_clear();
    let results = results.context("Batch translation failed")?;

    for result in &results {
        println!("{}", result.translated_text);
    }

    let mut providers: Vec<&str> = results.iter().map(|r| r.provider.as_str()).collect();
    providers.sort_unstable();
    providers.dedup();
    eprintln!(
        "{} Translated {} line(s) using {}",
        style("✓").green(),
        results.len(),
        providers.join(", ")
    );
    Ok(())
}

async fn run_providers(config: &Config, server_url: Option<String>) -> Result<()> {
    let providers = match server_url {
        Some(url) => {
            ApiClient::new(url)
                .list_all()
                .await
                .context("Failed to fetch providers from server")?
                .providers
        }
        None => AutomaticTranslator::from_config(config).list_all(),
    };

    print_providers(&providers);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Translate {
            text,
            target,
            source,
            provider,
            chunk_size,
            server,
        } => {
            let chunk_size = chunk_size.or(Some(config.chunk_size));
            let options = build_options(target, source, provider, chunk_size);
            run_translate(&config, text, options, server).await
        }
        Command::Batch {
            file,
            target,
            source,
            provider,
            concurrency,
        } => {
            if let Some(c) = concurrency {
                config.concurrency = c;
            }
            config
                .validate()
                .context("Configuration validation failed")?;
            let options = build_options(target, source, provider, Some(config.chunk_size));
            run_batch(&config, &file, options, config.concurrency).await
        }
        Command::Providers { server } => run_providers(&config, server).await,
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            config
                .validate()
                .context("Configuration validation failed")?;

            let translator = Arc::new(AutomaticTranslator::from_config(&config));
            let state = AppState::new(translator).with_concurrency(config.concurrency);
            server::serve(state, config.port)
                .await
                .context("Server failed")
        }
    }
}
