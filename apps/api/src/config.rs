use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::generation::catalog::{default_audiences, default_tones, CatalogOption, OptionCatalog};
use crate::generation::invoker::{RetryPolicy, SamplingParams};
use crate::generation::metrics::PricingTable;
use crate::generation::validator::ValidationLimits;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
/// Read-only after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub model_timeout: Duration,
    pub retry: RetryPolicy,
    pub sampling: SamplingParams,
    pub limits: ValidationLimits,
    pub variant_concurrency: usize,
    pub pricing: PricingTable,
    pub tones: Vec<CatalogOption>,
    pub audiences: Vec<CatalogOption>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let tones = match std::env::var("POST_TONES") {
            Ok(raw) => parse_options(&raw).context("POST_TONES is invalid")?,
            Err(_) => default_tones(),
        };
        let audiences = match std::env::var("POST_AUDIENCES") {
            Ok(raw) => parse_options(&raw).context("POST_AUDIENCES is invalid")?,
            Err(_) => default_audiences(),
        };

        let max_variants: usize = env_or("MAX_VARIANTS", 5)?;
        if max_variants == 0 {
            bail!("MAX_VARIANTS must be at least 1");
        }

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            model_timeout: Duration::from_secs(env_or("MODEL_TIMEOUT_SECS", 30)?),
            retry: RetryPolicy {
                max_retries: env_or("MODEL_MAX_RETRIES", 1)?,
                base_backoff: Duration::from_millis(env_or("MODEL_BACKOFF_BASE_MS", 250)?),
                max_backoff: Duration::from_millis(env_or("MODEL_BACKOFF_CAP_MS", 2000)?),
            },
            sampling: SamplingParams {
                max_tokens: env_or("MODEL_MAX_TOKENS", 1024)?,
                temperature: env_or("MODEL_TEMPERATURE", 0.7)?,
            },
            limits: ValidationLimits {
                max_topic_chars: env_or("MAX_TOPIC_CHARS", 500)?,
                max_variants,
            },
            variant_concurrency: env_or("VARIANT_CONCURRENCY", 5)?,
            pricing: PricingTable {
                prompt_usd_per_mtok: env_or("PRICE_PROMPT_PER_MTOK", 3.0)?,
                completion_usd_per_mtok: env_or("PRICE_COMPLETION_PER_MTOK", 15.0)?,
            },
            tones,
            audiences,
        })
    }

    pub fn catalog(&self) -> OptionCatalog {
        OptionCatalog::new(self.tones.clone(), self.audiences.clone())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Parses "professional=Professional, casual" into catalog options.
/// A bare value uses itself as the label. Duplicates and empty lists are rejected.
pub fn parse_options(raw: &str) -> Result<Vec<CatalogOption>> {
    let mut options: Vec<CatalogOption> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (value, label) = match entry.split_once('=') {
            Some((value, label)) => (value.trim(), label.trim()),
            None => (entry, entry),
        };
        if value.is_empty() {
            bail!("entry '{entry}' has an empty value");
        }
        let option = CatalogOption::new(value, if label.is_empty() { value } else { label });
        if options.iter().any(|o| o.value == option.value) {
            bail!("duplicate value '{}'", option.value);
        }
        options.push(option);
    }
    if options.is_empty() {
        bail!("at least one option is required");
    }
    Ok(options)
}
