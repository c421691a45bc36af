use std::time::Duration;

use anyhow::{Context, Result};

use crate::extraction::scraper::DEFAULT_USER_AGENT;
use crate::llm_client::DEFAULT_API_URL;
use crate::session::DEFAULT_SESSION_IDLE_TTL;

/// Application configuration loaded from environment variables.
/// Every setting has a default; the generation credential is supplied by users at runtime.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub generation_api_url: String,
    pub scrape_timeout: Duration,
    pub scrape_user_agent: String,
    pub max_upload_bytes: usize,
    pub session_idle_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            generation_api_url: DEFAULT_API_URL.to_string(),
            scrape_timeout: Duration::from_secs(10),
            scrape_user_agent: DEFAULT_USER_AGENT.to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            session_idle_ttl: DEFAULT_SESSION_IDLE_TTL,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let parse = |key: &str, what: &str| -> Result<Option<u64>> {
            lookup(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{key} must be {what}"))
                })
                .transpose()
        };

        Ok(Config {
            port: lookup("PORT")
                .map(|v| v.trim().parse::<u16>())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(defaults.port),
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
            generation_api_url: lookup("GENERATION_API_URL").unwrap_or(defaults.generation_api_url),
            scrape_timeout: parse("SCRAPE_TIMEOUT_SECS", "a whole number of seconds")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.scrape_timeout),
            scrape_user_agent: lookup("SCRAPE_USER_AGENT").unwrap_or(defaults.scrape_user_agent),
            max_upload_bytes: parse("MAX_UPLOAD_BYTES", "a byte count")?
                .map(|v| v as usize)
                .unwrap_or(defaults.max_upload_bytes),
            session_idle_ttl: parse("SESSION_IDLE_TTL_SECS", "a whole number of seconds")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle_ttl),
        })
    }
}
