use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{ProviderSettings, DEFAULT_API_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// No provider key lives here: candidates supply their own per request.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub openrouter_api_url: String,
    pub openrouter_model: String,
    pub app_referer: String,
    pub app_title: String,
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let port: u16 = env_or("PORT", "8080")
            .parse()
            .context("PORT must be a valid port number")?;

        Ok(Config {
            port,
            rust_log: env_or("RUST_LOG", "info"),
            openrouter_api_url: env_or("OPENROUTER_API_URL", DEFAULT_API_URL),
            openrouter_model: env_or("OPENROUTER_MODEL", DEFAULT_MODEL),
            app_referer: env_or("APP_REFERER", &format!("http://localhost:{port}")),
            app_title: env_or("APP_TITLE", "AI Mock Interview"),
            session_ttl: secs_env("SESSION_TTL_SECS", 3600)?,
            session_sweep_interval: secs_env("SESSION_SWEEP_INTERVAL_SECS", 300)?,
        })
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            api_url: self.openrouter_api_url.clone(),
            model: self.openrouter_model.clone(),
            referer: self.app_referer.clone(),
            title: self.app_title.clone(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secs_env(key: &str, default: u64) -> Result<Duration> {
    let secs = match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        Err(_) => default,
    };
    if secs == 0 {
        anyhow::bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
