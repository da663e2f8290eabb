use std::path::PathBuf;

use anyhow::{bail, Result};

/// Runtime configuration, read from the environment once at startup and
/// passed into the service explicitly. The template-field core takes no
/// configuration at all.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_timeout_s: u64,
    /// Static bearer token for /brief/fill; auth is disabled when unset.
    pub service_token: Option<String>,
    pub template_path: PathBuf,
    pub port: u16,
}

impl Config {
    /// Read configuration from the environment (after dotenv loading).
    pub fn from_env() -> Result<Self> {
        let openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        if openai_api_key.is_empty() {
            bail!("OPENAI_API_KEY is not set");
        }

        Ok(Self {
            openai_api_key,
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_timeout_s: env_or("OPENAI_TIMEOUT_S", "60").parse().unwrap_or(60),
            service_token: std::env::var("SERVICE_TOKEN").ok().filter(|t| !t.is_empty()),
            template_path: env_or("TEMPLATE_PATH", "Plantilla_MD.md").into(),
            port: env_or("PORT", "8000").parse::<u16>().unwrap_or(8000),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
