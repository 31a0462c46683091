use std::{env, fs, str::FromStr, time::Duration};

use anyhow::{Context, Error, Result, anyhow};

use crate::ai::prompt::render_persona;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub allowed_origins: Vec<String>,
    pub db_path: String,
    pub openrouter_api_hostname: String,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub openrouter_referer: String,
    pub openrouter_title: String,
    pub system_message: String,
    pub history_limit: usize,
    pub max_message_chars: usize,
    pub max_tokens: u32,
    pub temperature: f64,
    pub upstream_timeout: Duration,
}

impl AppConfig {
    /// Read the config from the process environment. Call once at
    /// startup and pass the result around.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Every setting has a
    /// default, only malformed values are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let allowed_origins = var("ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let db_path = var("DB_PATH", "chat_history.db");
        let openrouter_api_hostname = var("OPENROUTER_API_HOSTNAME", "https://openrouter.ai/api");
        let openrouter_api_key = var("OPENROUTER_API_KEY", "");
        let openrouter_model = var("OPENROUTER_MODEL", "mistralai/mistral-7b-instruct:free");
        let openrouter_referer = var("OPENROUTER_REFERER", "http://localhost:3000");
        let openrouter_title = var("OPENROUTER_TITLE", "Portfolio AI Chat");

        let system_message = match lookup("RELAY_SYSTEM_MESSAGE") {
            Some(msg) => msg,
            None => {
                let name = var("PERSONA_NAME", "the site owner");
                let profile = match lookup("PERSONA_PATH") {
                    Some(path) => fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read persona profile {}", path))?,
                    None => String::new(),
                };
                render_persona(&name, &profile)?
            }
        };

        let history_limit = parse_var(&lookup, "RELAY_HISTORY_LIMIT", 10)?;
        let max_message_chars = parse_var(&lookup, "RELAY_MAX_MESSAGE_CHARS", 4000)?;
        let max_tokens = parse_var(&lookup, "RELAY_MAX_TOKENS", 500)?;
        let temperature = parse_var(&lookup, "RELAY_TEMPERATURE", 0.7)?;
        let upstream_timeout =
            Duration::from_secs(parse_var(&lookup, "RELAY_UPSTREAM_TIMEOUT_SECS", 30)?);

        Ok(Self {
            allowed_origins,
            db_path,
            openrouter_api_hostname,
            openrouter_api_key,
            openrouter_model,
            openrouter_referer,
            openrouter_title,
            system_message,
            history_limit,
            max_message_chars,
            max_tokens,
            temperature,
            upstream_timeout,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid value for {}: {:?} ({})", key, val, e)),
        None => Ok(default),
    }
}
