//! Shared configuration used across the Sous Chef crates.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where cooking sessions are kept between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    /// Process memory only; sessions vanish on restart.
    #[default]
    Memory,
    /// Sled tree under `storage_path`.
    Sled,
}

/// Global application configuration (gateway + LLM). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity shown by `/v1/status`.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base directory for Sled DBs (session store path is derived from this).
    pub storage_path: String,
    /// JSON recipe library produced by `--prepare-recipes`. Built-ins are used when missing.
    pub recipes_path: String,
    #[serde(default)]
    pub session_backend: SessionBackend,
    /// LLM mode ("mock" or "live").
    pub llm_mode: String,
    pub llm_api_url: String,
    /// Bearer key for the live endpoint. Falls back to env `OPENAI_API_KEY`.
    #[serde(default)]
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    /// Upper bound for a single fallback call, in seconds.
    pub llm_timeout_secs: u64,
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: env `SOUSCHEF__*` > `SOUSCHEF_CONFIG` file > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("SOUSCHEF_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "Sous Chef Gateway")?
            .set_default("port", 8000_i64)?
            .set_default("storage_path", "./data")?
            .set_default("recipes_path", "./data/recipes_internal.json")?
            .set_default("session_backend", "memory")?
            .set_default("llm_mode", "mock")?
            .set_default("llm_api_url", "https://api.openai.com/v1/chat/completions")?
            .set_default("llm_model", "gpt-4o-mini")?
            .set_default("llm_max_tokens", 300_i64)?
            .set_default("llm_timeout_secs", 20_i64)?;

        let path = Path::new(&config_path);
        let toml_path = path.with_extension("toml");
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else if toml_path.exists() {
            builder.add_source(config::File::from(toml_path.as_path()))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("SOUSCHEF").separator("__"))
            .build()?;

        let mut cfg: Self = built.try_deserialize()?;
        if cfg.llm_api_key.as_deref().map_or(true, str::is_empty) {
            cfg.llm_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        Ok(cfg)
    }

    /// Sled directory for persisted sessions.
    pub fn sessions_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("souschef_sessions")
    }

    #[inline]
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs.max(1))
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.llm_mode.eq_ignore_ascii_case("live")
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "Sous Chef Gateway".to_string(),
            port: 8000,
            storage_path: "./data".to_string(),
            recipes_path: "./data/recipes_internal.json".to_string(),
            session_backend: SessionBackend::Memory,
            llm_mode: "mock".to_string(),
            llm_api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            llm_api_key: None,
            llm_model: "gpt-4o-mini".to_string(),
            llm_max_tokens: 300,
            llm_timeout_secs: 20,
        }
    }
}
