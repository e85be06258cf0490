use anyhow::{Context, Result};

const DEFAULT_QUERY_SERVICE_URL: &str = "http://localhost:8000/api/query";
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Application configuration loaded from environment variables.
/// Every variable is optional; the defaults point at the local services.
#[derive(Debug, Clone)]
pub struct Config {
    pub query_service_url: String,
    pub ollama_base_url: String,
    /// Overrides the embedded rubric template when set.
    pub rubric_template_path: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        let defaults = Config::default();

        Ok(Config {
            query_service_url: env_or("QUERY_SERVICE_URL", &defaults.query_service_url),
            ollama_base_url: env_or("OLLAMA_BASE_URL", &defaults.ollama_base_url),
            rubric_template_path: std::env::var("RUBRIC_TEMPLATE_PATH").ok(),
            port: match std::env::var("PORT") {
                Ok(raw) => raw
                    .parse::<u16>()
                    .context("PORT must be a valid port number")?,
                Err(_) => defaults.port,
            },
            rust_log: env_or("RUST_LOG", &defaults.rust_log),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query_service_url: DEFAULT_QUERY_SERVICE_URL.to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            rubric_template_path: None,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
