//! Service configuration
//!
//! Everything is driven by `CHANGEGUARD_*` environment variables; there is
//! no config file and no state on disk.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Settings for the LLM backend connection.
///
/// Env vars:
/// - `CHANGEGUARD_LLM_API_KEY` (required for live serving)
/// - `CHANGEGUARD_LLM_BASE_URL` (optional, default Gemini OpenAI-compat endpoint)
/// - `CHANGEGUARD_LLM_MODEL` (optional, default gemini-2.5-flash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

/// Top-level service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub llm: LlmConfig,
    /// Upper bound on backend round-trips per request
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Wall-clock budget for one full assessment, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_max_rounds() -> u32 {
    10
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("CHANGEGUARD_LLM_API_KEY")
            .context("missing CHANGEGUARD_LLM_API_KEY for LLM backend")?;
        let base_url =
            std::env::var("CHANGEGUARD_LLM_BASE_URL").unwrap_or_else(|_| default_base_url());
        let model = std::env::var("CHANGEGUARD_LLM_MODEL").unwrap_or_else(|_| default_model());

        let max_rounds = match std::env::var("CHANGEGUARD_MAX_ROUNDS") {
            Ok(v) => v
                .parse::<u32>()
                .context("CHANGEGUARD_MAX_ROUNDS must be a positive integer")?,
            Err(_) => default_max_rounds(),
        };
        let request_timeout_secs = match std::env::var("CHANGEGUARD_REQUEST_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .context("CHANGEGUARD_REQUEST_TIMEOUT_SECS must be a positive integer")?,
            Err(_) => default_request_timeout_secs(),
        };

        Ok(Self {
            llm: LlmConfig {
                api_key,
                base_url,
                model,
            },
            max_rounds,
            request_timeout_secs,
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: String::new(),
                base_url: default_base_url(),
                model: default_model(),
            },
            max_rounds: default_max_rounds(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
