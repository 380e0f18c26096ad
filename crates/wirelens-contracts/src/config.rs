use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

/// Runtime configuration for the relay. Built once at startup and
/// injected into the components that need it, so tests can construct
/// their own without touching process environment.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Base URL of the room-metadata service.
    pub metadata_base_url: String,
    /// Root directory the metadata service's upload-relative paths
    /// resolve against.
    pub uploads_root: PathBuf,
    /// Directory staged subject images are written under.
    pub staging_dir: PathBuf,
    /// Base URL of the inference service API.
    pub inference_base_url: String,
    /// API key sent to the inference service.
    pub inference_api_key: String,
    /// Administrative key guarding cache invalidation and
    /// description adaptation.
    pub admin_api_key: String,
    /// Model used for the inspection pipeline.
    pub inspection_model: String,
    /// Model used for description adaptation.
    pub description_model: String,
    /// Output-token bound on the inspection call.
    pub inspection_max_tokens: u64,
    pub metadata_timeout: Duration,
    pub inference_timeout: Duration,
}

impl RelayConfig {
    /// Reads configuration from the environment. The inference API
    /// key and the administrative key have no usable default and are
    /// required.
    pub fn from_env() -> Result<Self> {
        let Some(inference_api_key) = non_empty_env("OPENAI_API_KEY") else {
            bail!("OPENAI_API_KEY not set");
        };
        let Some(admin_api_key) = non_empty_env("AI_API_KEY_SECRET") else {
            bail!("AI_API_KEY_SECRET not set");
        };
        Ok(Self {
            metadata_base_url: trimmed_base_url(
                non_empty_env("METADATA_BASE_URL").unwrap_or_else(|| "http://127.0.0.1:3000/api".to_string()),
            ),
            uploads_root: non_empty_env("UPLOADS_BASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            staging_dir: non_empty_env("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            inference_base_url: trimmed_base_url(
                non_empty_env("OPENAI_API_BASE")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            ),
            inference_api_key,
            admin_api_key,
            inspection_model: non_empty_env("INSPECTION_MODEL")
                .unwrap_or_else(|| "gpt-4o".to_string()),
            description_model: non_empty_env("DESCRIPTION_MODEL")
                .unwrap_or_else(|| "gpt-4.1-mini".to_string()),
            inspection_max_tokens: env_u64("INSPECTION_MAX_TOKENS", 200),
            metadata_timeout: Duration::from_millis(env_u64("METADATA_TIMEOUT_MS", 10_000)),
            inference_timeout: Duration::from_millis(env_u64("INFERENCE_TIMEOUT_MS", 60_000)),
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn trimmed_base_url(value: String) -> String {
    value.trim().trim_end_matches('/').to_string()
}
