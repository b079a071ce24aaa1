//! Fireworks adapter settings

use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use spark_core::ModelFamily;
use url::Url;

/// Public Fireworks inference endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.fireworks.ai/inference/v1";

/// Request timeout applied when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// `[fireworks]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FireworksConfig {
    /// Static API key; takes precedence over caller-supplied keys
    ///
    /// An empty string is treated as unset so the key can be wired to an
    /// optional environment variable.
    #[serde(default, deserialize_with = "non_empty_secret")]
    pub api_key: Option<SecretString>,
    /// Base URL of the OpenAI-compatible inference API
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Per-request timeout, e.g. `"30s"` or `"2m"`
    #[serde(default = "default_timeout", deserialize_with = "duration")]
    pub timeout: Duration,
    /// Fetch URL images and inline them as data URIs
    #[serde(default)]
    pub download_images: bool,
    /// Additional model aliases, keyed by caller-facing name
    #[serde(default)]
    pub models: IndexMap<String, ModelAliasConfig>,
}

/// `[fireworks.models."<alias>"]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelAliasConfig {
    /// Fireworks model id, e.g. `accounts/fireworks/models/llama-v3p1-8b-instruct`
    pub provider_resource_id: String,
    /// Prompt template family
    pub family: ModelFamily,
}

impl Default for FireworksConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout: DEFAULT_TIMEOUT,
            download_images: false,
            models: IndexMap::new(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

const fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn non_empty_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|key| !key.trim().is_empty()).map(SecretString::from))
}

fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    duration_str::parse(&raw).map_err(|e| serde::de::Error::custom(format!("invalid duration `{raw}`: {e}")))
}
