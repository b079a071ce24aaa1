//! Programmatic adapter configuration for integration tests

use secrecy::SecretString;
use spark_config::{FireworksConfig, ModelAliasConfig};
use spark_core::ModelFamily;

pub const TEST_API_KEY: &str = "fw-test-key";

/// Builder for adapter configurations pointed at a mock backend
pub struct ConfigBuilder {
    config: FireworksConfig,
}

impl ConfigBuilder {
    /// Configuration with a static API key
    pub fn new(base_url: &str) -> Self {
        Self {
            config: FireworksConfig {
                api_key: Some(SecretString::from(TEST_API_KEY)),
                base_url: base_url.parse().expect("valid URL"),
                ..FireworksConfig::default()
            },
        }
    }

    /// Drop the static key so only caller-supplied keys apply
    pub fn without_api_key(mut self) -> Self {
        self.config.api_key = None;
        self
    }

    pub fn with_alias(mut self, alias: &str, provider_resource_id: &str, family: ModelFamily) -> Self {
        self.config.models.insert(
            alias.to_owned(),
            ModelAliasConfig {
                provider_resource_id: provider_resource_id.to_owned(),
                family,
            },
        );
        self
    }

    pub fn build(self) -> FireworksConfig {
        self.config
    }
}
