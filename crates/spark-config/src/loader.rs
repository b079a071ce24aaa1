use std::path::Path;

use anyhow::Context;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, expansion or parsing
    /// fails, or the result does not validate
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion or parsing fails, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).context("config variable expansion failed")?;
        let config: Self = toml::from_str(&expanded).context("failed to parse config")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error on a non-HTTP base URL, a zero timeout, or an
    /// incomplete model alias
    pub fn validate(&self) -> anyhow::Result<()> {
        let fireworks = &self.fireworks;

        if !matches!(fireworks.base_url.scheme(), "http" | "https") {
            anyhow::bail!(
                "fireworks base_url must use http or https, got '{}'",
                fireworks.base_url
            );
        }

        if fireworks.timeout.is_zero() {
            anyhow::bail!("fireworks timeout must be greater than zero");
        }

        for (alias, model) in &fireworks.models {
            if alias.trim().is_empty() {
                anyhow::bail!("fireworks model aliases must not be empty");
            }
            if model.provider_resource_id.trim().is_empty() {
                anyhow::bail!("fireworks model '{alias}' has an empty provider_resource_id");
            }
        }

        Ok(())
    }
}
