//! Model resolution
//!
//! Maps caller-facing model names to Fireworks resource ids and to the
//! prompt template family used when rendering requests.

use async_trait::async_trait;
use indexmap::IndexMap;
use spark_config::FireworksConfig;
use spark_core::ModelFamily;

use crate::error::InferenceError;

/// Prefix of the models Fireworks hosts under its own account
pub const FIREWORKS_MODEL_PREFIX: &str = "accounts/fireworks/models/";

/// Resolved target for a model identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    /// Identifier sent to the provider
    pub provider_resource_id: String,
    /// Template descriptor used by the prompt formatter
    pub family: ModelFamily,
}

impl ResolvedModel {
    pub fn new(provider_resource_id: impl Into<String>, family: ModelFamily) -> Self {
        Self {
            provider_resource_id: provider_resource_id.into(),
            family,
        }
    }
}

/// Resolves caller model identifiers
#[async_trait]
pub trait ModelResolver: Send + Sync {
    /// Resolve `model_id` to a provider resource and template family
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::UnknownModel` if the identifier is not known
    async fn resolve(&self, model_id: &str) -> Result<ResolvedModel, InferenceError>;
}

struct BuiltinModel {
    resource: &'static str,
    family: ModelFamily,
    aliases: &'static [&'static str],
}

const BUILTIN_MODELS: &[BuiltinModel] = &[
    BuiltinModel {
        resource: "llama-v3p1-8b-instruct",
        family: ModelFamily::Llama31,
        aliases: &["Llama3.1-8B-Instruct", "meta-llama/Llama-3.1-8B-Instruct"],
    },
    BuiltinModel {
        resource: "llama-v3p1-70b-instruct",
        family: ModelFamily::Llama31,
        aliases: &["Llama3.1-70B-Instruct", "meta-llama/Llama-3.1-70B-Instruct"],
    },
    BuiltinModel {
        resource: "llama-v3p1-405b-instruct",
        family: ModelFamily::Llama31,
        aliases: &["Llama3.1-405B-Instruct", "meta-llama/Llama-3.1-405B-Instruct-FP8"],
    },
    BuiltinModel {
        resource: "llama-v3p2-1b-instruct",
        family: ModelFamily::Llama32,
        aliases: &["Llama3.2-1B-Instruct", "meta-llama/Llama-3.2-1B-Instruct"],
    },
    BuiltinModel {
        resource: "llama-v3p2-3b-instruct",
        family: ModelFamily::Llama32,
        aliases: &["Llama3.2-3B-Instruct", "meta-llama/Llama-3.2-3B-Instruct"],
    },
    BuiltinModel {
        resource: "llama-v3p2-11b-vision-instruct",
        family: ModelFamily::Llama32Vision,
        aliases: &["Llama3.2-11B-Vision-Instruct", "meta-llama/Llama-3.2-11B-Vision-Instruct"],
    },
    BuiltinModel {
        resource: "llama-v3p2-90b-vision-instruct",
        family: ModelFamily::Llama32Vision,
        aliases: &["Llama3.2-90B-Vision-Instruct", "meta-llama/Llama-3.2-90B-Vision-Instruct"],
    },
    BuiltinModel {
        resource: "llama-guard-3-8b",
        family: ModelFamily::LlamaGuard3,
        aliases: &["Llama-Guard-3-8B", "meta-llama/Llama-Guard-3-8B"],
    },
    BuiltinModel {
        resource: "llama-guard-3-11b-vision",
        family: ModelFamily::LlamaGuard3Vision,
        aliases: &["Llama-Guard-3-11B-Vision", "meta-llama/Llama-Guard-3-11B-Vision"],
    },
];

/// Alias table backed by the built-in Fireworks catalogue
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    aliases: IndexMap<String, ResolvedModel>,
}

impl ModelRegistry {
    /// Registry containing only the built-in Fireworks Llama models
    pub fn builtin() -> Self {
        let mut aliases = IndexMap::new();

        for model in BUILTIN_MODELS {
            let resolved = ResolvedModel::new(format!("{FIREWORKS_MODEL_PREFIX}{}", model.resource), model.family);
            for alias in model.aliases {
                aliases.insert((*alias).to_owned(), resolved.clone());
            }
        }

        Self { aliases }
    }

    /// Built-in models plus the aliases declared in configuration
    ///
    /// Configured aliases replace built-in entries with the same name.
    pub fn from_config(config: &FireworksConfig) -> Self {
        let mut registry = Self::builtin();

        for (alias, model) in &config.models {
            registry = registry.with_alias(alias.clone(), ResolvedModel::new(&model.provider_resource_id, model.family));
        }

        registry
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>, model: ResolvedModel) -> Self {
        self.aliases.insert(alias.into(), model);
        self
    }

    /// Look up an alias, or a provider resource id known to the table
    pub fn lookup(&self, model_id: &str) -> Option<&ResolvedModel> {
        self.aliases.get(model_id).or_else(|| {
            self.aliases
                .values()
                .find(|model| model.provider_resource_id == model_id)
        })
    }

    /// Registered aliases in insertion order
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &ResolvedModel)> {
        self.aliases.iter().map(|(alias, model)| (alias.as_str(), model))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait]
impl ModelResolver for ModelRegistry {
    async fn resolve(&self, model_id: &str) -> Result<ResolvedModel, InferenceError> {
        let Some(model) = self.lookup(model_id) else {
            tracing::debug!(model = %model_id, "model not in alias table");
            return Err(InferenceError::UnknownModel {
                model: model_id.to_owned(),
            });
        };

        tracing::debug!(
            model = %model_id,
            resource = %model.provider_resource_id,
            family = %model.family,
            "resolved model"
        );

        Ok(model.clone())
    }
}
