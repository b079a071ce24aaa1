//! Model family descriptors
//!
//! A family tells the prompt formatter how to render a conversation for a
//! given model: which beginning-of-sequence marker the template starts with
//! and how tool definitions are injected into the system prompt.

use serde::{Deserialize, Serialize};

/// Beginning-of-sequence marker of the Llama 3 chat template
pub const LLAMA3_BOS: &str = "<|begin_of_text|>";

/// Model family, used as the prompt template descriptor
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum ModelFamily {
    /// Llama 3.1 instruct models
    #[serde(rename = "llama3_1")]
    #[strum(serialize = "llama3_1")]
    Llama31,
    /// Llama 3.2 text-only instruct models
    #[serde(rename = "llama3_2")]
    #[strum(serialize = "llama3_2")]
    Llama32,
    /// Llama 3.2 vision instruct models
    #[serde(rename = "llama3_2_vision")]
    #[strum(serialize = "llama3_2_vision")]
    Llama32Vision,
    /// Llama 3.3 instruct models
    #[serde(rename = "llama3_3")]
    #[strum(serialize = "llama3_3")]
    Llama33,
    /// Llama Guard 3 safety classifiers
    #[serde(rename = "llama_guard3")]
    #[strum(serialize = "llama_guard3")]
    LlamaGuard3,
    /// Llama Guard 3 vision safety classifier
    #[serde(rename = "llama_guard3_vision")]
    #[strum(serialize = "llama_guard3_vision")]
    LlamaGuard3Vision,
}

/// How tool definitions are rendered into the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPromptStyle {
    /// Builtin tools and a knowledge-date header in the system prompt,
    /// custom tools in a leading user message
    Llama31,
    /// Builtin tools and a python-list tool block in the system prompt
    Llama32,
    /// Messages are rendered as given
    Plain,
}

impl ModelFamily {
    /// Marker token the rendered prompt starts with
    pub const fn bos_token(self) -> &'static str {
        LLAMA3_BOS
    }

    /// Tool prompt style for this family
    ///
    /// Vision variants of 3.2 share the 3.1 tool format.
    pub const fn tool_prompt_style(self) -> ToolPromptStyle {
        match self {
            Self::Llama31 | Self::Llama32Vision => ToolPromptStyle::Llama31,
            Self::Llama32 | Self::Llama33 => ToolPromptStyle::Llama32,
            Self::LlamaGuard3 | Self::LlamaGuard3Vision => ToolPromptStyle::Plain,
        }
    }
}
