use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tools the Llama 3 models were trained to call natively
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BuiltinTool {
    BraveSearch,
    WolframAlpha,
    Photogen,
    CodeInterpreter,
}

/// Tool name: one of the builtin tools or a caller-defined function
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolName {
    Builtin(BuiltinTool),
    Custom(String),
}

impl ToolName {
    /// Name a custom tool, mapping builtin names to their builtin variant
    pub fn parse(name: &str) -> Self {
        name.parse().map_or_else(|_| Self::Custom(name.to_owned()), Self::Builtin)
    }

    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(tool) => tool.fmt(f),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

impl From<BuiltinTool> for ToolName {
    fn from(tool: BuiltinTool) -> Self {
        Self::Builtin(tool)
    }
}

/// Parameter of a tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParamDefinition {
    pub param_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

const fn default_required() -> bool {
    true
}

impl ToolParamDefinition {
    pub fn new(param_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            param_type: param_type.into(),
            description: Some(description.into()),
            required: true,
            default: None,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Tool the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub tool_name: ToolName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters in declaration order
    #[serde(default)]
    pub parameters: IndexMap<String, ToolParamDefinition>,
}

impl ToolDefinition {
    pub fn builtin(tool: BuiltinTool) -> Self {
        Self {
            tool_name: ToolName::Builtin(tool),
            description: None,
            parameters: IndexMap::new(),
        }
    }

    pub fn custom(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tool_name: ToolName::Custom(name.into()),
            description: Some(description.into()),
            parameters: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, param: ToolParamDefinition) -> Self {
        self.parameters.insert(name.into(), param);
        self
    }
}

/// Whether the model may or must call a tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
}

/// How custom tool definitions and calls are written into prompts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolPromptFormat {
    /// `{"type": "function", "name": ..., "parameters": {...}}`
    #[default]
    Json,
    /// `<function=name>{...}</function>`
    FunctionTag,
    /// `[name(arg="value")]`
    PythonList,
}

/// Tool invocation produced by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: ToolName,
    pub arguments: Map<String, Value>,
}
