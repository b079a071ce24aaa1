use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};

use super::content::Content;
use super::message::Message;
use super::tool::{ToolChoice, ToolDefinition, ToolPromptFormat};

/// Token selection strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    #[default]
    Greedy,
    TopP,
    TopK,
}

/// Provider-agnostic sampling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    pub strategy: SamplingStrategy,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
    pub repetition_penalty: f64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::Greedy,
            temperature: None,
            top_p: None,
            top_k: None,
            max_tokens: None,
            repetition_penalty: 1.0,
        }
    }
}

/// Constraint on the shape of generated output
///
/// Deserialized from `{"type": "json_schema", "json_schema": {...}}` or
/// `{"type": "grammar", "bnf": {...}}`. Any other tag is kept as
/// [`ResponseFormat::Unsupported`] and rejected when the request is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    JsonSchema { json_schema: Value },
    Grammar { bnf: Value },
    Unsupported(String),
}

impl ResponseFormat {
    /// Tag naming the variant
    pub fn tag(&self) -> &str {
        match self {
            Self::JsonSchema { .. } => "json_schema",
            Self::Grammar { .. } => "grammar",
            Self::Unsupported(tag) => tag,
        }
    }
}

impl<'de> Deserialize<'de> for ResponseFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let mut fields = Map::<String, Value>::deserialize(deserializer)?;

        let tag = match fields.remove("type") {
            Some(Value::String(tag)) => tag,
            Some(other) => return Err(D::Error::custom(format!("response format type must be a string, got {other}"))),
            None => return Err(D::Error::missing_field("type")),
        };

        let mut take = |field: &'static str| fields.remove(field).ok_or_else(|| D::Error::missing_field(field));

        match tag.as_str() {
            "json_schema" => Ok(Self::JsonSchema {
                json_schema: take("json_schema")?,
            }),
            "grammar" => Ok(Self::Grammar { bnf: take("bnf")? }),
            _ => Ok(Self::Unsupported(tag)),
        }
    }
}

impl Serialize for ResponseFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.tag())?;
        match self {
            Self::JsonSchema { json_schema } => map.serialize_entry("json_schema", json_schema)?,
            Self::Grammar { bnf } => map.serialize_entry("bnf", bnf)?,
            Self::Unsupported(_) => {}
        }
        map.end()
    }
}

/// Request for per-token log probabilities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogProbConfig {
    /// Number of candidates to report per position; zero disables
    #[serde(default)]
    pub top_k: u32,
}

/// Raw-prompt completion, addressed to a provider resource id
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub content: Content,
    pub sampling_params: SamplingParams,
    pub response_format: Option<ResponseFormat>,
    pub stream: bool,
    pub logprobs: Option<LogProbConfig>,
}

/// Chat completion, addressed to a provider resource id
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub sampling_params: SamplingParams,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: ToolChoice,
    pub tool_prompt_format: ToolPromptFormat,
    pub response_format: Option<ResponseFormat>,
    pub stream: bool,
    pub logprobs: Option<LogProbConfig>,
}

/// Request after model resolution
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Completion(CompletionRequest),
    ChatCompletion(ChatCompletionRequest),
}

impl GenerationRequest {
    pub fn model(&self) -> &str {
        match self {
            Self::Completion(request) => &request.model,
            Self::ChatCompletion(request) => &request.model,
        }
    }

    pub const fn stream(&self) -> bool {
        match self {
            Self::Completion(request) => request.stream,
            Self::ChatCompletion(request) => request.stream,
        }
    }

    pub const fn sampling_params(&self) -> &SamplingParams {
        match self {
            Self::Completion(request) => &request.sampling_params,
            Self::ChatCompletion(request) => &request.sampling_params,
        }
    }

    pub const fn response_format(&self) -> Option<&ResponseFormat> {
        match self {
            Self::Completion(request) => request.response_format.as_ref(),
            Self::ChatCompletion(request) => request.response_format.as_ref(),
        }
    }

    pub const fn logprobs(&self) -> Option<LogProbConfig> {
        match self {
            Self::Completion(request) => request.logprobs,
            Self::ChatCompletion(request) => request.logprobs,
        }
    }
}

/// Arguments of a completion call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionInput {
    pub content: Content,
    pub sampling_params: SamplingParams,
    pub response_format: Option<ResponseFormat>,
    pub stream: bool,
    pub logprobs: Option<LogProbConfig>,
}

impl CompletionInput {
    pub fn new(content: impl Into<Content>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sampling_params(mut self, params: SamplingParams) -> Self {
        self.sampling_params = params;
        self
    }

    #[must_use]
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    #[must_use]
    pub const fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    #[must_use]
    pub const fn with_logprobs(mut self, config: LogProbConfig) -> Self {
        self.logprobs = Some(config);
        self
    }

    pub(crate) fn into_request(self, model: String) -> CompletionRequest {
        CompletionRequest {
            model,
            content: self.content,
            sampling_params: self.sampling_params,
            response_format: self.response_format,
            stream: self.stream,
            logprobs: self.logprobs,
        }
    }
}

/// Arguments of a chat completion call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatCompletionInput {
    pub messages: Vec<Message>,
    pub sampling_params: SamplingParams,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: ToolChoice,
    pub tool_prompt_format: ToolPromptFormat,
    pub response_format: Option<ResponseFormat>,
    pub stream: bool,
    pub logprobs: Option<LogProbConfig>,
}

impl ChatCompletionInput {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sampling_params(mut self, params: SamplingParams) -> Self {
        self.sampling_params = params;
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub const fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = choice;
        self
    }

    #[must_use]
    pub const fn with_tool_prompt_format(mut self, format: ToolPromptFormat) -> Self {
        self.tool_prompt_format = format;
        self
    }

    #[must_use]
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    #[must_use]
    pub const fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    #[must_use]
    pub const fn with_logprobs(mut self, config: LogProbConfig) -> Self {
        self.logprobs = Some(config);
        self
    }

    pub(crate) fn into_request(self, model: String) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model,
            messages: self.messages,
            sampling_params: self.sampling_params,
            tools: self.tools,
            tool_choice: self.tool_choice,
            tool_prompt_format: self.tool_prompt_format,
            response_format: self.response_format,
            stream: self.stream,
            logprobs: self.logprobs,
        }
    }
}
