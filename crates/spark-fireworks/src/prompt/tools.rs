//! Tool and system prompt augmentation
//!
//! Llama 3.1 and 3.2 expect tool definitions in different places: 3.1 lists
//! builtin tools in the system prompt and custom tools in a leading user
//! message, while 3.2 and later describe custom tools as a python-list block
//! inside the system prompt. Guard models take the conversation as given.

use jiff::civil::Date;
use serde_json::{Map, Value, json};
use spark_core::{ModelFamily, ToolPromptStyle};

use crate::error::InferenceError;
use crate::types::{BuiltinTool, ChatCompletionRequest, Content, Message, ToolDefinition, ToolName, ToolPromptFormat};

const KNOWLEDGE_CUTOFF: &str = "December 2023";

const PYTHON_LIST_PREAMBLE: &str = "\
You are an expert in composing functions. You are given a question and a set of possible functions.
Based on the question, you will need to make one or more function/tool calls to achieve the purpose.
If none of the function can be used, point it out. If the given question lacks the parameters required by the function,
also point it out. You should only return the function call in tools call sections.";

const FUNCTION_TAG_INSTRUCTIONS: &str = r#"Think very carefully before calling functions.
If you choose to call a function ONLY reply in the following format with no prefix or suffix:

<function=example_function_name>{"example_name": "example_value"}</function>

Reminder:
- If looking for real time information use relevant functions before falling back to brave_search
- Function calls MUST follow the specified format, start with <function= and end with </function>
- Required parameters MUST be specified
- Only call one function at a time
- Put the entire function call reply on one line"#;

/// Prepend the family's system and tool prompts to the conversation
pub(crate) fn augment_messages(
    request: &ChatCompletionRequest,
    family: ModelFamily,
    today: Date,
) -> Result<Vec<Message>, InferenceError> {
    let style = family.tool_prompt_style();
    if style == ToolPromptStyle::Plain {
        return Ok(request.messages.clone());
    }

    let (system, rest) = match request.messages.split_first() {
        Some((Message::System { content }, rest)) => (Some(content), rest),
        _ => (None, request.messages.as_slice()),
    };

    if rest.iter().any(|m| matches!(m, Message::System { .. })) {
        return Err(InferenceError::InvalidRequest(
            "only one system message is supported, at the start of the conversation".to_owned(),
        ));
    }

    let mut messages = match style {
        ToolPromptStyle::Llama31 => llama31_prefix(request, system, today)?,
        ToolPromptStyle::Llama32 => llama32_prefix(request, system)?,
        ToolPromptStyle::Plain => Vec::new(),
    };
    messages.extend_from_slice(rest);

    Ok(messages)
}

fn llama31_prefix(
    request: &ChatCompletionRequest,
    system: Option<&Content>,
    today: Date,
) -> Result<Vec<Message>, InferenceError> {
    let mut system_text = String::new();

    let builtin = builtin_tool_block(&request.tools);
    if !builtin.is_empty() {
        system_text.push_str(&builtin);
        system_text.push('\n');
    }

    system_text.push_str(&format!(
        "Cutting Knowledge Date: {KNOWLEDGE_CUTOFF}\nToday Date: {}",
        today.strftime("%d %B %Y")
    ));

    if let Some(system) = system {
        system_text.push('\n');
        system_text.push_str(&system.text());
    }

    let mut messages = vec![Message::system(system_text)];

    let custom = custom_tools(&request.tools);
    if !custom.is_empty() {
        let prompt = match request.tool_prompt_format {
            ToolPromptFormat::Json => json_tool_prompt(&custom),
            ToolPromptFormat::FunctionTag => function_tag_prompt(&custom),
            ToolPromptFormat::PythonList => {
                return Err(unsupported_format(request.tool_prompt_format, "llama 3.1"));
            }
        };
        messages.push(Message::user(prompt));
    }

    Ok(messages)
}

fn llama32_prefix(request: &ChatCompletionRequest, system: Option<&Content>) -> Result<Vec<Message>, InferenceError> {
    let mut system_text = String::new();

    let builtin = builtin_tool_block(&request.tools);
    if !builtin.is_empty() {
        system_text.push_str(&builtin);
        system_text.push('\n');
    }

    let custom = custom_tools(&request.tools);
    if custom.is_empty() {
        if let Some(system) = system {
            system_text.push_str(&system.text());
        }
    } else {
        if request.tool_prompt_format != ToolPromptFormat::PythonList {
            return Err(unsupported_format(request.tool_prompt_format, "llama 3.2"));
        }
        // A caller system prompt replaces the default preamble
        let preamble = system.map(Content::text);
        system_text.push_str(&python_list_prompt(&custom, preamble.as_deref()));
        system_text.push('\n');
    }

    let system_text = system_text.trim_matches('\n');
    if system_text.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Message::system(system_text)])
}

fn unsupported_format(format: ToolPromptFormat, family: &str) -> InferenceError {
    InferenceError::InvalidRequest(format!("tool prompt format {format} is not supported for {family} models"))
}

fn custom_tools(tools: &[ToolDefinition]) -> Vec<&ToolDefinition> {
    tools.iter().filter(|tool| tool.tool_name.is_custom()).collect()
}

fn builtin_tool_block(tools: &[ToolDefinition]) -> String {
    let builtin: Vec<BuiltinTool> = tools
        .iter()
        .filter_map(|tool| match tool.tool_name {
            ToolName::Builtin(builtin) => Some(builtin),
            ToolName::Custom(_) => None,
        })
        .collect();

    if builtin.is_empty() {
        return String::new();
    }

    // code_interpreter is implied by the ipython environment
    let listed: Vec<String> = builtin
        .iter()
        .filter(|tool| **tool != BuiltinTool::CodeInterpreter)
        .map(ToString::to_string)
        .collect();

    if listed.is_empty() {
        "Environment: ipython".to_owned()
    } else {
        format!("Environment: ipython\nTools: {}", listed.join(", "))
    }
}

fn json_tool_prompt(tools: &[&ToolDefinition]) -> String {
    let mut prompt = String::from(
        "Answer the user's question by making use of the following functions if needed.\n\
         If none of the function can be used, please say so.\n\
         Here is a list of functions in JSON format:\n",
    );

    for tool in tools {
        let properties: Map<String, Value> = tool
            .parameters
            .iter()
            .map(|(name, param)| {
                (
                    name.clone(),
                    json!({"type": param.param_type, "description": param.description.as_deref().unwrap_or_default()}),
                )
            })
            .collect();

        let definition = json!({
            "type": "function",
            "function": {
                "name": tool.tool_name.to_string(),
                "description": tool.description.as_deref().unwrap_or_default(),
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required_params(tool),
                }
            }
        });

        prompt.push_str(&pretty(&definition));
        prompt.push('\n');
    }

    prompt.push_str("\nReturn function calls in JSON format.");
    prompt
}

fn function_tag_prompt(tools: &[&ToolDefinition]) -> String {
    let mut prompt = String::from("You have access to the following functions:\n\n");

    for tool in tools {
        let name = tool.tool_name.to_string();
        let description = tool.description.as_deref().unwrap_or_default();

        let parameters: Map<String, Value> = tool
            .parameters
            .iter()
            .map(|(param_name, param)| {
                let mut value = serde_json::to_value(param).unwrap_or(Value::Null);
                if let Value::Object(fields) = &mut value {
                    fields.remove("default");
                }
                (param_name.clone(), value)
            })
            .collect();

        let definition = json!({"name": name, "description": description, "parameters": parameters});

        prompt.push_str(&format!("Use the function '{name}' to '{description}':\n{definition}\n\n"));
    }

    prompt.push_str(FUNCTION_TAG_INSTRUCTIONS);
    prompt
}

fn python_list_prompt(tools: &[&ToolDefinition], preamble: Option<&str>) -> String {
    let definitions: Vec<Value> = tools
        .iter()
        .map(|tool| {
            let properties: Map<String, Value> = tool
                .parameters
                .iter()
                .map(|(name, param)| {
                    let mut property = json!({
                        "type": param.param_type,
                        "description": param.description.as_deref().unwrap_or_default(),
                    });
                    if let Some(default) = &param.default {
                        property["default"] = default.clone();
                    }
                    (name.clone(), property)
                })
                .collect();

            json!({
                "name": tool.tool_name.to_string(),
                "description": tool.description.as_deref().unwrap_or_default(),
                "parameters": {
                    "type": "dict",
                    "required": required_params(tool),
                    "properties": properties,
                }
            })
        })
        .collect();

    format!(
        "{}\n\n\
         If you decide to invoke any of the function(s), you MUST put it in the format of \
         [func_name1(params_name1=params_value1, params_name2=params_value2...), func_name2(params)]\n\
         You SHOULD NOT include any other text in the response.\n\n\
         Here is a list of functions in JSON format that you can invoke.\n\n{}\n",
        preamble.unwrap_or(PYTHON_LIST_PREAMBLE),
        pretty(&Value::Array(definitions)),
    )
}

fn required_params(tool: &ToolDefinition) -> Vec<&str> {
    tool.parameters
        .iter()
        .filter(|(_, param)| param.required)
        .map(|(name, _)| name.as_str())
        .collect()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
