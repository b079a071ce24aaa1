//! Llama 3 dialog template

use serde_json::{Value, json};
use spark_core::ModelFamily;

use crate::types::{BuiltinTool, Message, StopReason, ToolCall, ToolName, ToolPromptFormat};

pub(crate) const START_HEADER: &str = "<|start_header_id|>";
pub(crate) const END_HEADER: &str = "<|end_header_id|>";
pub(crate) const END_OF_TURN: &str = "<|eot_id|>";
pub(crate) const END_OF_MESSAGE: &str = "<|eom_id|>";
pub(crate) const PYTHON_TAG: &str = "<|python_tag|>";

/// Render a conversation, ending with an open assistant header
pub fn encode_dialog_prompt(messages: &[Message], family: ModelFamily, format: ToolPromptFormat) -> String {
    let mut prompt = String::from(family.bos_token());

    for message in messages {
        encode_message(&mut prompt, message, format);
    }
    push_header(&mut prompt, "assistant");

    prompt
}

fn push_header(out: &mut String, role: &str) {
    out.push_str(START_HEADER);
    out.push_str(role);
    out.push_str(END_HEADER);
    out.push_str("\n\n");
}

fn encode_message(out: &mut String, message: &Message, format: ToolPromptFormat) {
    // Tool results use the ipython role in the Llama 3 template
    let role = match message {
        Message::Tool { .. } => "ipython",
        other => other.role(),
    };
    push_header(out, role);

    match message {
        Message::User { content, context } => {
            out.push_str(&content.text());
            if let Some(context) = context {
                out.push_str("\n\n");
                out.push_str(&context.text());
            }
        }
        Message::Assistant(completion) => {
            if !completion.tool_calls.is_empty() {
                out.push_str(PYTHON_TAG);
            }
            out.push_str(&completion.content.text());
            for call in &completion.tool_calls {
                out.push_str(&encode_tool_call(call, format));
            }
        }
        Message::System { content } | Message::Tool { content, .. } => out.push_str(&content.text()),
    }

    let end_of_message = matches!(message, Message::Assistant(m) if m.stop_reason == StopReason::EndOfMessage);
    out.push_str(if end_of_message { END_OF_MESSAGE } else { END_OF_TURN });
}

/// Write a tool call the way the model is expected to emit it
pub fn encode_tool_call(call: &ToolCall, format: ToolPromptFormat) -> String {
    match &call.tool_name {
        ToolName::Builtin(BuiltinTool::CodeInterpreter) => string_argument(call, "code"),
        ToolName::Builtin(tool) => format!("{tool}.call(query=\"{}\")", string_argument(call, "query")),
        ToolName::Custom(name) => match format {
            ToolPromptFormat::Json => json!({
                "type": "function",
                "name": name,
                "parameters": call.arguments,
            })
            .to_string(),
            ToolPromptFormat::FunctionTag => {
                format!("<function={name}>{}</function>", Value::Object(call.arguments.clone()))
            }
            ToolPromptFormat::PythonList => {
                let args = call
                    .arguments
                    .iter()
                    .map(|(key, value)| format!("{key}={}", python_literal(value)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{name}({args})]")
            }
        },
    }
}

fn string_argument(call: &ToolCall, key: &str) -> String {
    match call.arguments.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn python_literal(value: &Value) -> String {
    match value {
        Value::String(text) => format!("\"{text}\""),
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        Value::Null => "None".to_owned(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => {
            let items = items.iter().map(python_literal).collect::<Vec<_>>();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) => {
            let fields = fields
                .iter()
                .map(|(key, value)| format!("\"{key}\": {}", python_literal(value)))
                .collect::<Vec<_>>();
            format!("{{{}}}", fields.join(", "))
        }
    }
}
