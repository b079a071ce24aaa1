//! Decoding raw assistant text into a message with tool calls

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::chat_format::{END_HEADER, END_OF_MESSAGE, END_OF_TURN, PYTHON_TAG, START_HEADER};
use crate::types::{BuiltinTool, CompletionMessage, Content, StopReason, ToolCall, ToolName};

static CUSTOM_TOOL_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<function=(?P<name>[^>]+)>(?P<args>.*?)(?:</function>|$)").expect("custom call pattern is valid")
});

static BUILTIN_TOOL_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?P<name>\w+)\.call\(query="(?P<query>[^"]*)"\)"#).expect("builtin call pattern is valid")
});

/// Turn generated text into an assistant message
///
/// Strips a leading assistant header and trailing end-of-turn markers, then
/// looks for one tool call: a custom call, a builtin `tool.call(query=...)`,
/// or code after the python tag. A recognized call clears the text content.
/// Without a marker or `stop_reason`, the message is treated as cut short.
pub fn decode_assistant_message(text: &str, stop_reason: Option<StopReason>) -> CompletionMessage {
    let mut stop_reason = stop_reason;
    let mut content = text.trim_matches(' ');

    let header = format!("{START_HEADER}assistant{END_HEADER}\n\n");
    if let Some(rest) = content.strip_prefix(header.as_str()) {
        content = rest;
    }

    let python_tagged = match content.strip_prefix(PYTHON_TAG) {
        Some(rest) => {
            content = rest;
            true
        }
        None => false,
    };

    if let Some(rest) = content.strip_suffix(END_OF_TURN) {
        content = rest;
        stop_reason = Some(StopReason::EndOfTurn);
    } else if let Some(rest) = content.strip_suffix(END_OF_MESSAGE) {
        content = rest;
        stop_reason = Some(StopReason::EndOfMessage);
    }

    let call = extract_custom_call(content)
        .or_else(|| extract_builtin_call(content))
        .or_else(|| {
            python_tagged.then(|| {
                let mut arguments = Map::new();
                arguments.insert("code".to_owned(), Value::String(content.to_owned()));
                (ToolName::Builtin(BuiltinTool::CodeInterpreter), arguments)
            })
        });

    let (content, tool_calls) = match call {
        Some((tool_name, arguments)) => (
            String::new(),
            vec![ToolCall {
                call_id: uuid::Uuid::new_v4().to_string(),
                tool_name,
                arguments,
            }],
        ),
        None => (content.to_owned(), Vec::new()),
    };

    CompletionMessage {
        content: Content::Text(content),
        stop_reason: stop_reason.unwrap_or(StopReason::OutOfTokens),
        tool_calls,
    }
}

/// `<function=name>{...}</function>` or a JSON function object
fn extract_custom_call(body: &str) -> Option<(ToolName, Map<String, Value>)> {
    if let Some(caps) = CUSTOM_TOOL_CALL.captures(body) {
        let name = caps["name"].trim();
        let raw = caps["args"].trim();

        let Some(arguments) = parse_object(raw).or_else(|| parse_object(&raw.replace('\'', "\""))) else {
            tracing::debug!(tool = %name, "unparseable custom tool call arguments");
            return None;
        };

        return Some(name_arguments(name, arguments));
    }

    let mut object = parse_object(body.trim())?;

    let is_function = object.get("type").and_then(Value::as_str) == Some("function") || object.contains_key("name");
    if !is_function {
        return None;
    }

    let Some(Value::String(name)) = object.remove("name") else {
        return None;
    };

    let arguments = match object.remove("parameters") {
        Some(Value::Object(arguments)) => arguments,
        None => Map::new(),
        Some(_) => return None,
    };

    Some(name_arguments(&name, arguments))
}

fn extract_builtin_call(body: &str) -> Option<(ToolName, Map<String, Value>)> {
    let caps = BUILTIN_TOOL_CALL.captures(body)?;

    let mut arguments = Map::new();
    arguments.insert("query".to_owned(), Value::String(caps["query"].to_owned()));

    Some((ToolName::parse(&caps["name"]), arguments))
}

/// Custom-format calls that name a builtin tool are mapped onto it
fn name_arguments(name: &str, arguments: Map<String, Value>) -> (ToolName, Map<String, Value>) {
    match ToolName::parse(name) {
        ToolName::Builtin(tool) => {
            let query = arguments.into_iter().next().map_or(Value::String(String::new()), |(_, v)| v);
            let mut builtin_arguments = Map::new();
            builtin_arguments.insert("query".to_owned(), query);
            (ToolName::Builtin(tool), builtin_arguments)
        }
        custom @ ToolName::Custom(_) => (custom, arguments),
    }
}

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}
