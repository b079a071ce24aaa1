//! Prompt formatting
//!
//! Renders requests into the raw prompt text sent to the completions
//! endpoint, and decodes generated text back into assistant messages.

mod chat_format;
mod decode;
mod tools;

use jiff::civil::Date;
use spark_core::ModelFamily;

pub use chat_format::{encode_dialog_prompt, encode_tool_call};
pub(crate) use chat_format::{END_OF_MESSAGE, END_OF_TURN, PYTHON_TAG};
pub use decode::decode_assistant_message;

use crate::error::InferenceError;
use crate::types::{ChatCompletionRequest, CompletionRequest, GenerationRequest, Message, ResponseFormat};

/// Whether any content segment of the request is an image
pub fn request_has_media(request: &GenerationRequest) -> bool {
    match request {
        GenerationRequest::Completion(request) => request.content.has_media(),
        GenerationRequest::ChatCompletion(request) => request.messages.iter().any(Message::has_media),
    }
}

/// Instruction appended to prompts when JSON output is requested
///
/// Grammar constraints are enforced by the provider and need no prompt text.
pub(crate) fn response_format_prompt(format: Option<&ResponseFormat>) -> Option<String> {
    match format? {
        ResponseFormat::JsonSchema { json_schema } => {
            Some(format!("Please respond in JSON format with the schema: {json_schema}"))
        }
        ResponseFormat::Grammar { .. } | ResponseFormat::Unsupported(_) => None,
    }
}

/// Render a completion request, starting with the family's BOS marker
pub fn completion_prompt(request: &CompletionRequest, family: ModelFamily) -> String {
    let mut text = request.content.text();

    if let Some(instruction) = response_format_prompt(request.response_format.as_ref()) {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(&instruction);
    }

    format!("{}{text}", family.bos_token())
}

/// Render a chat request with today's date in the system header
///
/// # Errors
///
/// Returns `InferenceError::InvalidRequest` if the tools cannot be described
/// for this family or the system message is misplaced
pub fn chat_prompt(request: &ChatCompletionRequest, family: ModelFamily) -> Result<String, InferenceError> {
    chat_prompt_on(request, family, jiff::Zoned::now().date())
}

/// Render a chat request as of `today`
///
/// # Errors
///
/// See [`chat_prompt`]
pub fn chat_prompt_on(
    request: &ChatCompletionRequest,
    family: ModelFamily,
    today: Date,
) -> Result<String, InferenceError> {
    let mut messages = tools::augment_messages(request, family, today)?;

    if let Some(instruction) = response_format_prompt(request.response_format.as_ref()) {
        messages.push(Message::user(instruction));
    }

    Ok(encode_dialog_prompt(&messages, family, request.tool_prompt_format))
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use serde_json::json;

    use super::*;
    use crate::types::{Content, ContentPart, SamplingParams, ToolChoice, ToolPromptFormat};

    fn completion(content: Content, response_format: Option<ResponseFormat>) -> CompletionRequest {
        CompletionRequest {
            model: "m".to_owned(),
            content,
            sampling_params: SamplingParams::default(),
            response_format,
            stream: false,
            logprobs: None,
        }
    }

    fn chat(messages: Vec<Message>, response_format: Option<ResponseFormat>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "m".to_owned(),
            messages,
            sampling_params: SamplingParams::default(),
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
            tool_prompt_format: ToolPromptFormat::Json,
            response_format,
            stream: false,
            logprobs: None,
        }
    }

    #[test]
    fn media_detection() {
        let text_only = GenerationRequest::ChatCompletion(chat(vec![Message::user("hi")], None));
        assert!(!request_has_media(&text_only));

        let with_image = GenerationRequest::ChatCompletion(chat(
            vec![
                Message::system("describe images"),
                Message::user(vec![ContentPart::image_url("https://example.com/a.png")]),
            ],
            None,
        ));
        assert!(request_has_media(&with_image));

        let completion_image = GenerationRequest::Completion(completion(
            Content::Parts(vec![ContentPart::image_url("https://example.com/a.png")]),
            None,
        ));
        assert!(request_has_media(&completion_image));
    }

    #[test]
    fn completion_prompt_starts_with_bos() {
        let prompt = completion_prompt(&completion("Hello".into(), None), ModelFamily::Llama31);
        assert_eq!(prompt, "<|begin_of_text|>Hello");
    }

    #[test]
    fn completion_prompt_appends_schema_instruction() {
        let format = ResponseFormat::JsonSchema {
            json_schema: json!({"type": "object"}),
        };
        let prompt = completion_prompt(&completion("List colors".into(), Some(format)), ModelFamily::Llama31);

        assert_eq!(
            prompt,
            "<|begin_of_text|>List colors\n\nPlease respond in JSON format with the schema: {\"type\":\"object\"}"
        );
    }

    #[test]
    fn grammar_adds_no_instruction() {
        let format = ResponseFormat::Grammar { bnf: json!({"root": "x"}) };
        let prompt = completion_prompt(&completion("Go".into(), Some(format)), ModelFamily::Llama32);
        assert_eq!(prompt, "<|begin_of_text|>Go");
    }

    #[test]
    fn chat_prompt_for_llama32() {
        let prompt = chat_prompt_on(&chat(vec![Message::user("Hi")], None), ModelFamily::Llama32, date(2024, 9, 25))
            .unwrap();

        assert_eq!(
            prompt,
            "<|begin_of_text|><|start_header_id|>user<|end_header_id|>\n\nHi<|eot_id|>\
             <|start_header_id|>assistant<|end_header_id|>\n\n"
        );
    }

    #[test]
    fn chat_prompt_appends_schema_message() {
        let format = ResponseFormat::JsonSchema {
            json_schema: json!({"type": "array"}),
        };
        let prompt = chat_prompt_on(
            &chat(vec![Message::user("Colors?")], Some(format)),
            ModelFamily::Llama32,
            date(2024, 9, 25),
        )
        .unwrap();

        assert!(prompt.contains(
            "<|start_header_id|>user<|end_header_id|>\n\nPlease respond in JSON format with the schema: {\"type\":\"array\"}<|eot_id|>"
        ));
        assert!(prompt.ends_with("<|start_header_id|>assistant<|end_header_id|>\n\n"));
    }

    #[test]
    fn chat_prompt_for_llama31_has_system_header() {
        let prompt = chat_prompt_on(&chat(vec![Message::user("Hi")], None), ModelFamily::Llama31, date(2024, 9, 25))
            .unwrap();

        assert!(prompt.starts_with(
            "<|begin_of_text|><|start_header_id|>system<|end_header_id|>\n\nCutting Knowledge Date: December 2023\nToday Date: 25 September 2024<|eot_id|>"
        ));
    }
}
