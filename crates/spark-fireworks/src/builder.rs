//! Request building
//!
//! Turns a resolved request into the provider call payload and decides the
//! call shape. The shape chosen here is the only input the dispatcher uses to
//! pick an endpoint.

use serde_json::{Map, Value, json};
use spark_core::ModelFamily;

use crate::error::InferenceError;
use crate::media::{MediaOptions, convert_messages};
use crate::options::build_options;
use crate::prompt::{chat_prompt, completion_prompt, request_has_media};
use crate::types::GenerationRequest;

/// Whether a call sends a raw prompt or a structured message list
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CallShape {
    /// `{"prompt": ...}` sent to `/completions`
    Prompt,
    /// `{"messages": [...]}` sent to `/chat/completions`
    Messages,
}

/// Fully built provider call
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall {
    pub shape: CallShape,
    /// JSON body: model, stream flag, options and the prompt or messages
    pub params: Map<String, Value>,
}

impl ProviderCall {
    pub fn model(&self) -> Option<&str> {
        self.params.get("model").and_then(Value::as_str)
    }

    pub fn stream(&self) -> bool {
        self.params.get("stream").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn prompt(&self) -> Option<&str> {
        self.params.get("prompt").and_then(Value::as_str)
    }
}

/// Remove one leading BOS marker; the provider adds its own
pub fn strip_bos(prompt: &str, family: ModelFamily) -> &str {
    prompt.strip_prefix(family.bos_token()).unwrap_or(prompt)
}

/// Build the provider call for a resolved request
///
/// Chat requests carrying images are sent as structured messages; all other
/// requests are rendered to a single prompt.
///
/// # Errors
///
/// Returns `InferenceError::UnsupportedMedia` for a completion with images,
/// `InferenceError::UnsupportedResponseFormat` for an unknown format tag, and
/// any error raised while rendering the prompt or converting images
pub async fn build_call(
    request: &GenerationRequest,
    family: ModelFamily,
    media: &MediaOptions,
) -> Result<ProviderCall, InferenceError> {
    let has_media = request_has_media(request);

    if has_media && matches!(request, GenerationRequest::Completion(_)) {
        return Err(InferenceError::UnsupportedMedia(
            "fireworks does not support media for completion requests".to_owned(),
        ));
    }

    let options = build_options(request.sampling_params(), request.response_format())?;

    let (shape, input) = match request {
        GenerationRequest::Completion(request) => {
            let prompt = completion_prompt(request, family);
            (CallShape::Prompt, json!(strip_bos(&prompt, family)))
        }
        GenerationRequest::ChatCompletion(request) if has_media => {
            (CallShape::Messages, Value::Array(convert_messages(&request.messages, media).await?))
        }
        GenerationRequest::ChatCompletion(request) => {
            let prompt = chat_prompt(request, family)?;
            (CallShape::Prompt, json!(strip_bos(&prompt, family)))
        }
    };

    let mut params = Map::new();
    params.insert("model".to_owned(), json!(request.model()));
    params.insert("stream".to_owned(), json!(request.stream()));
    params.extend(options);

    match shape {
        CallShape::Prompt => {
            params.insert("prompt".to_owned(), input);
            if let Some(logprobs) = request.logprobs().filter(|config| config.top_k > 0) {
                params.insert("logprobs".to_owned(), json!(logprobs.top_k));
            }
        }
        CallShape::Messages => {
            params.insert("messages".to_owned(), input);
        }
    }

    tracing::debug!(model = %request.model(), shape = %shape, stream = request.stream(), "built provider call");

    Ok(ProviderCall { shape, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ChatCompletionInput, CompletionInput, ContentPart, LogProbConfig, Message, ResponseFormat, SamplingParams,
    };

    const MODEL: &str = "accounts/fireworks/models/llama-v3p1-8b-instruct";

    fn completion(input: CompletionInput) -> GenerationRequest {
        GenerationRequest::Completion(input.into_request(MODEL.to_owned()))
    }

    fn chat(input: ChatCompletionInput) -> GenerationRequest {
        GenerationRequest::ChatCompletion(input.into_request(MODEL.to_owned()))
    }

    fn image_message() -> Message {
        Message::user(vec![
            ContentPart::text("What is in this picture?"),
            ContentPart::image_url("https://example.com/dog.jpg"),
        ])
    }

    #[test]
    fn bos_is_stripped_exactly_once() {
        let family = ModelFamily::Llama31;

        assert_eq!(strip_bos("<|begin_of_text|>Hello", family), "Hello");
        assert_eq!(
            strip_bos("<|begin_of_text|><|begin_of_text|>Hello", family),
            "<|begin_of_text|>Hello"
        );
        assert_eq!(strip_bos("Hello <|begin_of_text|>", family), "Hello <|begin_of_text|>");
        assert_eq!(strip_bos(" <|begin_of_text|>Hello", family), " <|begin_of_text|>Hello");
        assert_eq!(strip_bos("<|begin_of_text|>", family), "");
    }

    #[tokio::test]
    async fn plain_completion_payload() {
        let call = build_call(
            &completion(CompletionInput::new("Hello")),
            ModelFamily::Llama31,
            &MediaOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(call.shape, CallShape::Prompt);
        assert_eq!(
            Value::Object(call.params),
            json!({"model": MODEL, "prompt": "Hello", "stream": false, "max_tokens": 512})
        );
    }

    #[tokio::test]
    async fn completion_with_media_is_rejected() {
        let input = CompletionInput::new(vec![ContentPart::image_url("https://example.com/dog.jpg")]);

        let err = build_call(&completion(input), ModelFamily::Llama32Vision, &MediaOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, InferenceError::UnsupportedMedia(_)));
    }

    #[tokio::test]
    async fn text_chat_is_flattened_to_prompt() {
        let input = ChatCompletionInput::new(vec![Message::system("Be brief."), Message::user("Hi")]).with_stream(true);

        let call = build_call(&chat(input), ModelFamily::Llama32, &MediaOptions::default())
            .await
            .unwrap();

        assert_eq!(call.shape, CallShape::Prompt);
        assert!(!call.params.contains_key("messages"));
        assert!(call.stream());

        let prompt = call.prompt().unwrap();
        assert!(prompt.starts_with("<|start_header_id|>system<|end_header_id|>"));
        assert!(!prompt.contains("<|begin_of_text|>"));
    }

    #[tokio::test]
    async fn chat_with_media_uses_messages() {
        let input = ChatCompletionInput::new(vec![Message::system("Describe."), image_message()]);

        let call = build_call(&chat(input), ModelFamily::Llama32Vision, &MediaOptions::default())
            .await
            .unwrap();

        assert_eq!(call.shape, CallShape::Messages);
        assert!(!call.params.contains_key("prompt"));

        let messages = call.params["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["content"][1]["type"], "image_url");
    }

    #[tokio::test]
    async fn unknown_response_format_fails_before_rendering() {
        let input =
            ChatCompletionInput::new(vec![image_message()]).with_response_format(ResponseFormat::Unsupported("xml".to_owned()));

        let err = build_call(&chat(input), ModelFamily::Llama32Vision, &MediaOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, InferenceError::UnsupportedResponseFormat { .. }));
    }

    #[tokio::test]
    async fn options_are_merged_into_params() {
        let input = CompletionInput::new("Hello").with_sampling_params(SamplingParams {
            temperature: Some(0.2),
            max_tokens: Some(32),
            ..SamplingParams::default()
        });

        let call = build_call(&completion(input), ModelFamily::Llama31, &MediaOptions::default())
            .await
            .unwrap();

        assert_eq!(call.params["temperature"], json!(0.2));
        assert_eq!(call.params["max_tokens"], json!(32));
    }

    #[tokio::test]
    async fn logprobs_only_on_prompt_calls() {
        let input = CompletionInput::new("Hello").with_logprobs(LogProbConfig { top_k: 3 });
        let call = build_call(&completion(input), ModelFamily::Llama31, &MediaOptions::default())
            .await
            .unwrap();
        assert_eq!(call.params["logprobs"], json!(3));

        let input = ChatCompletionInput::new(vec![image_message()]).with_logprobs(LogProbConfig { top_k: 3 });
        let call = build_call(&chat(input), ModelFamily::Llama32Vision, &MediaOptions::default())
            .await
            .unwrap();
        assert!(!call.params.contains_key("logprobs"));

        let input = CompletionInput::new("Hello").with_logprobs(LogProbConfig { top_k: 0 });
        let call = build_call(&completion(input), ModelFamily::Llama31, &MediaOptions::default())
            .await
            .unwrap();
        assert!(!call.params.contains_key("logprobs"));
    }
}
