//! Response normalization
//!
//! Maps Fireworks bodies and raw stream chunks onto the provider-agnostic
//! response types. Generated text is scanned for the Llama 3 end markers so
//! stop reasons survive even when the provider reports none.

use async_stream::try_stream;
use futures_util::Stream;

use crate::client::ChunkStream;
use crate::error::InferenceError;
use crate::prompt::{END_OF_MESSAGE, END_OF_TURN, PYTHON_TAG, decode_assistant_message};
use crate::protocol::{FireworksChoice, FireworksResponse};
use crate::types::{
    ChatCompletionResponse, ChatCompletionResponseStreamChunk, ChatEventType, CompletionResponse,
    CompletionResponseStreamChunk, EventDelta, EventStream, StopReason, TokenLogProbs, ToolCallContent, ToolCallDelta,
    ToolCallParseStatus,
};

/// Map a provider finish reason onto a stop reason
pub fn stop_reason(finish_reason: &str) -> StopReason {
    match finish_reason {
        "stop" | "eos" | "eos_token" => StopReason::EndOfTurn,
        "eom" => StopReason::EndOfMessage,
        _ => StopReason::OutOfTokens,
    }
}

fn logprobs(choice: &FireworksChoice) -> Option<Vec<TokenLogProbs>> {
    let top = choice.logprobs.as_ref()?.top_logprobs.as_ref()?;
    Some(
        top.iter()
            .map(|candidates| TokenLogProbs {
                logprobs_by_token: candidates.clone(),
            })
            .collect(),
    )
}

fn first_choice(response: &FireworksResponse) -> Result<&FireworksChoice, InferenceError> {
    response
        .first_choice()
        .ok_or_else(|| InferenceError::Upstream("fireworks response has no choices".to_owned()))
}

/// Normalize a non-streaming completion body
///
/// # Errors
///
/// Returns `InferenceError::Upstream` if the body has no choices
pub fn completion_response(response: &FireworksResponse) -> Result<CompletionResponse, InferenceError> {
    let choice = first_choice(response)?;
    let text = choice.text().unwrap_or_default();

    let (content, stop_reason) = if let Some(rest) = text.strip_suffix(END_OF_TURN) {
        (rest, StopReason::EndOfTurn)
    } else if let Some(rest) = text.strip_suffix(END_OF_MESSAGE) {
        (rest, StopReason::EndOfMessage)
    } else {
        (text, choice.finish_reason.as_deref().map_or(StopReason::OutOfTokens, stop_reason))
    };

    Ok(CompletionResponse {
        content: content.to_owned(),
        stop_reason,
        logprobs: logprobs(choice),
    })
}

/// Normalize a non-streaming chat body, decoding any tool call in the text
///
/// # Errors
///
/// Returns `InferenceError::Upstream` if the body has no choices
pub fn chat_response(response: &FireworksResponse) -> Result<ChatCompletionResponse, InferenceError> {
    let choice = first_choice(response)?;
    let text = choice.text().unwrap_or_default();

    Ok(ChatCompletionResponse {
        completion_message: decode_assistant_message(text, choice.finish_reason.as_deref().map(stop_reason)),
        logprobs: None,
    })
}

/// Normalize a raw completion stream
///
/// End markers are swallowed and recorded as the stop reason. The stream
/// closes with an empty delta carrying that stop reason.
pub fn completion_stream(chunks: ChunkStream) -> EventStream<CompletionResponseStreamChunk> {
    Box::pin(completion_events(chunks))
}

fn completion_events(
    chunks: ChunkStream,
) -> impl Stream<Item = Result<CompletionResponseStreamChunk, InferenceError>> + Send {
    try_stream! {
        let mut stop_reason_seen = None;

        for await chunk in chunks {
            let chunk = chunk?;
            // Usage-only trailers carry no choices
            let Some(choice) = chunk.first_choice() else {
                continue;
            };

            match choice.text().unwrap_or_default() {
                END_OF_TURN => stop_reason_seen = Some(StopReason::EndOfTurn),
                END_OF_MESSAGE => stop_reason_seen = Some(StopReason::EndOfMessage),
                text => {
                    yield CompletionResponseStreamChunk {
                        delta: text.to_owned(),
                        stop_reason: stop_reason_seen,
                        logprobs: logprobs(choice),
                    };
                }
            }

            if let Some(reason) = choice.finish_reason.as_deref() {
                stop_reason_seen = stop_reason_seen.or(Some(stop_reason(reason)));
                break;
            }
        }

        yield CompletionResponseStreamChunk {
            delta: String::new(),
            stop_reason: stop_reason_seen,
            logprobs: None,
        };
    }
}

/// Normalize a raw chat stream into start, progress and complete events
///
/// Text after a leading python tag is streamed as tool call deltas; the
/// buffered text is decoded once the provider finishes.
pub fn chat_stream(chunks: ChunkStream) -> EventStream<ChatCompletionResponseStreamChunk> {
    Box::pin(chat_events(chunks))
}

fn chat_events(chunks: ChunkStream) -> impl Stream<Item = Result<ChatCompletionResponseStreamChunk, InferenceError>> + Send {
    try_stream! {
        yield ChatCompletionResponseStreamChunk::new(ChatEventType::Start, EventDelta::Text(String::new()), None);

        let mut buffer = String::new();
        let mut tool_call_mode = false;
        let mut stop_reason_seen = None;

        for await chunk in chunks {
            let chunk = chunk?;
            let Some(choice) = chunk.first_choice() else {
                continue;
            };
            let text = choice.text().unwrap_or_default();

            if !tool_call_mode && text.starts_with(PYTHON_TAG) {
                tool_call_mode = true;
                yield ChatCompletionResponseStreamChunk::tool_call(
                    ToolCallDelta {
                        content: ToolCallContent::Text(String::new()),
                        parse_status: ToolCallParseStatus::Started,
                    },
                    None,
                );
                buffer.push_str(text);
            } else if text == END_OF_TURN {
                stop_reason_seen = Some(StopReason::EndOfTurn);
            } else if text == END_OF_MESSAGE {
                stop_reason_seen = Some(StopReason::EndOfMessage);
            } else {
                if tool_call_mode {
                    yield ChatCompletionResponseStreamChunk::tool_call(
                        ToolCallDelta {
                            content: ToolCallContent::Text(text.to_owned()),
                            parse_status: ToolCallParseStatus::InProgress,
                        },
                        stop_reason_seen,
                    );
                } else {
                    yield ChatCompletionResponseStreamChunk::new(
                        ChatEventType::Progress,
                        EventDelta::Text(text.to_owned()),
                        stop_reason_seen,
                    );
                }
                buffer.push_str(text);
            }

            if let Some(reason) = choice.finish_reason.as_deref() {
                stop_reason_seen = stop_reason_seen.or(Some(stop_reason(reason)));
                break;
            }
        }

        let message = decode_assistant_message(&buffer, stop_reason_seen);

        if tool_call_mode && message.tool_calls.is_empty() {
            yield ChatCompletionResponseStreamChunk::tool_call(
                ToolCallDelta {
                    content: ToolCallContent::Text(String::new()),
                    parse_status: ToolCallParseStatus::Failure,
                },
                stop_reason_seen,
            );
        }

        for call in message.tool_calls {
            yield ChatCompletionResponseStreamChunk::tool_call(
                ToolCallDelta {
                    content: ToolCallContent::Call(call),
                    parse_status: ToolCallParseStatus::Success,
                },
                stop_reason_seen,
            );
        }

        yield ChatCompletionResponseStreamChunk::new(
            ChatEventType::Complete,
            EventDelta::Text(String::new()),
            stop_reason_seen,
        );
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{StreamExt, TryStreamExt, stream};
    use serde_json::json;

    use super::*;
    use crate::types::{BuiltinTool, Content, ToolName};

    fn response(value: serde_json::Value) -> FireworksResponse {
        serde_json::from_value(value).unwrap()
    }

    fn text_chunk(text: &str, finish_reason: Option<&str>) -> Result<FireworksResponse, InferenceError> {
        Ok(response(json!({
            "choices": [{"index": 0, "text": text, "finish_reason": finish_reason}]
        })))
    }

    fn raw(chunks: Vec<Result<FireworksResponse, InferenceError>>) -> ChunkStream {
        Box::pin(stream::iter(chunks))
    }

    #[test]
    fn finish_reasons_map_to_stop_reasons() {
        assert_eq!(stop_reason("stop"), StopReason::EndOfTurn);
        assert_eq!(stop_reason("eos_token"), StopReason::EndOfTurn);
        assert_eq!(stop_reason("eom"), StopReason::EndOfMessage);
        assert_eq!(stop_reason("length"), StopReason::OutOfTokens);
        assert_eq!(stop_reason("content_filter"), StopReason::OutOfTokens);
    }

    #[test]
    fn completion_uses_finish_reason() {
        let body = response(json!({
            "choices": [{"index": 0, "text": "Hello!", "finish_reason": "stop"}]
        }));

        let normalized = completion_response(&body).unwrap();
        assert_eq!(normalized.content, "Hello!");
        assert_eq!(normalized.stop_reason, StopReason::EndOfTurn);
        assert!(normalized.logprobs.is_none());
    }

    #[test]
    fn completion_strips_trailing_end_marker() {
        let body = response(json!({
            "choices": [{"index": 0, "text": "Done<|eom_id|>", "finish_reason": "length"}]
        }));

        let normalized = completion_response(&body).unwrap();
        assert_eq!(normalized.content, "Done");
        assert_eq!(normalized.stop_reason, StopReason::EndOfMessage);
    }

    #[test]
    fn completion_carries_logprobs() {
        let body = response(json!({
            "choices": [{
                "index": 0,
                "text": "Hi",
                "finish_reason": "length",
                "logprobs": {"top_logprobs": [{"Hi": -0.1, "Hey": -2.5}]}
            }]
        }));

        let normalized = completion_response(&body).unwrap();
        let logprobs = normalized.logprobs.unwrap();
        assert_eq!(logprobs.len(), 1);
        assert_eq!(logprobs[0].logprobs_by_token.get("Hey"), Some(&-2.5));
    }

    #[test]
    fn empty_choices_is_upstream_error() {
        let err = completion_response(&FireworksResponse::default()).unwrap_err();
        assert!(matches!(err, InferenceError::Upstream(_)));
    }

    #[test]
    fn chat_decodes_message_content() {
        let body = response(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "A dog."}, "finish_reason": "stop"}]
        }));

        let normalized = chat_response(&body).unwrap();
        assert_eq!(normalized.completion_message.content, Content::from("A dog."));
        assert_eq!(normalized.completion_message.stop_reason, StopReason::EndOfTurn);
        assert!(normalized.completion_message.tool_calls.is_empty());
    }

    #[test]
    fn chat_decodes_builtin_tool_call() {
        let body = response(json!({
            "choices": [{
                "index": 0,
                "text": "<|python_tag|>brave_search.call(query=\"weather in Paris\")<|eom_id|>",
                "finish_reason": "stop"
            }]
        }));

        let message = chat_response(&body).unwrap().completion_message;
        assert_eq!(message.stop_reason, StopReason::EndOfMessage);
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].tool_name, ToolName::Builtin(BuiltinTool::BraveSearch));
        assert_eq!(message.tool_calls[0].arguments["query"], json!("weather in Paris"));
    }

    #[tokio::test]
    async fn completion_stream_swallows_markers_and_ends_with_stop_reason() {
        let chunks = raw(vec![
            text_chunk("Hel", None),
            text_chunk("lo", None),
            text_chunk("<|eot_id|>", None),
            text_chunk("", Some("stop")),
            text_chunk("ignored", None),
        ]);

        let events: Vec<_> = completion_stream(chunks).try_collect().await.unwrap();

        let deltas: Vec<_> = events.iter().map(|e| e.delta.as_str()).collect();
        assert_eq!(deltas, ["Hel", "lo", "", ""]);
        assert_eq!(events.last().unwrap().stop_reason, Some(StopReason::EndOfTurn));
    }

    #[tokio::test]
    async fn completion_stream_maps_length_finish() {
        let chunks = raw(vec![text_chunk("a", None), text_chunk("b", Some("length"))]);

        let events: Vec<_> = completion_stream(chunks).try_collect().await.unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[1].delta, "b");
        assert_eq!(events[2].stop_reason, Some(StopReason::OutOfTokens));
    }

    #[tokio::test]
    async fn stream_error_terminates_with_err() {
        let chunks = raw(vec![
            text_chunk("a", None),
            Err(InferenceError::Streaming("connection reset".to_owned())),
            text_chunk("b", None),
        ]);

        let mut events = completion_stream(chunks);

        assert_eq!(events.next().await.unwrap().unwrap().delta, "a");
        assert!(matches!(events.next().await.unwrap(), Err(InferenceError::Streaming(_))));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn chat_stream_emits_start_progress_complete() {
        let chunks = raw(vec![
            Ok(response(json!({"choices": [{"delta": {"content": "A "}}]}))),
            Ok(response(json!({"choices": [{"delta": {"content": "dog."}, "finish_reason": "stop"}]}))),
        ]);

        let events: Vec<_> = chat_stream(chunks).try_collect().await.unwrap();

        let types: Vec<_> = events.iter().map(|e| e.event.event_type).collect();
        assert_eq!(
            types,
            [ChatEventType::Start, ChatEventType::Progress, ChatEventType::Progress, ChatEventType::Complete]
        );
        assert_eq!(events[2].event.delta, EventDelta::Text("dog.".to_owned()));
        assert_eq!(events[3].event.stop_reason, Some(StopReason::EndOfTurn));
    }

    #[tokio::test]
    async fn chat_stream_parses_tool_call_at_end() {
        let chunks = raw(vec![
            text_chunk("<|python_tag|>", None),
            text_chunk("brave_search.call(query=\"rust\")", None),
            text_chunk("<|eom_id|>", None),
            text_chunk("", Some("stop")),
        ]);

        let events: Vec<_> = chat_stream(chunks).try_collect().await.unwrap();
        let statuses: Vec<_> = events
            .iter()
            .filter_map(|e| match &e.event.delta {
                EventDelta::ToolCall(delta) => Some(delta.parse_status),
                EventDelta::Text(_) => None,
            })
            .collect();

        assert_eq!(
            statuses,
            [
                ToolCallParseStatus::Started,
                ToolCallParseStatus::InProgress,
                ToolCallParseStatus::InProgress,
                ToolCallParseStatus::Success,
            ]
        );

        let complete = events.last().unwrap();
        assert_eq!(complete.event.event_type, ChatEventType::Complete);
        assert_eq!(complete.event.stop_reason, Some(StopReason::EndOfMessage));
    }

    #[tokio::test]
    async fn chat_stream_tagged_code_becomes_code_interpreter_call() {
        let chunks = raw(vec![
            text_chunk("<|python_tag|>print(1 + ", None),
            text_chunk("1)", Some("length")),
        ]);

        let events: Vec<_> = chat_stream(chunks).try_collect().await.unwrap();

        let call = events
            .iter()
            .find_map(|e| match &e.event.delta {
                EventDelta::ToolCall(ToolCallDelta {
                    content: ToolCallContent::Call(call),
                    parse_status: ToolCallParseStatus::Success,
                }) => Some(call),
                _ => None,
            })
            .unwrap();

        assert_eq!(call.tool_name, ToolName::Builtin(BuiltinTool::CodeInterpreter));
        assert_eq!(call.arguments["code"], json!("print(1 + 1)"));
        assert_eq!(events.last().unwrap().event.stop_reason, Some(StopReason::OutOfTokens));
    }
}
