use serde_json::{Map, Value, json};

use crate::error::InferenceError;
use crate::types::{ResponseFormat, SamplingParams};

/// Token cap applied when the caller sets none
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Map sampling parameters and an output format to provider options
///
/// Unset or zero sampling values are omitted; `repeat_penalty` is only sent
/// when it differs from the neutral 1.0.
///
/// # Errors
///
/// Returns `InferenceError::UnsupportedResponseFormat` for an unknown format tag
pub fn build_options(
    params: &SamplingParams,
    response_format: Option<&ResponseFormat>,
) -> Result<Map<String, Value>, InferenceError> {
    let mut options = Map::new();

    if let Some(temperature) = params.temperature.filter(|t| *t != 0.0) {
        options.insert("temperature".to_owned(), json!(temperature));
    }
    if let Some(top_p) = params.top_p.filter(|p| *p != 0.0) {
        options.insert("top_p".to_owned(), json!(top_p));
    }
    if let Some(top_k) = params.top_k.filter(|k| *k != 0) {
        options.insert("top_k".to_owned(), json!(top_k));
    }
    if let Some(max_tokens) = params.max_tokens.filter(|m| *m != 0) {
        options.insert("max_tokens".to_owned(), json!(max_tokens));
    }
    if (params.repetition_penalty - 1.0).abs() > f64::EPSILON {
        options.insert("repeat_penalty".to_owned(), json!(params.repetition_penalty));
    }

    options
        .entry("max_tokens")
        .or_insert_with(|| json!(DEFAULT_MAX_TOKENS));

    match response_format {
        None => {}
        Some(ResponseFormat::JsonSchema { json_schema }) => {
            options.insert(
                "response_format".to_owned(),
                json!({"type": "json_object", "schema": json_schema}),
            );
        }
        Some(ResponseFormat::Grammar { bnf }) => {
            options.insert("response_format".to_owned(), json!({"type": "grammar", "grammar": bnf}));
        }
        Some(ResponseFormat::Unsupported(tag)) => {
            return Err(InferenceError::UnsupportedResponseFormat { format: tag.clone() });
        }
    }

    Ok(options)
}
