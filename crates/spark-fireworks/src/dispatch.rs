//! Call dispatch
//!
//! Sends a built call the way its request kind and shape require. Prompt
//! streams are lazy: nothing is sent until the caller polls. Message streams
//! are opened up front so a rejected request fails the call itself.

use crate::builder::{CallShape, ProviderCall};
use crate::client::{ChunkStream, FireworksClient};
use crate::error::InferenceError;
use crate::protocol::FireworksResponse;

/// Operation a call was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RequestKind {
    Completion,
    ChatCompletion,
}

/// Raw provider output, before normalization
pub enum RawOutput {
    Response(FireworksResponse),
    Stream(ChunkStream),
}

/// Send `call` and return the raw response or chunk stream
///
/// # Errors
///
/// Returns `InferenceError::Upstream` when the provider rejects an awaited
/// call, and `InferenceError::Internal` for a completion built as messages
pub async fn dispatch(
    client: FireworksClient,
    call: ProviderCall,
    kind: RequestKind,
) -> Result<RawOutput, InferenceError> {
    if kind == RequestKind::Completion && call.shape == CallShape::Messages {
        return Err(InferenceError::Internal(anyhow::anyhow!(
            "completion requests are always sent as a prompt"
        )));
    }

    tracing::debug!(
        kind = %kind,
        shape = %call.shape,
        stream = call.stream(),
        endpoint = %client.endpoint(call.shape),
        "dispatching fireworks call"
    );

    if !call.stream() {
        return client.create(&call).await.map(RawOutput::Response);
    }

    match call.shape {
        CallShape::Prompt => Ok(RawOutput::Stream(client.lazy_stream(call))),
        CallShape::Messages => client.open_stream(&call).await.map(RawOutput::Stream),
    }
}
