//! Fireworks HTTP client
//!
//! A client is built for each call so the credential can differ between
//! requests; no connections are shared across calls.

use std::pin::Pin;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt, TryStreamExt, future, stream};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::builder::{CallShape, ProviderCall};
use crate::error::InferenceError;
use crate::protocol::FireworksResponse;

/// SSE payload that terminates a stream
const DONE_MARKER: &str = "[DONE]";

/// Raw chunks in arrival order
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<FireworksResponse, InferenceError>> + Send>>;

/// Single-call Fireworks client
#[derive(Clone)]
pub struct FireworksClient {
    http: Client,
    base_url: Url,
    api_key: SecretString,
    timeout: Duration,
}

impl FireworksClient {
    /// Create a client for one call
    ///
    /// `timeout` bounds connection setup and each non-streaming request.
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::Internal` if the HTTP client cannot be built
    pub fn new(base_url: Url, api_key: SecretString, timeout: Duration) -> Result<Self, InferenceError> {
        let http = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key,
            timeout,
        })
    }

    /// Endpoint serving a call shape
    pub fn endpoint(&self, shape: CallShape) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        match shape {
            CallShape::Prompt => format!("{base}/completions"),
            CallShape::Messages => format!("{base}/chat/completions"),
        }
    }

    async fn send(&self, call: &ProviderCall, timeout: Option<Duration>) -> Result<reqwest::Response, InferenceError> {
        let url = self.endpoint(call.shape);
        tracing::debug!(url = %url, shape = %call.shape, "sending fireworks request");

        let mut builder = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&call.params);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "fireworks request failed");
            InferenceError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = %status, "fireworks returned error");
            return Err(InferenceError::Upstream(format!("fireworks returned {status}: {body}")));
        }

        Ok(response)
    }

    /// Send a non-streaming call and decode the response body
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::Upstream` on transport failure, a non-2xx
    /// status or an undecodable body
    pub async fn create(&self, call: &ProviderCall) -> Result<FireworksResponse, InferenceError> {
        let response = self.send(call, Some(self.timeout)).await?;

        response
            .json()
            .await
            .map_err(|e| InferenceError::Upstream(format!("failed to parse response: {e}")))
    }

    /// Send a streaming call and return its chunks once the status is known
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::Upstream` on transport failure or a non-2xx status
    pub async fn open_stream(&self, call: &ProviderCall) -> Result<ChunkStream, InferenceError> {
        let response = self.send(call, None).await?;

        let chunks = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| future::ready(!matches!(event, Ok(e) if e.data.trim() == DONE_MARKER)))
            .filter(|event| future::ready(!matches!(event, Ok(e) if e.data.trim().is_empty())))
            .map(|event| match event {
                Ok(event) => serde_json::from_str::<FireworksResponse>(event.data.trim()).map_err(|e| {
                    tracing::warn!(error = %e, data = %event.data, "unparseable SSE chunk");
                    InferenceError::Streaming(format!("unparseable stream chunk: {e}"))
                }),
                Err(e) => Err(InferenceError::Streaming(e.to_string())),
            });

        Ok(Box::pin(chunks))
    }

    /// Streaming call that is only sent when the stream is first polled
    pub fn lazy_stream(self, call: ProviderCall) -> ChunkStream {
        let opened = stream::once(async move { self.open_stream(&call).await });
        Box::pin(opened.try_flatten())
    }
}
