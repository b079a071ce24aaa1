use std::fmt;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Header carrying caller-supplied provider data as a JSON object
///
/// e.g. `X-Provider-Data: {"fireworks_api_key": "fw_..."}`
pub const PROVIDER_DATA_HEADER: &str = "x-provider-data";

tokio::task_local! {
    static CURRENT: RequestContext;
}

/// Errors raised while reading the request context
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The provider data header is not a JSON object
    #[error("invalid {PROVIDER_DATA_HEADER} header: {0}")]
    InvalidProviderData(String),
}

/// Runtime context for a single inference request
///
/// Installed for the duration of a call with [`RequestContext::scope`] and
/// read back by adapters through [`RequestContext::current_provider_data`].
#[derive(Clone)]
pub struct RequestContext {
    /// HTTP request parts (method, URI, headers, extensions)
    pub parts: http::request::Parts,
    provider_data: Option<Map<String, Value>>,
}

impl RequestContext {
    /// Create a minimal context for embedded (non-HTTP) use
    ///
    /// Contains empty headers and no provider data
    pub fn empty() -> Self {
        let (parts, ()) = http::Request::builder()
            .method(http::Method::POST)
            .uri("/")
            .body(())
            .expect("valid minimal request")
            .into_parts();

        Self {
            parts,
            provider_data: None,
        }
    }

    /// Build a context from incoming request parts
    ///
    /// # Errors
    ///
    /// Returns `ContextError::InvalidProviderData` if the provider data header
    /// is present but is not valid UTF-8 or not a JSON object
    pub fn from_parts(parts: http::request::Parts) -> Result<Self, ContextError> {
        let provider_data = match parts.headers.get(PROVIDER_DATA_HEADER) {
            Some(raw) => {
                let raw = raw
                    .to_str()
                    .map_err(|e| ContextError::InvalidProviderData(e.to_string()))?;
                Some(parse_provider_data(raw)?)
            }
            None => None,
        };

        Ok(Self { parts, provider_data })
    }

    /// Attach provider data directly, bypassing header parsing
    #[must_use]
    pub fn with_provider_data(mut self, data: Map<String, Value>) -> Self {
        self.provider_data = Some(data);
        self
    }

    /// Decode the provider data into an adapter-specific record
    ///
    /// Returns `Ok(None)` when the caller sent no provider data.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::InvalidProviderData` if the data does not match `T`
    pub fn provider_data<T: DeserializeOwned>(&self) -> Result<Option<T>, ContextError> {
        self.provider_data
            .as_ref()
            .map(|data| {
                serde_json::from_value(Value::Object(data.clone()))
                    .map_err(|e| ContextError::InvalidProviderData(e.to_string()))
            })
            .transpose()
    }

    /// Run `future` with this context installed as the ambient request context
    pub async fn scope<F: Future>(self, future: F) -> F::Output {
        CURRENT.scope(self, future).await
    }

    /// Decode provider data from the ambient request context, if one is installed
    ///
    /// # Errors
    ///
    /// Returns `ContextError::InvalidProviderData` if the data does not match `T`
    pub fn current_provider_data<T: DeserializeOwned>() -> Result<Option<T>, ContextError> {
        CURRENT
            .try_with(Self::provider_data::<T>)
            .unwrap_or(Ok(None))
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Provider data carries credentials, only the keys are printed
        let keys = self
            .provider_data
            .as_ref()
            .map(|data| data.keys().cloned().collect::<Vec<_>>());

        f.debug_struct("RequestContext")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("provider_data_keys", &keys)
            .finish_non_exhaustive()
    }
}

fn parse_provider_data(raw: &str) -> Result<Map<String, Value>, ContextError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ContextError::InvalidProviderData(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(ContextError::InvalidProviderData(e.to_string())),
    }
}
