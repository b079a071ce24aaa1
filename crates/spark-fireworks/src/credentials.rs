//! API key resolution

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use spark_core::RequestContext;

use crate::error::InferenceError;

const MISSING_KEY_MESSAGE: &str =
    r#"Pass Fireworks API Key in the header X-Provider-Data as { "fireworks_api_key": <your api key> }"#;

/// Caller-supplied provider data understood by this adapter
#[derive(Debug, Default, Deserialize)]
pub struct FireworksProviderData {
    #[serde(default)]
    pub fireworks_api_key: Option<SecretString>,
}

/// Pick the API key for one call
///
/// A configured key wins; otherwise the key comes from the provider data of
/// the ambient request context. A blank caller key counts as missing.
///
/// # Errors
///
/// Returns `InferenceError::MissingCredential` if neither source has a key, or
/// `InferenceError::InvalidRequest` if the provider data is malformed
pub fn resolve_api_key(configured: Option<&SecretString>) -> Result<SecretString, InferenceError> {
    if let Some(key) = configured {
        return Ok(key.clone());
    }

    RequestContext::current_provider_data::<FireworksProviderData>()?
        .and_then(|data| data.fireworks_api_key)
        .filter(|key| !key.expose_secret().trim().is_empty())
        .ok_or_else(|| InferenceError::MissingCredential {
            message: MISSING_KEY_MESSAGE.to_owned(),
        })
}
