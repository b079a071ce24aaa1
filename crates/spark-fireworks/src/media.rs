//! Conversion of messages to the provider's structured message form
//!
//! Used when a chat request carries images. Each message becomes
//! `{"role": ..., "content": [{"type": "text", ...} | {"type": "image_url", ...}]}`.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};

use crate::error::InferenceError;
use crate::types::{ContentPart, ImageMedia, Message};

/// Image handling for structured calls
#[derive(Debug, Clone, Copy)]
pub struct MediaOptions {
    /// Fetch remote images and inline them as data URIs
    pub download_images: bool,
    /// Timeout for each image download
    pub timeout: Duration,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            download_images: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Convert a conversation to provider message dicts
///
/// # Errors
///
/// Returns `InferenceError::Upstream` if an image download fails
pub async fn convert_messages(messages: &[Message], options: &MediaOptions) -> Result<Vec<Value>, InferenceError> {
    let downloader = if options.download_images {
        Some(
            reqwest::Client::builder()
                .timeout(options.timeout)
                .build()
                .map_err(|e| InferenceError::Internal(anyhow::anyhow!("failed to build download client: {e}")))?,
        )
    } else {
        None
    };

    let mut converted = Vec::with_capacity(messages.len());
    for message in messages {
        converted.push(convert_message(message, downloader.as_ref()).await?);
    }

    Ok(converted)
}

async fn convert_message(message: &Message, downloader: Option<&reqwest::Client>) -> Result<Value, InferenceError> {
    let mut parts = message.content().parts();
    if let Message::User {
        context: Some(context), ..
    } = message
    {
        parts.extend(context.parts());
    }

    let mut content = Vec::with_capacity(parts.len());
    for part in &parts {
        content.push(match part {
            ContentPart::Text { text } => json!({"type": "text", "text": text}),
            ContentPart::Image { image } => {
                let url = image_url(image, downloader).await?;
                json!({"type": "image_url", "image_url": {"url": url}})
            }
        });
    }

    let mut converted = json!({"role": message.role(), "content": content});
    if let Message::Tool { call_id, .. } = message {
        converted["tool_call_id"] = json!(call_id);
    }

    Ok(converted)
}

async fn image_url(image: &ImageMedia, downloader: Option<&reqwest::Client>) -> Result<String, InferenceError> {
    match (image, downloader) {
        (ImageMedia::Url(url), _) if url.starts_with("data:") => Ok(url.clone()),
        (ImageMedia::Url(url), None) => Ok(url.clone()),
        (ImageMedia::Url(url), Some(client)) => download(client, url).await,
        (ImageMedia::Data { bytes, format }, _) => {
            let format = format.as_deref().unwrap_or_else(|| sniff_format(bytes));
            Ok(data_uri(format, bytes))
        }
    }
}

async fn download(client: &reqwest::Client, url: &str) -> Result<String, InferenceError> {
    let response = client.get(url).send().await.map_err(|e| {
        tracing::error!(url = %url, error = %e, "image download failed");
        InferenceError::Upstream(format!("failed to download image {url}: {e}"))
    })?;

    if !response.status().is_success() {
        let status = response.status();
        tracing::warn!(url = %url, status = %status, "image download returned error");
        return Err(InferenceError::Upstream(format!("image download {url} returned {status}")));
    }

    let content_type_format = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|mime| mime.split(';').next())
        .and_then(|mime| mime.rsplit('/').next())
        .map(str::trim)
        .filter(|format| !format.is_empty())
        .map(ToOwned::to_owned);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| InferenceError::Upstream(format!("failed to read image {url}: {e}")))?;

    let format = content_type_format.unwrap_or_else(|| sniff_format(&bytes).to_owned());
    Ok(data_uri(&format, &bytes))
}

/// Guess the image format from magic bytes, defaulting to png
fn sniff_format(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpeg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else {
        "png"
    }
}

fn data_uri(format: &str, bytes: &[u8]) -> String {
    format!("data:image/{format};base64,{}", STANDARD.encode(bytes))
}
