#![allow(clippy::must_use_candidate)]

mod env;
pub mod fireworks;
mod loader;
pub mod telemetry;

use serde::Deserialize;

pub use env::ExpandError;
pub use fireworks::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level Spark configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Fireworks adapter configuration
    #[serde(default)]
    pub fireworks: FireworksConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
