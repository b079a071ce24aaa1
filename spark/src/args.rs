use std::path::PathBuf;

use clap::{Parser, Subcommand};
use spark_fireworks::types::SamplingParams;

/// Spark, Llama inference on Fireworks
#[derive(Debug, Parser)]
#[command(name = "spark", about = "Run completions and chats against Fireworks-hosted Llama models")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SPARK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fireworks API key, sent as caller provider data
    ///
    /// A key in the configuration file takes precedence.
    #[arg(long, env = "FIREWORKS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Complete a raw prompt
    Complete {
        /// Model alias or Fireworks resource id
        model: String,
        prompt: String,
        #[command(flatten)]
        generation: GenerationArgs,
    },
    /// Send one chat message
    Chat {
        /// Model alias or Fireworks resource id
        model: String,
        message: String,
        /// System prompt
        #[arg(long)]
        system: Option<String>,
        /// Image URL attached to the message; may be repeated
        #[arg(long = "image", value_name = "URL")]
        images: Vec<String>,
        #[command(flatten)]
        generation: GenerationArgs,
    },
}

#[derive(Debug, clap::Args)]
pub struct GenerationArgs {
    /// Print output as it is generated
    #[arg(long)]
    pub stream: bool,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub temperature: Option<f64>,
}

impl GenerationArgs {
    pub fn sampling_params(&self) -> SamplingParams {
        SamplingParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            ..SamplingParams::default()
        }
    }
}
