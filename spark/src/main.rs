#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::io::Write;
use std::process::ExitCode;

use args::{Args, Command};
use clap::Parser;
use futures_util::StreamExt;
use serde_json::{Map, Value};
use spark_config::Config;
use spark_core::RequestContext;
use spark_fireworks::types::{
    ChatCompletionResponseStreamChunk, CompletionResponseStreamChunk, ContentPart, EventDelta, EventStream, Message,
    ToolCallContent,
};
use spark_fireworks::{
    ChatCompletionInput, CompletionInput, FireworksInferenceAdapter, Generation, Inference, InferenceError,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    spark_telemetry::init(config.telemetry.as_ref(), "warn")?;

    tracing::debug!(
        config_path = ?args.config,
        base_url = %config.fireworks.base_url,
        "starting spark"
    );

    let adapter = FireworksInferenceAdapter::new(config.fireworks);
    let context = request_context(args.api_key.as_deref());

    match context.scope(run(&adapter, args.command)).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e:#}");
            Ok(exit_code(&e))
        }
    }
}

/// Exit with 2 when the request itself was wrong, 1 for everything else
fn exit_code(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<InferenceError>() {
        Some(e) if e.is_caller_error() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

/// Caller context carrying the command-line key as provider data
fn request_context(api_key: Option<&str>) -> RequestContext {
    let context = RequestContext::empty();
    match api_key {
        Some(key) => {
            let mut data = Map::new();
            data.insert("fireworks_api_key".to_owned(), Value::String(key.to_owned()));
            context.with_provider_data(data)
        }
        None => context,
    }
}

async fn run(adapter: &FireworksInferenceAdapter, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Complete {
            model,
            prompt,
            generation,
        } => {
            let input = CompletionInput::new(prompt)
                .with_sampling_params(generation.sampling_params())
                .with_stream(generation.stream);

            match adapter.complete(&model, input).await? {
                Generation::Response(response) => {
                    println!("{}", response.content);
                    tracing::debug!(stop_reason = ?response.stop_reason, "completion finished");
                }
                Generation::Stream(stream) => print_until_interrupted(print_completion(stream)).await?,
            }
        }
        Command::Chat {
            model,
            message,
            system,
            images,
            generation,
        } => {
            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(Message::system(system));
            }
            messages.push(user_message(message, images));

            let input = ChatCompletionInput::new(messages)
                .with_sampling_params(generation.sampling_params())
                .with_stream(generation.stream);

            match adapter.chat_complete(&model, input).await? {
                Generation::Response(response) => {
                    let message = response.completion_message;
                    println!("{}", message.content.text());
                    for call in &message.tool_calls {
                        println!("{}", serde_json::to_string(call)?);
                    }
                }
                Generation::Stream(stream) => print_until_interrupted(print_chat(stream)).await?,
            }
        }
    }

    Ok(())
}

fn user_message(text: String, images: Vec<String>) -> Message {
    if images.is_empty() {
        return Message::user(text);
    }

    let mut parts = vec![ContentPart::text(text)];
    parts.extend(images.into_iter().map(ContentPart::image_url));
    Message::user(parts)
}

/// Drive `printing` until it finishes or Ctrl+C drops the stream
async fn print_until_interrupted(printing: impl Future<Output = anyhow::Result<()>>) -> anyhow::Result<()> {
    tokio::select! {
        result = printing => result,
        () = ctrl_c() => {
            tracing::info!("interrupted, abandoning stream");
            println!();
            Ok(())
        }
    }
}

async fn ctrl_c() {
    tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
}

async fn print_completion(mut stream: EventStream<CompletionResponseStreamChunk>) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        write!(stdout, "{}", chunk.delta)?;
        stdout.flush()?;
    }

    writeln!(stdout)?;
    Ok(())
}

async fn print_chat(mut stream: EventStream<ChatCompletionResponseStreamChunk>) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();

    while let Some(chunk) = stream.next().await {
        match chunk?.event.delta {
            EventDelta::Text(text) => write!(stdout, "{text}")?,
            EventDelta::ToolCall(delta) => match delta.content {
                ToolCallContent::Text(text) => write!(stdout, "{text}")?,
                ToolCallContent::Call(call) => writeln!(stdout, "\n{}", serde_json::to_string(&call)?)?,
            },
        }
        stdout.flush()?;
    }

    writeln!(stdout)?;
    Ok(())
}
