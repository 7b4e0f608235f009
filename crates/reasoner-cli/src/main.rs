use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use tracing_subscriber::EnvFilter;

use reasoner::format::{FormatOptions, Pipeline};
use reasoner::providers::configs::{
    DeepSeekProviderConfig, DEEPSEEK_DEFAULT_HOST, DEEPSEEK_DEFAULT_MODEL,
};
use reasoner::providers::deepseek::DeepSeekProvider;
use reasoner::turn::{ErrorPolicy, TurnDriver};

mod prompt;
mod render;
mod session;

use prompt::rustyline::RustylinePrompt;
use session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// DeepSeek API key (can also be set via DEEPSEEK_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// API host (can also be set via DEEPSEEK_HOST environment variable)
    #[arg(long)]
    host: Option<String>,

    /// Model to use (can also be set via DEEPSEEK_MODEL environment variable)
    #[arg(short, long)]
    model: Option<String>,

    /// Start with the reasoning channel hidden
    #[arg(long)]
    hide_reasoning: bool,

    /// Leave `*` as typed instead of rendering it as `×`
    #[arg(long)]
    keep_asterisk: bool,

    /// Keep failed turns in the history as `Error: ...` answers
    #[arg(long)]
    record_errors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenv::dotenv();

    // Logs go to stderr so they do not interleave with the rendered stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let provider = DeepSeekProvider::new(provider_config(&cli)?)
        .context("Failed to create the completion client")?;

    let pipeline = Pipeline::new(&FormatOptions {
        substitute_asterisk: !cli.keep_asterisk,
        ..FormatOptions::default()
    });
    let policy = if cli.record_errors {
        ErrorPolicy::RecordAsAnswer
    } else {
        ErrorPolicy::Discard
    };
    let driver = TurnDriver::new(Box::new(provider), pipeline).with_error_policy(policy);

    let mut session = Session::new(driver, Box::new(RustylinePrompt::new()?));
    session.set_show_reasoning(!cli.hide_reasoning);
    session.start().await
}

fn provider_config(cli: &Cli) -> Result<DeepSeekProviderConfig> {
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| env::var("DEEPSEEK_API_KEY").ok())
        .context(
            "API key must be provided via --api-key or DEEPSEEK_API_KEY environment variable",
        )?;
    let host = cli
        .host
        .clone()
        .or_else(|| env::var("DEEPSEEK_HOST").ok())
        .unwrap_or_else(|| DEEPSEEK_DEFAULT_HOST.to_string());
    let model = cli
        .model
        .clone()
        .or_else(|| env::var("DEEPSEEK_MODEL").ok())
        .unwrap_or_else(|| DEEPSEEK_DEFAULT_MODEL.to_string());

    Ok(DeepSeekProviderConfig::new(api_key)
        .with_host(host)
        .with_model(model))
}
