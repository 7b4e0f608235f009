mod configuration;
mod error;
mod routes;
mod state;

use anyhow::Context;
use reasoner::format::Pipeline;
use reasoner::providers::deepseek::DeepSeekProvider;
use reasoner::turn::TurnDriver;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = configuration::Settings::new().context("failed to load settings")?;
    let addr = settings.server.socket_addr()?;

    let provider = DeepSeekProvider::new(settings.provider.into_config()?)?;
    info!(model = provider.model(), "using DeepSeek provider");

    let driver = TurnDriver::new(
        Box::new(provider),
        Pipeline::new(&settings.chat.format_options()),
    )
    .with_error_policy(settings.chat.error_policy());
    let state = state::AppState::new(driver, settings.chat.show_reasoning)
        .with_session_ttl(settings.chat.session_ttl());

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
