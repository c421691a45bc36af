mod config;
mod errors;
mod extraction;
mod generation;
mod llm_client;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::scraper::{ContentRules, JobPostingScraper};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    let scraper = JobPostingScraper::new(
        config.scrape_timeout,
        &config.scrape_user_agent,
        ContentRules::default(),
    )?;
    info!(
        "Job posting scraper initialized (timeout: {}s)",
        config.scrape_timeout.as_secs()
    );

    info!(
        "Sessions expire after {}s idle",
        config.session_idle_ttl.as_secs()
    );

    let llm = LlmClient::new(&config.generation_api_url)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let state = AppState {
        config: config.clone(),
        sessions: SessionStore::with_idle_ttl(config.session_idle_ttl),
        scraper,
        generator: Arc::new(llm),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
