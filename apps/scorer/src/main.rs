mod config;
mod errors;
mod extraction;
mod llm_client;
mod routes;
mod scoring;
mod state;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::scoring::LlmResumeScorer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Scorer v{}", env!("CARGO_PKG_VERSION"));

    if config.openrouter_api_key.is_none() {
        warn!("OPENROUTER_API_KEY is not set; scoring requests will fail until it is");
    }

    // Initialize LLM client
    let llm = LlmClient::from_config(&config)?;
    info!(
        "LLM client initialized (model: {}, endpoint: {})",
        llm.model(),
        config.llm_base_url
    );

    info!(
        "Limits: {} pages, {} resume chars, {} job description chars, {} upload bytes",
        config.max_pdf_pages, config.resume_max_chars, config.jd_max_chars, config.max_upload_bytes
    );

    let state = AppState {
        config: config.clone(),
        scorer: Arc::new(LlmResumeScorer::new(llm)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
