mod config;
mod errors;
mod evaluation;
mod llm_client;
mod retrieval;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::evaluation::evaluator::InstructorEvaluator;
use crate::evaluation::rubric::RubricTemplate;
use crate::llm_client::LlmClient;
use crate::retrieval::QueryClient;
use crate::routes::build_router;
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

    info!("Starting Judge API v{}", env!("CARGO_PKG_VERSION"));

    // Load the rubric once; a broken template stops startup
    let rubric = RubricTemplate::load(config.rubric_template_path.as_deref().map(Path::new))
        .context("Failed to load rubric template")?;
    info!(
        "Rubric template v{} loaded from {}",
        rubric.version(),
        config
            .rubric_template_path
            .as_deref()
            .unwrap_or("embedded default")
    );

    let query_client = QueryClient::new(config.query_service_url.clone());
    info!("Query service: {}", query_client.query_url());

    let llm = LlmClient::new(&config.ollama_base_url).context("Failed to build LLM client")?;
    info!(
        "LLM client initialized (model: {}, endpoint: {})",
        llm_client::MODEL,
        llm.chat_url()
    );

    let state = AppState {
        query_client,
        evaluator: InstructorEvaluator::new(llm, Arc::new(rubric)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
