mod config;
mod errors;
mod llm_client;
mod recommendation;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::recommendation::contact_link::ContactLinkResolver;
use crate::recommendation::orchestrator::Recommender;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Outreach API v{}", env!("CARGO_PKG_VERSION"));

    // Provider table + adapters
    let providers = config.build_providers()?;
    let recommender = Recommender::new(
        providers,
        config.pipeline_config(),
        ContactLinkResolver::new(config.profile_hosts.clone()),
    );

    let order: Vec<&str> = recommender.providers().map(|s| s.name.as_str()).collect();
    if order.is_empty() {
        warn!("No providers enabled; every recommendation request will fail with 503");
    } else {
        info!("Provider fallback order: {}", order.join(" → "));
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        recommender: Arc::new(recommender),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
