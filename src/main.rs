//! HITL agent server
//!
//! Serves the tool catalog, decision endpoints and the resolution stream.

use hitl_agent::api::{create_router, AppState};
use hitl_agent::config::AgentConfig;
use hitl_agent::tools::{ExecutionRegistry, ToolCatalog};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hitl_agent=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AgentConfig::from_env()?;
    tracing::info!(
        max_concurrent = config.max_concurrent_executions,
        keepalive_secs = config.sse_keepalive.as_secs(),
        "Configuration loaded"
    );

    let catalog = ToolCatalog::standard();
    let registry = ExecutionRegistry::standard();
    tracing::info!(executors = ?registry.names(), "Execution registry initialized");

    let port = config.port;
    let state = AppState::new(catalog, registry, config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HITL agent server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
