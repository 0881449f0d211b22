mod config;
mod feed;
mod gateway;
mod sse_handler;

use axum::{routing::get, Router};
use data_adapter::{DataProvider, HelloWorldAdapter};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::feed::FeedHub;
use crate::gateway::GatewayState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load()?;

    tracing::info!(
        instance_id = %config.server.instance_id,
        port = config.server.port,
        config_dir = ?config.adapter.config_dir,
        "Greetings gateway starting"
    );

    let adapter = Arc::new(HelloWorldAdapter::new());
    adapter
        .init(&config.adapter.params, config.adapter.config_dir.as_deref())
        .await?;
    tracing::info!(adapter = adapter.name(), "Data adapter loaded");

    let hub = FeedHub::attach(adapter.clone()).await;
    let cancel = CancellationToken::new();
    let state = GatewayState::new(&config, hub, cancel.clone());

    let cancel_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_signal.cancel();
    });

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/sse/items/{item}", get(sse_handler::sse_item))
        .route("/api/items", get(sse_handler::list_items))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let cancel_serve = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel_serve.cancelled().await })
        .await?;

    adapter.shutdown().await;
    tracing::info!("Greetings gateway stopped");

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "greetings_gateway=info,data_adapter=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
