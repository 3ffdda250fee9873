mod clock;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod normalize;
mod platform;
mod rate_limit;
mod state;
mod upstream;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::clock::SystemClock;
use crate::config::Args;
use crate::handlers::{download_handler, health_handler, metrics_handler};
use crate::rate_limit::{rate_limit_middleware, window_sweeper};
use crate::state::AppState;

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // a missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidsnap_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // log faults instead of dying silently; tokio keeps the other connections alive
    std::panic::set_hook(Box::new(|panic| {
        error!(panic = %panic, "unexpected fault");
    }));

    // parse cli arguments
    let args = Args::parse();
    if args.api_key.is_empty() {
        warn!("API_KEY is not set, upstream calls carry an empty credential");
    }

    let state = Arc::new(AppState::from_args(&args, Arc::new(SystemClock))?);

    // spawn the background sweeper
    tokio::spawn(window_sweeper(state.rate_limiter.clone(), args.sweep_every()));

    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        upstream = %args.upstream_url,
        "VidSnap gateway started"
    );
    info!(
        "Rate limit: {} requests per {} ms, upstream timeout {} ms",
        args.rate_limit, args.rate_window_ms, args.upstream_timeout_ms
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server closed");
    Ok(())
}

// creating the router with routes; the limiter sees every request
fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/download", post(download_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
