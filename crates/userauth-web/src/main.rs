mod api;
mod auth;
mod config;
mod dto;
mod error;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use userauth_core::{AuthPipeline, Clock, MemoryAccountStore, SystemClock};

use crate::config::ServerConfig;
use crate::state::AppState;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "userauth_web=debug,userauth_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    let cors = cors_layer(&config)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(MemoryAccountStore::new());
    let pipeline = Arc::new(AuthPipeline::new(&config.auth, store, clock)?);
    tracing::info!(
        routes = config.auth.rate_limit.routes.len(),
        token_ttl_hours = config.auth.token_ttl_hours,
        "auth pipeline ready"
    );

    // Rate-limit window cleanup task
    let cleanup = pipeline.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = cleanup.limiter().purge_idle();
            if purged > 0 {
                tracing::debug!(purged, "dropped idle rate limit windows");
            }
        }
    });

    let state = AppState { pipeline };
    let app = api::app(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("userauth-web listening on http://{}", bind_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Same-origin only unless `cors_origin` names an allowed caller.
fn cors_layer(config: &ServerConfig) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(match &config.cors_origin {
        Some(origin) => cors.allow_origin(origin.parse::<HeaderValue>()?),
        None => cors,
    })
}
