mod config;
mod error;
mod models;
mod resolver;
mod routes;
mod rpc;
mod state;
mod theater;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::resolver::{HttpResolver, MediaResolver};
use crate::rpc::{dispatch::Dispatcher, registry};
use crate::state::{StartedAt, TheaterMap};
use crate::theater::{Theater, TheaterHandle};
use error::AppErr;

const BODY_LIMIT: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<(), AppErr> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "configuration loaded");

    let resolver: Arc<dyn MediaResolver> =
        Arc::new(HttpResolver::new(&cfg.resolver_url, cfg.resolver_timeout)?);
    let dispatcher = Arc::new(Dispatcher::new(registry::v0()));   // 註冊 RPC v0
    let theaters = TheaterMap::default();

    for n in 1..=cfg.default_theaters {
        let id = theaters.fresh_id().await;
        let theater = Theater::new(id, format!("Theater {n}"), None, false, cfg.default_seats);
        theaters.insert(TheaterHandle::spawn(theater)).await;
    }
    info!(count = cfg.default_theaters, seats = cfg.default_seats, "default theaters open");

    let app = Router::new()
        .merge(routes::router())
        .layer(Extension(theaters))
        .layer(Extension(dispatcher))
        .layer(Extension(resolver))
        .layer(Extension(StartedAt(chrono::Utc::now())))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT));

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
}
