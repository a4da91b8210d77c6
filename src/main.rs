//! USSD ticket gateway
//!
//! Serves the aggregator callback for the *123# ticket menu and keeps an
//! in-memory revenue ledger for the operations dashboard.

mod api;
mod clock;
mod config;
mod dispatcher;
mod ledger;
mod menu;
mod notify;
mod session;
mod stats;

use api::{create_router, AppState};
use clock::{Clock, SystemClock};
use config::Config;
use dispatcher::Dispatcher;
use menu::PriceTable;
use notify::{spawn_notifier, LogNotifier};
use session::spawn_sweeper;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
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
                .unwrap_or_else(|_| "ussd_gateway=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        session_ttl_secs = config.session_ttl.as_secs(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Notification delivery runs off the request path
    let (notify_tx, notify_rx) = mpsc::channel(config.notify_queue);
    spawn_notifier(notify_rx, LogNotifier);

    let dispatcher = Dispatcher::new(clock.clone(), PriceTable::standard(), notify_tx);
    spawn_sweeper(
        dispatcher.store().clone(),
        clock,
        config.sweep_interval,
        config.session_ttl,
    );

    let state = AppState::new(dispatcher);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("USSD gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
