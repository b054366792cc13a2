use axum::Router;
use config::Config;
use envconfig::Envconfig;
use eyre::Result;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use link_common::PgLinkStore;

mod config;
mod handlers;
mod http_metrics;

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

async fn listen(app: Router, bind: String) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("listening on {:?}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();

    let config = Config::init_from_env().expect("failed to load configuration from env");

    let store = PgLinkStore::new(&config.database_url, config.max_pg_connections)
        .await
        .expect("failed to connect to postgres");

    if config.migrate_on_start {
        sqlx::migrate!("../migrations")
            .run(store.pool())
            .await
            .expect("failed to run migrations");
    }

    let app = handlers::add_routes(
        Router::new(),
        store,
        config.max_body_size,
        config.concurrency_limit,
    );
    let app = if config.enable_metrics {
        http_metrics::setup_metrics_routes(app).expect("failed to install metrics recorder")
    } else {
        app
    };
    let app = app.layer(TraceLayer::new_for_http());

    match listen(app, config.bind()).await {
        Ok(_) => {}
        Err(e) => tracing::error!("failed to start link-api http server, {}", e),
    }
}
