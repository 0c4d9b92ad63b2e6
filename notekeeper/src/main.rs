mod config;

mod app;
mod db;
mod errors;
mod extract;
mod metrics;
mod notes;
mod state;
mod telemetry;

use std::{net::SocketAddr, sync::Arc};

use app::AppParams;
use config::Config;
pub use db::{init_db, DB};
pub use errors::{Error, Result};
use metrics::Metrics;
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    telemetry::setup_tracing();

    let config = Config::from_env().inspect_err(|e| tracing::error!("invalid configuration: {e}"))?;

    let conn = init_db(&config.database_url)
        .await
        .inspect_err(|e| tracing::error!("failed to open store at {}: {e}", config.database_url))?;

    let app = app::create(AppParams {
        db: conn,
        metrics: Arc::new(Metrics::new()),
        router: notes::router,
    });

    let app = telemetry::add_tracing_layer(app);

    let port = config.port;
    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
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

    tracing::info!("shutting down");
}
