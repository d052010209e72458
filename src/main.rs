use std::net::SocketAddr;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use location_logger::config::AppConfig;
use location_logger::models::error::StartupError;
use location_logger::state::AppState;
use location_logger::{rate_limit, router, store};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "location_logger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let store = store::open(&config.storage).await?;
    info!(
        "Using {:?} storage with {} stored locations",
        config.storage.backend,
        store.count().await?
    );
    if config.admin.jwt_secret.is_none() {
        info!("Admin views are open, set admin.jwt_secret to require a bearer token");
    }

    let state = AppState::new(&config, store)?;
    tokio::spawn(rate_limit::run_pruner(state.limiter.clone()));

    let app = router::build(state, &config.server.static_dir);

    let addr = config.bind_address()?;
    info!("listening on {}", addr);

    axum::Server::try_bind(&addr)
        .map_err(|e| StartupError::Server(e.to_string()))?
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install terminate handler: {}", e);
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
}
