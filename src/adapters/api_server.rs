use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::AppConfig;
use crate::coordination::CoordinationStore;
use crate::error::{BrokerError, Result};

/// Build the application state for a configuration
pub fn build_state(config: &AppConfig) -> AppState {
    AppState::new(Arc::new(CoordinationStore::new()), config.logs.dir.clone())
}

/// Start the API server and serve until `shutdown` resolves
pub async fn start_api_server<F>(config: &AppConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            BrokerError::validation(format!(
                "invalid bind address {}:{}: {}",
                config.server.host, config.server.port, e
            ))
        })?;
    let listener = TcpListener::bind(addr).await?;

    serve(listener, build_state(config), shutdown).await
}

/// Serve on an already bound listener
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(
        logs_dir = %state.logs().root().display(),
        "broker listening on http://{}", addr
    );

    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("broker stopped");
    Ok(())
}

/// Start the API server in the background on a bound listener
pub async fn start_api_server_background(
    listener: TcpListener,
    state: AppState,
) -> Result<tokio::task::JoinHandle<Result<()>>> {
    let handle =
        tokio::spawn(async move { serve(listener, state, std::future::pending()).await });

    Ok(handle)
}
