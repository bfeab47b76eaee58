use tracing::info;
use tracing_subscriber::EnvFilter;

use lifeloop_server::{api, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lifeloop_server=debug")),
        )
        .init();

    info!("Starting LifeLoop collection server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        data_path = %config.data_path.display(),
        auth_enabled = config.api_token.is_some(),
        max_batch_size = config.max_batch_size,
        "Loaded configuration"
    );
    if config.api_token.is_none() {
        tracing::warn!("API_TOKEN is not set, collection routes are open");
    }

    let http_addr = config.http_addr;
    let state = AppState::open(config).await?;

    tokio::select! {
        result = api::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
