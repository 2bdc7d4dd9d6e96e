mod error;
mod relay;

use tracing_subscriber::EnvFilter;

use crate::relay::{build_relay_app, RelayState, ALLOWED_PATH_PREFIX};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = loterias_core::load_relay_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        bind_addr = %config.bind_addr,
        upstream = %config.upstream_base_url,
        prefix = ALLOWED_PATH_PREFIX,
        key_required = config.proxy_key.is_some(),
        timeout_ms = config.request_timeout_ms,
        "starting edge relay"
    );

    let app = build_relay_app(RelayState::from_config(&config)?);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
