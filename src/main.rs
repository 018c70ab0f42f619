use std::sync::Arc;

use anyhow::Error;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use sentiment_serve::classifier::load_pipeline;
use sentiment_serve::{create_router, AppState, ModelInfo, ModelState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sentiment_serve=info,tower_http=info")),
        )
        .init();

    let cfg = ServiceConfig::from_env()?;
    tracing::info!(?cfg, "starting sentiment service");

    tracing::info!("Loading sentiment analysis model...");
    let load_cfg = cfg.clone();
    let model = match tokio::task::spawn_blocking(move || load_pipeline(&load_cfg)).await? {
        Ok(pipeline) => ModelState::available(Arc::new(pipeline), cfg.max_concurrent_inferences),
        Err(err) => {
            tracing::error!(error = %err, "Failed to load model");
            ModelState::unavailable(err.to_string())
        }
    };

    let state = Arc::new(AppState::new(model, ModelInfo::for_model(&cfg.model_id)));
    let app = create_router(state, cfg.max_body_bytes);

    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received");
}
