use emolearn_backend::adaptive::AdaptiveConfig;
use emolearn_backend::config::Config;
use emolearn_backend::logging::{init_tracing, LogSettings};
use emolearn_backend::{build_state, create_app};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = init_tracing(&LogSettings::from_env(&config.log_level));

    let engine_config = match AdaptiveConfig::load() {
        Ok(engine_config) => engine_config,
        Err(err) => {
            tracing::error!(error = %err, "invalid adaptive engine configuration");
            std::process::exit(1);
        }
    };

    let addr = config.bind_addr();
    let state = match build_state(config, engine_config) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize service state");
            std::process::exit(1);
        }
    };

    let app = create_app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind listener");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "emolearn backend listening");

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server error");
    }

    tracing::info!("graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
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
