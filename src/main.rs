use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use alfanumrik_backend::config::Config;
use alfanumrik_backend::db;
use alfanumrik_backend::logging;
use alfanumrik_backend::routes;
use alfanumrik_backend::services::content_provider::ContentProvider;
use alfanumrik_backend::services::notifier::NotificationChannel;
use alfanumrik_backend::state::AppState;
use alfanumrik_backend::workers::WorkerManager;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = logging::init_tracing(&config);

    let db_proxy = match db::DatabaseProxy::from_env().await {
        Ok(proxy) => Some(proxy),
        Err(err) => {
            tracing::warn!(error = %err, "database proxy not initialized");
            None
        }
    };

    let content_provider = Arc::new(ContentProvider::from_env());
    let notifier = Arc::new(NotificationChannel::from_env());

    let worker_manager = if let Some(ref proxy) = db_proxy {
        match WorkerManager::new(
            Arc::clone(proxy),
            Arc::clone(&content_provider),
            Arc::clone(&notifier),
        )
        .await
        {
            Ok(manager) => {
                if let Err(e) = manager.start().await {
                    tracing::error!(error = %e, "failed to start workers");
                }
                Some(manager)
            }
            Err(e) => {
                tracing::warn!(error = %e, "worker manager not initialized");
                None
            }
        }
    } else {
        None
    };

    let state = AppState::new(db_proxy, content_provider, notifier);

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    tracing::info!(%addr, "alfanumrik-backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, initiating graceful shutdown sequence");

    if let Some(ref manager) = worker_manager {
        manager.stop().await;
    }

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
