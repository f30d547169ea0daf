pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod workers;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::content_provider::ContentProvider;
use crate::services::notifier::NotificationChannel;
use crate::state::AppState;

pub async fn create_app() -> axum::Router {
    let db_proxy = match db::DatabaseProxy::from_env().await {
        Ok(proxy) => Some(proxy),
        Err(_) => None,
    };

    let state = AppState::new(
        db_proxy,
        Arc::new(ContentProvider::from_env()),
        Arc::new(NotificationChannel::from_env()),
    );

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
