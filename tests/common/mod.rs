use axum::Router;

pub async fn create_test_app() -> Router {
    std::env::set_var("DATABASE_URL", "");
    std::env::set_var("WORKER_LEADER", "false");
    std::env::set_var("CONTENT_PROVIDER_MOCK", "true");
    std::env::set_var("NOTIFY_CHANNEL", "mock");

    alfanumrik_backend::create_app().await
}
