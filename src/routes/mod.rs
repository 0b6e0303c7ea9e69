pub mod products;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(products::routes())
}

/// Full application: API routes, service routes and middleware, optionally
/// nested under `base_path`.
pub fn build_app(state: AppState, base_path: Option<&str>) -> Router {
    let api = create_router()
        .route("/", get(|| async { "Product API" }))
        .route("/health", get(health_check));

    let app = match base_path {
        Some(path) => Router::new().nest(path, api),
        None => api,
    };

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
