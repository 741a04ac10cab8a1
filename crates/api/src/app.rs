use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};

use taller_infra::{PartService, RepairService, WorkshopStore};

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared application services, injected into handlers as an extension.
pub struct AppServices<S> {
    pub parts: PartService<S>,
    pub repairs: RepairService<S>,
}

/// Build the application router over any workshop store.
pub fn build_app<S: WorkshopStore>(store: Arc<S>) -> Router {
    let services = Arc::new(AppServices {
        parts: PartService::new(store.clone()),
        repairs: RepairService::new(store),
    });

    Router::new()
        .route("/health", get(health))
        .nest("/parts", routes::parts::router::<S>())
        .nest("/repairs", routes::repairs::router::<S>())
        .nest("/items", routes::items::router::<S>())
        .layer(Extension(services))
}

async fn health() -> axum::response::Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}
