use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use taller_core::PartId;
use taller_infra::WorkshopStore;

use crate::app::{dto, errors, AppServices};

pub fn router<S: WorkshopStore>() -> Router {
    Router::new()
        .route("/", get(list_parts::<S>).post(create_part::<S>))
        .route(
            "/:id",
            get(get_part::<S>)
                .put(update_part::<S>)
                .delete(delete_part::<S>),
        )
        .route("/:id/stock", patch(adjust_stock::<S>))
}

fn parse_part_id(raw: &str) -> Result<PartId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

pub async fn list_parts<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
) -> axum::response::Response {
    match services.parts.list().await {
        Ok(parts) => Json(parts).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_part<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_part_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.parts.get(id).await {
        Ok(part) => Json(part).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_part<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Json(body): Json<dto::CreatePartRequest>,
) -> axum::response::Response {
    match services.parts.create(body.into()).await {
        Ok(part) => (StatusCode::CREATED, Json(part)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_part<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdatePartRequest>,
) -> axum::response::Response {
    let id = match parse_part_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.parts.update(id, body.into()).await {
        Ok(part) => Json(part).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn adjust_stock<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let id = match parse_part_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.parts.adjust_stock(id, body.delta).await {
        Ok(part) => Json(part).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_part<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_part_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.parts.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
