use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use taller_core::Folio;
use taller_infra::WorkshopStore;

use crate::app::{dto, errors, AppServices};

pub fn router<S: WorkshopStore>() -> Router {
    Router::new()
        .route("/", get(list_repairs::<S>).post(create_repair::<S>))
        .route(
            "/:folio",
            get(get_repair::<S>)
                .put(update_repair::<S>)
                .delete(delete_repair::<S>),
        )
        .route(
            "/:folio/items",
            get(list_line_items::<S>).post(create_line_item::<S>),
        )
}

fn parse_folio(raw: &str) -> Result<Folio, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

pub async fn list_repairs<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Query(query): Query<dto::ListRepairsQuery>,
) -> axum::response::Response {
    let result = match query.plate.as_deref() {
        Some(plate) => services.repairs.list_by_plate(plate).await,
        None => services.repairs.list().await,
    };
    match result {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_repair<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(folio): Path<String>,
) -> axum::response::Response {
    let folio = match parse_folio(&folio) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.repairs.get(folio).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_repair<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Json(body): Json<dto::CreateRepairRequest>,
) -> axum::response::Response {
    match services.repairs.create(body.into()).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_repair<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(folio): Path<String>,
    Json(body): Json<dto::UpdateRepairRequest>,
) -> axum::response::Response {
    let folio = match parse_folio(&folio) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.repairs.update(folio, body.into()).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_repair<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(folio): Path<String>,
) -> axum::response::Response {
    let folio = match parse_folio(&folio) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.repairs.delete(folio).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_line_items<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(folio): Path<String>,
) -> axum::response::Response {
    let folio = match parse_folio(&folio) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.repairs.list_line_items(folio).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_line_item<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(folio): Path<String>,
    Json(body): Json<dto::CreateLineItemRequest>,
) -> axum::response::Response {
    let folio = match parse_folio(&folio) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .repairs
        .create_line_item(body.into_new_line_item(folio))
        .await
    {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
