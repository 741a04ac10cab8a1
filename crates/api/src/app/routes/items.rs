use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::delete,
    Router,
};

use taller_core::LineItemId;
use taller_infra::WorkshopStore;

use crate::app::{errors, AppServices};

pub fn router<S: WorkshopStore>() -> Router {
    Router::new().route("/:id", delete(delete_line_item::<S>))
}

pub async fn delete_line_item<S: WorkshopStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: LineItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.repairs.delete_line_item(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
