use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::patch,
};

use pricewatch_core::PriceId;

use crate::app::pricing::{self, MutationError};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/:id", patch(update_price))
}

/// `PATCH /api/prices/:id` with `{"price": <int>}`. The only route that broadcasts.
pub async fn update_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let id: PriceId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match dto::parse_json(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match pricing::apply_price_change(services.store.as_ref(), &services.hub, id, &body).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(MutationError::Validation(msg)) => {
            errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        Err(MutationError::NotFound(id)) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("price {id} not found"))
        }
        Err(MutationError::Store(e)) => errors::store_error_to_response(e),
    }
}
