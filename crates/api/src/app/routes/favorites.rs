use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
};

use pricewatch_catalog::NewFavorite;
use pricewatch_core::FavoriteId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_favorite))
        .route("/:id", delete(delete_favorite))
}

pub async fn create_favorite(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let new: NewFavorite = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.create_favorite(new).await {
        Ok(favorite) => (StatusCode::CREATED, Json(favorite)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Always `204`, also for ids that do not exist.
pub async fn delete_favorite(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: FavoriteId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.delete_favorite(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
