use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
};

use pricewatch_core::StoreId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_stores))
        .route("/:id", get(get_store))
}

pub async fn list_stores(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.store.list_stores().await {
        Ok(stores) => Json(stores).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_store(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: StoreId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_store(id).await {
        Ok(Some(store)) => Json(store).into_response(),
        Ok(None) => errors::not_found("store"),
        Err(e) => errors::store_error_to_response(e),
    }
}
