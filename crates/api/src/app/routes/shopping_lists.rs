use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};

use pricewatch_catalog::NewShoppingList;
use pricewatch_core::ShoppingListId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_shopping_list))
        .route("/:id", patch(update_items))
}

pub async fn create_shopping_list(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let new: NewShoppingList = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_user(new.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::not_found("user"),
        Err(e) => return errors::store_error_to_response(e),
    }

    match services.store.create_shopping_list(new).await {
        Ok(list) => (StatusCode::CREATED, Json(list)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Replace the items of a list (`{"items": [...]}`).
pub async fn update_items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let id: ShoppingListId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let req: dto::UpdateShoppingListRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.update_shopping_list_items(id, req.items).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
