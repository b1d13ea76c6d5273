use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use pricewatch_catalog::NewUser;
use pricewatch_core::UserId;

use crate::app::routes::recommendations;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user))
        .route("/:id", get(get_user))
        .route("/:id/shopping-lists", get(list_shopping_lists))
        .route("/:id/favorites", get(list_favorites))
        .route("/:id/recommendations", get(recommendations::recommend))
        .route("/:id/trends", get(recommendations::trends))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let new: NewUser = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.create_user(new).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_user(id).await {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => errors::not_found("user"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_shopping_lists(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.shopping_lists_for_user(id).await {
        Ok(lists) => Json(lists).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_favorites(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.favorites_for_user(id).await {
        Ok(favorites) => Json(favorites).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
