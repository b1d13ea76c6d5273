//! AI-backed endpoints. Upstream failures never fail the request.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    response::IntoResponse,
};

use pricewatch_ai::{Recommendation, RecommendationContext};
use pricewatch_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// `GET /api/users/:id/recommendations`: up to five ranked suggestions, `[]` when the
/// model is unavailable or answers with something unusable.
pub async fn recommend(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let user = match services.store.get_user(id).await {
        Ok(Some(u)) => u,
        Ok(None) => return errors::not_found("user"),
        Err(e) => return errors::store_error_to_response(e),
    };
    let history = match services.store.shopping_lists_for_user(id).await {
        Ok(v) => v,
        Err(e) => return errors::store_error_to_response(e),
    };
    let catalog = match services.store.list_products(None).await {
        Ok(v) => v,
        Err(e) => return errors::store_error_to_response(e),
    };

    let recs: Vec<Recommendation> =
        match RecommendationContext::new(user.preferences, &history, &catalog) {
            Ok(ctx) => services.gateway.recommend(&ctx).await,
            Err(e) => {
                tracing::warn!(user_id = %id, error = %e, "could not build recommendation context");
                Vec::new()
            }
        };

    Json(recs).into_response()
}

/// `GET /api/users/:id/trends`: free-text analysis of the user's shopping lists.
pub async fn trends(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_user(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::not_found("user"),
        Err(e) => return errors::store_error_to_response(e),
    }
    let history = match services.store.shopping_lists_for_user(id).await {
        Ok(v) => v,
        Err(e) => return errors::store_error_to_response(e),
    };

    let history = serde_json::to_value(&history).unwrap_or_default();
    let analysis = services.gateway.analyze_trends(&history).await;
    Json(dto::TrendsResponse { analysis }).into_response()
}
