use std::str::FromStr;

use axum::body::Bytes;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use pricewatch_catalog::ShoppingListItem;
use pricewatch_core::DomainError;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShoppingListRequest {
    pub items: Vec<ShoppingListItem>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub analysis: String,
}

// -------------------------
// Helpers
// -------------------------

/// Parse a path segment into a typed id, or a `400 invalid_id` response.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(errors::domain_error_to_response)
}

/// Deserialize a JSON body, mapping every failure (syntax, shape) to `400 validation_error`.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, axum::response::Response> {
    serde_json::from_slice(body).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
    })
}

pub fn parse_json(body: &Bytes) -> Result<JsonValue, axum::response::Response> {
    parse_body::<JsonValue>(body)
}
