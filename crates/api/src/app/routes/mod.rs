use axum::Router;

pub mod favorites;
pub mod prices;
pub mod products;
pub mod realtime;
pub mod recommendations;
pub mod shopping_lists;
pub mod stores;
pub mod system;
pub mod users;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/prices", prices::router())
        .nest("/stores", stores::router())
        .nest("/users", users::router())
        .nest("/shopping-lists", shopping_lists::router())
        .nest("/favorites", favorites::router())
}
