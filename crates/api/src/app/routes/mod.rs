use axum::{routing::post, Router};

pub mod products;
pub mod system;

/// Router for the CRUD endpoint.
///
/// `/api.php` is kept as an alias so existing form posts keep working unchanged.
pub fn router() -> Router {
    Router::new()
        .route("/products", post(products::handle_action))
        .route("/api.php", post(products::handle_action))
}
