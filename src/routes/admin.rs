use crate::{AppState, handlers};
use axum::{Router, routing::any};

/// Admin Router Module
///
/// The `admin` role check runs in the resource's authorization gate, so an identity
/// without the role gets the same unauthorized flow as an anonymous caller.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        .route("/admin", any(handlers::admin))
}
