use crate::{AppState, handlers};
use axum::{Router, routing::any};

/// Authenticated Router Module
///
/// Resources for signed-in users. They are mounted with `any` because the resource
/// answers disallowed methods itself (405 with an `Allow` header and a negotiated body).
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /authenticated
        // Any authenticated identity, regardless of role.
        .route("/authenticated", any(handlers::authenticated))
        // GET /user
        // Requires the `user` role.
        .route("/user", any(handlers::user))
}
