use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints open to every client, signed in or not.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // The landing page. A literal string, no resource behind it.
        .route("/", get(handlers::welcome))
        // POST /login
        // Exchanges a username and password for a bearer token.
        .route("/login", post(handlers::login))
}
